//! Browser identity and feature-support probing over a runtime profile.
//!
//! The UA parse is a fixed ordered list with first-match-wins semantics;
//! Chromium Edge user agents therefore identify as Chrome, matching the
//! probe order the dashboard has always shown. Feature names dispatch
//! through a closed table; unrecognized names are unsupported.

use crate::models::snapshot::RuntimeProfile;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Features probed by default when no override list is configured.
pub const DEFAULT_FEATURES: &[&str] = &[
    "IntersectionObserver",
    "ResizeObserver",
    "MutationObserver",
    "PerformanceObserver",
    "WebP",
    "AVIF",
    "CSS Grid",
    "CSS Flexbox",
    "CSS Variables",
    "Service Worker",
];

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
/// Best-effort browser identity; both fields may be absent.
pub struct BrowserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
/// Browser identity plus the probed feature-support matrix.
pub struct BrowserCompatibility {
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub browser: BrowserInfo,
    pub features: BTreeMap<String, bool>,
}

static CHROME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Chrome/([0-9.]+)").unwrap());
static FIREFOX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Firefox/([0-9.]+)").unwrap());
static SAFARI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Safari/([0-9.]+)").unwrap());
static SAFARI_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version/([0-9.]+)").unwrap());
static EDGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Edg/([0-9.]+)").unwrap());
static IE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"rv:([0-9.]+)").unwrap());

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack).map(|c| c[1].to_string())
}

/// Derive browser name and version from a user-agent string.
///
/// Ordered matches: Chrome, Firefox, Safari (excluding Chrome UAs, version
/// from `Version/x`), Chromium Edge (`Edg/x`), Internet Explorer
/// (`Trident`, version from `rv:x`). First match wins.
pub fn browser_info(user_agent: &str) -> BrowserInfo {
    if let Some(version) = first_capture(&CHROME_RE, user_agent) {
        return BrowserInfo {
            name: Some("Chrome".to_string()),
            version: Some(version),
        };
    }
    if let Some(version) = first_capture(&FIREFOX_RE, user_agent) {
        return BrowserInfo {
            name: Some("Firefox".to_string()),
            version: Some(version),
        };
    }
    if SAFARI_RE.is_match(user_agent) && !user_agent.contains("Chrome") {
        return BrowserInfo {
            name: Some("Safari".to_string()),
            version: first_capture(&SAFARI_VERSION_RE, user_agent),
        };
    }
    if let Some(version) = first_capture(&EDGE_RE, user_agent) {
        return BrowserInfo {
            name: Some("Edge".to_string()),
            version: Some(version),
        };
    }
    if user_agent.contains("Trident") {
        return BrowserInfo {
            name: Some("Internet Explorer".to_string()),
            version: first_capture(&IE_VERSION_RE, user_agent),
        };
    }
    BrowserInfo::default()
}

/// Probe one feature name against the runtime. Unrecognized names are
/// reported unsupported rather than erroring.
pub fn is_feature_supported(runtime: &RuntimeProfile, feature: &str) -> bool {
    match feature {
        "IntersectionObserver" | "ResizeObserver" | "MutationObserver"
        | "PerformanceObserver" => runtime.has_global(feature),
        "WebP" => runtime.canvas_webp,
        // Approximation carried over from the capture side: decode support
        // plus native lazy loading stand in for a real AVIF decode test.
        "AVIF" => {
            runtime.image_decode
                && runtime.has_global("HTMLImageElement")
                && runtime.lazy_loading
        }
        "CSS Grid" => runtime.css_supports("display:grid"),
        "CSS Flexbox" => runtime.css_supports("display:flex"),
        "CSS Variables" => runtime.css_supports("--test"),
        "Fetch API" => runtime.has_global("fetch"),
        "Service Worker" => runtime.service_worker,
        "Web Workers" => runtime.has_global("Worker"),
        "WebGL" => runtime.canvas_webgl,
        "WebRTC" => runtime.has_global("RTCPeerConnection"),
        _ => false,
    }
}

/// Probe a batch of feature names. Every requested name appears exactly
/// once in the result, with `false` as the safe default.
pub fn check_feature_support(
    runtime: &RuntimeProfile,
    features: &[String],
) -> BTreeMap<String, bool> {
    features
        .iter()
        .map(|f| (f.clone(), is_feature_supported(runtime, f)))
        .collect()
}

/// Full compatibility record: raw UA, parsed identity, feature matrix.
pub fn collect_browser_compatibility(
    runtime: &RuntimeProfile,
    features: Option<&[String]>,
) -> BrowserCompatibility {
    let default_features: Vec<String> =
        DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect();
    let names = features.unwrap_or(&default_features);
    BrowserCompatibility {
        user_agent: runtime.user_agent.clone(),
        browser: browser_info(&runtime.user_agent),
        features: check_feature_support(runtime, names),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.60 Safari/537.36";
    const FIREFOX_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";
    const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
    const EDGE_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51";
    const IE_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Trident/7.0; rv:11.0) like Gecko";

    fn runtime() -> RuntimeProfile {
        serde_json::from_value(serde_json::json!({
            "userAgent": CHROME_UA,
            "globals": ["IntersectionObserver", "PerformanceObserver", "fetch", "Worker"],
            "cssSupports": {"display:grid": true, "display:flex": true, "--test": false},
            "canvasWebp": true,
            "serviceWorker": true
        }))
        .unwrap()
    }

    #[test]
    fn test_browser_info_ordered_matching() {
        let chrome = browser_info(CHROME_UA);
        assert_eq!(chrome.name.as_deref(), Some("Chrome"));
        assert_eq!(chrome.version.as_deref(), Some("124.0.6367.60"));

        let firefox = browser_info(FIREFOX_UA);
        assert_eq!(firefox.name.as_deref(), Some("Firefox"));

        let safari = browser_info(SAFARI_UA);
        assert_eq!(safari.name.as_deref(), Some("Safari"));
        assert_eq!(safari.version.as_deref(), Some("17.4"));

        // First match wins: Chromium Edge carries Chrome/x and identifies
        // as Chrome, the Edg/x arm only catches hypothetical UAs without it.
        let edge = browser_info(EDGE_UA);
        assert_eq!(edge.name.as_deref(), Some("Chrome"));

        let ie = browser_info(IE_UA);
        assert_eq!(ie.name.as_deref(), Some("Internet Explorer"));
        assert_eq!(ie.version.as_deref(), Some("11.0"));

        assert_eq!(browser_info("curl/8.5"), BrowserInfo::default());
    }

    #[test]
    fn test_feature_dispatch() {
        let rt = runtime();
        assert!(is_feature_supported(&rt, "IntersectionObserver"));
        assert!(!is_feature_supported(&rt, "ResizeObserver"));
        assert!(is_feature_supported(&rt, "CSS Grid"));
        assert!(!is_feature_supported(&rt, "CSS Variables"));
        assert!(is_feature_supported(&rt, "WebP"));
        assert!(!is_feature_supported(&rt, "AVIF"));
        assert!(is_feature_supported(&rt, "Service Worker"));
        assert!(is_feature_supported(&rt, "Fetch API"));
        assert!(is_feature_supported(&rt, "Web Workers"));
        assert!(!is_feature_supported(&rt, "WebGL"));
        assert!(!is_feature_supported(&rt, "made-up-feature"));
    }

    #[test]
    fn test_batch_includes_every_name_with_false_default() {
        let rt = runtime();
        let names = vec!["CSS Grid".to_string(), "made-up-feature".to_string()];
        let matrix = check_feature_support(&rt, &names);
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix["CSS Grid"], true);
        assert_eq!(matrix["made-up-feature"], false);
    }

    #[test]
    fn test_collect_uses_default_probe_list() {
        let rt = runtime();
        let compat = collect_browser_compatibility(&rt, None);
        assert_eq!(compat.features.len(), DEFAULT_FEATURES.len());
        assert_eq!(compat.browser.name.as_deref(), Some("Chrome"));
        assert_eq!(compat.user_agent, CHROME_UA);
        for name in DEFAULT_FEATURES {
            assert!(compat.features.contains_key(*name));
        }
    }
}
