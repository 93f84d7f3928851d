//! Audit runner: load snapshot files, run the requested sections, and
//! aggregate a report.
//!
//! Each invocation builds fresh result objects; nothing is shared across
//! runs, and any observer opened for the performance section is disposed
//! before the per-file report is returned.

use crate::a11y::{detect_accessibility_issues, A11yOptions};
use crate::compat::{collect_browser_compatibility, BrowserCompatibility};
use crate::models::{AuditSummary, Issue};
use crate::perf::{collect_performance_report, PerformanceReport, SnapshotTimeline};
use crate::models::snapshot::PageSnapshot;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug)]
/// Which report sections to produce.
pub struct Sections {
    pub a11y: bool,
    pub perf: bool,
    pub compat: bool,
}

impl Sections {
    pub fn all() -> Self {
        Sections {
            a11y: true,
            perf: true,
            compat: true,
        }
    }
}

#[derive(Clone, Debug)]
/// Resolved options for one audit run.
pub struct AuditOptions {
    pub sections: Sections,
    pub a11y: A11yOptions,
    /// Attach a short-lived LCP observer when the runtime supports one.
    pub observe: bool,
    /// Override for the compatibility probe list.
    pub features: Option<Vec<String>>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        AuditOptions {
            sections: Sections::all(),
            a11y: A11yOptions::default(),
            observe: false,
            features: None,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
/// Everything produced for one snapshot file.
pub struct SnapshotReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub issues: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<BrowserCompatibility>,
}

#[derive(Serialize, Clone, Debug)]
/// Combined output of one audit run.
pub struct AuditReport {
    pub reports: Vec<SnapshotReport>,
    pub summary: AuditSummary,
}

/// Audit one already-parsed snapshot.
pub fn audit_snapshot(snapshot: &PageSnapshot, file: &str, opts: &AuditOptions) -> SnapshotReport {
    let issues = if opts.sections.a11y {
        detect_accessibility_issues(snapshot, file, &opts.a11y)
    } else {
        Vec::new()
    };

    let performance = opts.sections.perf.then(|| {
        let timeline = SnapshotTimeline::new(
            snapshot.performance.clone(),
            snapshot.runtime.has_global("PerformanceObserver"),
        );
        collect_performance_report(&timeline, opts.observe)
    });

    let compatibility = opts
        .sections
        .compat
        .then(|| collect_browser_compatibility(&snapshot.runtime, opts.features.as_deref()));

    SnapshotReport {
        file: file.to_string(),
        url: snapshot.url.clone(),
        issues,
        performance,
        compatibility,
    }
}

fn display_path(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// Run the audit over every snapshot file matched by `patterns` (globs
/// resolved against `root`).
///
/// Unreadable or unparseable files never abort the batch; they surface in
/// the second tuple element. Matched files are processed in sorted order.
pub fn run_audit(
    root: &Path,
    patterns: &[String],
    opts: &AuditOptions,
) -> (AuditReport, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();
    let mut targets: Vec<PathBuf> = Vec::new();
    for pat in patterns {
        let abs = root.join(pat);
        let pattern = abs.to_string_lossy().to_string();
        match glob::glob(&pattern) {
            Ok(paths) => {
                for entry in paths.flatten() {
                    targets.push(entry);
                }
            }
            Err(e) => errors.push(format!("Bad snapshot pattern '{pat}': {e}")),
        }
    }
    targets.sort();
    targets.dedup();
    if targets.is_empty() && errors.is_empty() {
        errors.push(format!(
            "No snapshot files matched {:?} under '{}'.",
            patterns,
            root.to_string_lossy()
        ));
    }

    let per_file: Vec<Result<SnapshotReport, String>> = targets
        .par_iter()
        .map(|path| {
            let file = display_path(path, root);
            let data = fs::read_to_string(path)
                .map_err(|e| format!("Cannot read snapshot '{file}': {e}"))?;
            let snapshot: PageSnapshot = serde_json::from_str(&data)
                .map_err(|e| format!("Snapshot '{file}' is not valid JSON: {e}"))?;
            Ok(audit_snapshot(&snapshot, &file, opts))
        })
        .collect();

    let mut summary = AuditSummary::default();
    let mut reports = Vec::new();
    for outcome in per_file {
        match outcome {
            Ok(report) => {
                summary.files += 1;
                for issue in &report.issues {
                    summary.record(issue.impact);
                }
                reports.push(report);
            }
            Err(e) => errors.push(e),
        }
    }

    (AuditReport { reports, summary }, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_snapshot(dir: &Path, name: &str, v: serde_json::Value) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        write!(f, "{}", serde_json::to_string(&v).unwrap()).unwrap();
    }

    fn sample_snapshot() -> serde_json::Value {
        json!({
            "url": "https://example.test/",
            "document": {
                "tag": "html",
                "children": [{
                    "tag": "body",
                    "style": {"background-color": "rgb(255, 255, 255)"},
                    "children": [
                        {"tag": "h1", "children": ["Title"]},
                        {"tag": "img"},
                        {"tag": "p", "style": {"color": "rgb(0, 0, 0)"}, "children": ["ok"]}
                    ]
                }]
            },
            "performance": [
                {"entryType": "paint", "name": "first-contentful-paint", "startTime": 812.0},
                {"entryType": "largest-contentful-paint", "startTime": 1900.0},
                {"entryType": "layout-shift", "value": 0.02, "hadRecentInput": false}
            ],
            "runtime": {
                "userAgent": "Mozilla/5.0 Chrome/120.0.0.0 Safari/537.36",
                "globals": ["PerformanceObserver"],
                "cssSupports": {"display:grid": true}
            }
        })
    }

    #[test]
    fn test_run_audit_end_to_end() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "page.json", sample_snapshot());

        let (report, errors) = run_audit(
            dir.path(),
            &["*.json".to_string()],
            &AuditOptions::default(),
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(report.reports.len(), 1);
        assert_eq!(report.summary.files, 1);
        // The img with no alt is the only defect.
        assert_eq!(report.summary.serious, 1);
        let snap = &report.reports[0];
        assert_eq!(snap.file, "page.json");
        let perf = snap.performance.as_ref().unwrap();
        assert_eq!(perf.metrics.lcp, Some(1900.0));
        assert_eq!(perf.metrics.cls, Some(0.02));
        let compat = snap.compatibility.as_ref().unwrap();
        assert_eq!(compat.browser.name.as_deref(), Some("Chrome"));
    }

    #[test]
    fn test_run_audit_section_gating() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "page.json", sample_snapshot());

        let opts = AuditOptions {
            sections: Sections {
                a11y: false,
                perf: true,
                compat: false,
            },
            ..AuditOptions::default()
        };
        let (report, _) = run_audit(dir.path(), &["*.json".to_string()], &opts);
        let snap = &report.reports[0];
        assert!(snap.issues.is_empty());
        assert!(snap.performance.is_some());
        assert!(snap.compatibility.is_none());
    }

    #[test]
    fn test_run_audit_reports_unreadable_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        write_snapshot(dir.path(), "ok.json", sample_snapshot());

        let (report, errors) = run_audit(
            dir.path(),
            &["*.json".to_string()],
            &AuditOptions::default(),
        );
        assert_eq!(report.reports.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("broken.json"));
    }

    #[test]
    fn test_run_audit_no_matches_is_an_error() {
        let dir = tempdir().unwrap();
        let (report, errors) = run_audit(
            dir.path(),
            &["missing/*.json".to_string()],
            &AuditOptions::default(),
        );
        assert!(report.reports.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
