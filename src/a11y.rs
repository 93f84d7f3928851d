//! Accessibility checks over a page snapshot (WCAG 2.1 subset).
//!
//! Four independent, side-effect-free checks, each returning its own issue
//! list: image alt text, form control labels, heading hierarchy, and
//! text/background contrast. `detect_accessibility_issues` concatenates
//! them in that fixed order without deduplication.

use crate::color::{contrast_of, parse_color};
use crate::models::snapshot::{DocumentIndex, PageSnapshot};
use crate::models::{Impact, Issue, IssueKind};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;

const HELP_ALT: &str = "https://www.w3.org/WAI/tutorials/images/decision-tree/";
const HELP_DECORATIVE: &str = "https://www.w3.org/WAI/tutorials/images/decorative/";
const HELP_LABELS: &str = "https://www.w3.org/WAI/tutorials/forms/labels/";
const HELP_HEADINGS: &str = "https://www.w3.org/WAI/tutorials/page-structure/headings/";
const HELP_CONTRAST: &str =
    "https://www.w3.org/WAI/WCAG21/Understanding/contrast-minimum.html";

/// Tags likely to contain visible text; the contrast scan is restricted to
/// these.
const TEXT_TAGS: &[&str] = &[
    "p", "span", "div", "h1", "h2", "h3", "h4", "h5", "h6", "a", "button", "label", "li", "td",
    "th", "legend", "caption", "summary", "figcaption", "blockquote", "cite", "code", "pre", "em",
    "strong", "small", "mark", "ins", "del", "sub", "sup",
];

/// What to do when a color fails to parse during the contrast check.
///
/// `Flag` keeps the historical behavior: the pair measures as ratio 1 and
/// is reported as a violation. `Skip` treats the pair as unmeasurable and
/// emits nothing.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnparseablePolicy {
    #[default]
    Flag,
    Skip,
}

#[derive(Clone, Debug)]
/// Tuning for the contrast scan.
pub struct A11yOptions {
    pub max_contrast_elements: usize,
    pub unparseable: UnparseablePolicy,
}

impl Default for A11yOptions {
    fn default() -> Self {
        A11yOptions {
            max_contrast_elements: 1000,
            unparseable: UnparseablePolicy::Flag,
        }
    }
}

fn issue(
    file: &str,
    element: &str,
    kind: IssueKind,
    impact: Impact,
    message: String,
    help_url: &str,
) -> Issue {
    Issue {
        file: file.to_string(),
        element: element.to_string(),
        kind,
        impact,
        message,
        help_url: Some(help_url.to_string()),
    }
}

/// Flag `img` elements without an `alt` attribute, and decorative-looking
/// empty alts that carry no explicit `role`.
pub fn check_image_alts(doc: &DocumentIndex, file: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (_, el) in doc.iter() {
        if el.node.tag != "img" {
            continue;
        }
        match el.node.attr("alt") {
            None => issues.push(issue(
                file,
                &el.path,
                IssueKind::MissingAlt,
                Impact::Serious,
                "Image has no alt attribute".to_string(),
                HELP_ALT,
            )),
            Some("") if el.node.attr("role").is_none() => issues.push(issue(
                file,
                &el.path,
                IssueKind::EmptyAltWithoutRole,
                Impact::Minor,
                "Decorative image should declare role=\"presentation\"".to_string(),
                HELP_DECORATIVE,
            )),
            Some(_) => {}
        }
    }
    issues
}

/// Flag form controls without an `id`, and controls whose `id` has neither
/// a matching `label[for]` nor an aria label.
pub fn check_form_labels(doc: &DocumentIndex, file: &str) -> Vec<Issue> {
    // One pass to collect every label[for] target in the document.
    let label_targets: HashSet<&str> = doc
        .iter()
        .filter(|(_, el)| el.node.tag == "label")
        .filter_map(|(_, el)| el.node.attr("for"))
        .collect();

    let mut issues = Vec::new();
    for (_, el) in doc.iter() {
        if !matches!(el.node.tag.as_str(), "input" | "select" | "textarea") {
            continue;
        }
        let id = match el.node.attr("id") {
            Some(id) if !id.is_empty() => id,
            _ => {
                issues.push(issue(
                    file,
                    &el.path,
                    IssueKind::MissingId,
                    Impact::Moderate,
                    "Form control has no id".to_string(),
                    HELP_LABELS,
                ));
                continue;
            }
        };
        let labelled = label_targets.contains(id)
            || el.node.has_attr("aria-label")
            || el.node.has_attr("aria-labelledby");
        if !labelled {
            issues.push(issue(
                file,
                &el.path,
                IssueKind::MissingLabel,
                Impact::Serious,
                "Form control has no associated label".to_string(),
                HELP_LABELS,
            ));
        }
    }
    issues
}

fn heading_level(tag: &str) -> Option<u32> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Walk headings in document order; flag repeated `h1`s and skipped levels
/// (e.g. `h1` directly to `h3`).
pub fn check_heading_hierarchy(doc: &DocumentIndex, file: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut last_level = 0u32;
    for (_, el) in doc.iter() {
        let level = match heading_level(&el.node.tag) {
            Some(l) => l,
            None => continue,
        };
        if level == 1 && last_level == 1 {
            issues.push(issue(
                file,
                &el.path,
                IssueKind::MultipleH1,
                Impact::Moderate,
                "Page has more than one h1".to_string(),
                HELP_HEADINGS,
            ));
        }
        if last_level > 0 && level > last_level + 1 {
            issues.push(issue(
                file,
                &el.path,
                IssueKind::SkippedHeadingLevel,
                Impact::Moderate,
                format!("Heading level skipped (h{last_level} to h{level})"),
                HELP_HEADINGS,
            ));
        }
        last_level = level;
    }
    issues
}

fn is_bold(weight: &str) -> bool {
    weight == "bold" || weight.parse::<u32>().map(|w| w >= 700).unwrap_or(false)
}

/// Measure text/background contrast for visible text elements against the
/// WCAG AA thresholds (4.5:1 normal, 3:1 large text).
///
/// The candidate set is restricted to a fixed tag allow-list, filtered to
/// elements with a direct non-whitespace text child that are actually
/// rendered, and capped for bounded latency. Per-element failures skip the
/// element, never the batch.
pub fn check_contrast(doc: &DocumentIndex, file: &str, opts: &A11yOptions) -> Vec<Issue> {
    let text_tags: HashSet<&str> = TEXT_TAGS.iter().copied().collect();
    let candidates: Vec<usize> = doc
        .iter()
        .filter(|(_, el)| text_tags.contains(el.node.tag.as_str()))
        .map(|(i, _)| i)
        .take(opts.max_contrast_elements)
        .filter(|&i| {
            doc.has_direct_text(i)
                && doc.display(i) != "none"
                && doc.visibility(i) != "hidden"
                && doc.opacity(i) > 0.1
                && doc.font_size(i) > 8.0
        })
        .collect();

    // Measurements are independent; run them in parallel and let the
    // indexed collect restore document order.
    candidates
        .par_iter()
        .filter_map(|&i| {
            let color = doc.color(i);
            let background = doc.effective_background(i);
            let ratio = match (
                parse_color(&color).channels(),
                parse_color(&background).channels(),
            ) {
                (Some(a), Some(b)) => contrast_of(a, b),
                _ => match opts.unparseable {
                    UnparseablePolicy::Flag => 1.0,
                    UnparseablePolicy::Skip => return None,
                },
            };

            let font_size = doc.font_size(i);
            let large = font_size >= 18.0 || (font_size >= 14.0 && is_bold(&doc.font_weight(i)));
            let threshold = if large { 3.0 } else { 4.5 };
            if ratio >= threshold {
                return None;
            }
            let impact = if ratio < 2.0 {
                Impact::Critical
            } else {
                Impact::Serious
            };
            Some(issue(
                file,
                doc.path(i),
                IssueKind::LowContrast,
                impact,
                format!("Contrast ratio too low ({ratio:.2}:1, required: {threshold}:1)"),
                HELP_CONTRAST,
            ))
        })
        .collect()
}

/// Run all four checks in fixed order: alt text, labels, headings,
/// contrast. No deduplication across checks.
pub fn detect_accessibility_issues(
    snapshot: &PageSnapshot,
    file: &str,
    opts: &A11yOptions,
) -> Vec<Issue> {
    let doc = DocumentIndex::build(&snapshot.document);
    let mut issues = check_image_alts(&doc, file);
    issues.extend(check_form_labels(&doc, file));
    issues.extend(check_heading_hierarchy(&doc, file));
    issues.extend(check_contrast(&doc, file, opts));
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_of(v: serde_json::Value) -> PageSnapshot {
        serde_json::from_value(json!({"document": v})).unwrap()
    }

    fn body(children: serde_json::Value) -> serde_json::Value {
        json!({"tag": "html", "children": [{"tag": "body", "children": children}]})
    }

    #[test]
    fn test_missing_alt_is_one_serious_issue() {
        let snap = doc_of(body(json!([{"tag": "img", "attributes": {"src": "x.png"}}])));
        let doc = DocumentIndex::build(&snap.document);
        let issues = check_image_alts(&doc, "p.json");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingAlt);
        assert_eq!(issues[0].impact, Impact::Serious);
    }

    #[test]
    fn test_empty_alt_without_role_is_minor() {
        let snap = doc_of(body(json!([
            {"tag": "img", "attributes": {"alt": ""}},
            {"tag": "img", "attributes": {"alt": "", "role": "presentation"}},
            {"tag": "img", "attributes": {"alt": "a chart"}}
        ])));
        let doc = DocumentIndex::build(&snap.document);
        let issues = check_image_alts(&doc, "p.json");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::EmptyAltWithoutRole);
        assert_eq!(issues[0].impact, Impact::Minor);
    }

    #[test]
    fn test_form_labels() {
        let snap = doc_of(body(json!([
            {"tag": "input"},
            {"tag": "input", "attributes": {"id": "name"}},
            {"tag": "label", "attributes": {"for": "email"}},
            {"tag": "input", "attributes": {"id": "email"}},
            {"tag": "select", "attributes": {"id": "x", "aria-label": "choose"}},
            {"tag": "textarea", "attributes": {"id": "y", "aria-labelledby": "z"}}
        ])));
        let doc = DocumentIndex::build(&snap.document);
        let issues = check_form_labels(&doc, "p.json");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::MissingId);
        assert_eq!(issues[0].impact, Impact::Moderate);
        assert_eq!(issues[1].kind, IssueKind::MissingLabel);
        assert_eq!(issues[1].impact, Impact::Serious);
    }

    #[test]
    fn test_heading_skip_flagged() {
        let snap = doc_of(body(json!([
            {"tag": "h1", "children": ["a"]},
            {"tag": "h3", "children": ["b"]}
        ])));
        let doc = DocumentIndex::build(&snap.document);
        let issues = check_heading_hierarchy(&doc, "p.json");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::SkippedHeadingLevel);
        assert!(issues[0].message.contains("h1 to h3"));
    }

    #[test]
    fn test_heading_in_order_passes() {
        let snap = doc_of(body(json!([
            {"tag": "h1"}, {"tag": "h2"}, {"tag": "h3"}
        ])));
        let doc = DocumentIndex::build(&snap.document);
        assert!(check_heading_hierarchy(&doc, "p.json").is_empty());
    }

    #[test]
    fn test_two_h1_flagged() {
        let snap = doc_of(body(json!([{"tag": "h1"}, {"tag": "h1"}])));
        let doc = DocumentIndex::build(&snap.document);
        let issues = check_heading_hierarchy(&doc, "p.json");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MultipleH1);
    }

    #[test]
    fn test_contrast_black_on_white_large_text_passes() {
        let snap = doc_of(body(json!([{
            "tag": "p",
            "style": {"color": "rgb(0, 0, 0)", "background-color": "rgb(255, 255, 255)", "font-size": 20.0},
            "children": ["readable"]
        }])));
        let doc = DocumentIndex::build(&snap.document);
        assert!(check_contrast(&doc, "p.json", &A11yOptions::default()).is_empty());
    }

    #[test]
    fn test_contrast_low_ratio_critical_below_two() {
        // White on near-white: ratio is close to 1.
        let snap = doc_of(body(json!([{
            "tag": "p",
            "style": {"color": "rgb(250, 250, 250)", "background-color": "rgb(255, 255, 255)", "font-size": 16.0},
            "children": ["faint"]
        }])));
        let doc = DocumentIndex::build(&snap.document);
        let issues = check_contrast(&doc, "p.json", &A11yOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::LowContrast);
        assert_eq!(issues[0].impact, Impact::Critical);
        assert!(issues[0].message.contains("4.5:1"));
    }

    #[test]
    fn test_contrast_borderline_serious_between_two_and_threshold() {
        // Gray on white is ~3.95, below 4.5 but above 2.
        let snap = doc_of(body(json!([{
            "tag": "p",
            "style": {"color": "rgb(128, 128, 128)", "background-color": "rgb(255, 255, 255)", "font-size": 16.0},
            "children": ["gray"]
        }])));
        let doc = DocumentIndex::build(&snap.document);
        let issues = check_contrast(&doc, "p.json", &A11yOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].impact, Impact::Serious);
    }

    #[test]
    fn test_contrast_large_text_threshold_three() {
        // ~3.95 passes once the text qualifies as large (bold >= 14px).
        let snap = doc_of(body(json!([{
            "tag": "p",
            "style": {
                "color": "rgb(128, 128, 128)",
                "background-color": "rgb(255, 255, 255)",
                "font-size": 14.0,
                "font-weight": "700"
            },
            "children": ["gray"]
        }])));
        let doc = DocumentIndex::build(&snap.document);
        assert!(check_contrast(&doc, "p.json", &A11yOptions::default()).is_empty());
    }

    #[test]
    fn test_contrast_skips_invisible_and_tiny_text() {
        let snap = doc_of(body(json!([
            {"tag": "p", "style": {"color": "rgb(255, 255, 255)", "display": "none"}, "children": ["x"]},
            {"tag": "p", "style": {"color": "rgb(255, 255, 255)", "visibility": "hidden"}, "children": ["x"]},
            {"tag": "p", "style": {"color": "rgb(255, 255, 255)", "opacity": 0.05}, "children": ["x"]},
            {"tag": "p", "style": {"color": "rgb(255, 255, 255)", "font-size": 7.0}, "children": ["x"]},
            {"tag": "p", "style": {"color": "rgb(255, 255, 255)"}, "children": ["   "]}
        ])));
        let doc = DocumentIndex::build(&snap.document);
        assert!(check_contrast(&doc, "p.json", &A11yOptions::default()).is_empty());
    }

    #[test]
    fn test_unparseable_color_flagged_by_default_skipped_when_configured() {
        let snap = doc_of(body(json!([{
            "tag": "p",
            "style": {"color": "hsl(0, 0%, 10%)", "background-color": "rgb(255, 255, 255)"},
            "children": ["exotic"]
        }])));
        let doc = DocumentIndex::build(&snap.document);

        let flagged = check_contrast(&doc, "p.json", &A11yOptions::default());
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].impact, Impact::Critical);

        let opts = A11yOptions {
            unparseable: UnparseablePolicy::Skip,
            ..A11yOptions::default()
        };
        assert!(check_contrast(&doc, "p.json", &opts).is_empty());
    }

    #[test]
    fn test_detect_concatenates_in_fixed_order() {
        let snap = doc_of(body(json!([
            {"tag": "h1"}, {"tag": "h1"},
            {"tag": "img"},
            {"tag": "input"},
            {"tag": "p", "style": {"color": "rgb(200, 200, 200)", "background-color": "rgb(255, 255, 255)"}, "children": ["low"]}
        ])));
        let issues = detect_accessibility_issues(&snap, "p.json", &A11yOptions::default());
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::MissingAlt,
                IssueKind::MissingId,
                IssueKind::MultipleH1,
                IssueKind::LowContrast
            ]
        );
    }
}
