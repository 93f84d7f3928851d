//! Output rendering for audit reports.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is the
//! serialized report plus load errors; the human form groups lines per
//! snapshot with severity icons and a closing summary.

use crate::audit::{AuditReport, SnapshotReport};
use crate::models::Impact;
use crate::perf::Rating;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn impact_tag(impact: Impact, color: bool) -> String {
    let tag = format!("⟦{impact}⟧");
    if !color {
        return tag;
    }
    match impact {
        Impact::Critical | Impact::Serious => tag.red().bold().to_string(),
        Impact::Moderate => tag.yellow().bold().to_string(),
        Impact::Minor => tag.blue().bold().to_string(),
    }
}

fn impact_icon(impact: Impact, color: bool) -> String {
    let (icon, painted) = match impact {
        Impact::Critical | Impact::Serious => ("✖", "✖".red().to_string()),
        Impact::Moderate => ("▲", "▲".yellow().to_string()),
        Impact::Minor => ("◆", "◆".blue().to_string()),
    };
    if color {
        painted
    } else {
        icon.to_string()
    }
}

fn rating_mark(rating: Rating) -> &'static str {
    match rating {
        Rating::Good => "✅",
        Rating::NeedsImprovement => "⚠️",
        Rating::Poor => "❌",
        Rating::Unknown => "–",
    }
}

fn print_metric_line(name: &str, value: Option<f64>, unit: &str, rating: Rating, color: bool) {
    let shown = match value {
        Some(v) => format!("{v:.2}{unit}"),
        None => "not yet measurable".to_string(),
    };
    let line = format!(
        "  {} {} — {} {}",
        name,
        shown,
        rating.as_str(),
        rating_mark(rating)
    );
    if color {
        match rating {
            Rating::Good => println!("{}", line.green()),
            Rating::NeedsImprovement => println!("{}", line.yellow()),
            Rating::Poor => println!("{}", line.red()),
            Rating::Unknown => println!("{}", line.bright_black()),
        }
    } else {
        println!("{line}");
    }
}

fn print_snapshot(report: &SnapshotReport, color: bool) {
    let header = match &report.url {
        Some(url) => format!("{} ({url})", report.file),
        None => report.file.clone(),
    };
    if color {
        println!("{}", header.bold());
    } else {
        println!("{header}");
    }

    for issue in &report.issues {
        println!(
            "{} {} ❲{}❳ {} — {}",
            impact_icon(issue.impact, color),
            impact_tag(issue.impact, color),
            issue.kind.as_str(),
            issue.element,
            issue.message
        );
    }
    if report.issues.is_empty() {
        let line = "  no accessibility issues detected";
        if color {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }

    if let Some(perf) = &report.performance {
        println!("  — Web Vitals —");
        print_metric_line("LCP", perf.metrics.lcp, " ms", perf.ratings.lcp, color);
        print_metric_line("FCP", perf.metrics.fcp, " ms", perf.ratings.fcp, color);
        print_metric_line("CLS", perf.metrics.cls, "", perf.ratings.cls, color);
    }

    if let Some(compat) = &report.compatibility {
        let browser = format!(
            "  — Browser — {} {}",
            compat.browser.name.as_deref().unwrap_or("Unknown"),
            compat.browser.version.as_deref().unwrap_or("")
        );
        println!("{}", browser.trim_end());
        for (feature, supported) in &compat.features {
            println!(
                "  {feature}: {}",
                if *supported {
                    "✅ supported"
                } else {
                    "❌ not supported"
                }
            );
        }
    }
}

/// Print an audit report in the requested format. Load errors go to stderr
/// in human mode and into the `errors` array in JSON mode.
pub fn print_audit(report: &AuditReport, output: &str, errors: &[String]) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_audit_json(report, errors)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for e in errors {
                eprintln!("{} {}", crate::utils::error_prefix(), e);
            }
            for snap in &report.reports {
                print_snapshot(snap, color);
            }
            let s = &report.summary;
            let summary = format!(
                "— Summary — critical={} serious={} moderate={} minor={} files={}",
                s.critical, s.serious, s.moderate, s.minor, s.files
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{summary}");
            }
        }
    }
}

/// Compose the audit JSON object (pure) for testing/snapshot purposes.
pub fn compose_audit_json(report: &AuditReport, errors: &[String]) -> JsonVal {
    let mut out = serde_json::to_value(report).unwrap();
    if let JsonVal::Object(obj) = &mut out {
        obj.insert("errors".to_string(), json!(errors));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditSummary, Issue, IssueKind};

    fn sample_report() -> AuditReport {
        let mut summary = AuditSummary {
            files: 1,
            ..AuditSummary::default()
        };
        summary.record(Impact::Serious);
        AuditReport {
            reports: vec![SnapshotReport {
                file: "page.json".into(),
                url: Some("https://example.test/".into()),
                issues: vec![Issue {
                    file: "page.json".into(),
                    element: "html > body:nth-child(1) > img:nth-child(1)".into(),
                    kind: IssueKind::MissingAlt,
                    impact: Impact::Serious,
                    message: "Image has no alt attribute".into(),
                    help_url: None,
                }],
                performance: None,
                compatibility: None,
            }],
            summary,
        }
    }

    #[test]
    fn test_compose_audit_json_shape() {
        let out = compose_audit_json(&sample_report(), &["oops".to_string()]);
        assert_eq!(out["summary"]["serious"], 1);
        assert_eq!(out["summary"]["files"], 1);
        assert_eq!(out["reports"][0]["issues"][0]["kind"], "missing-alt");
        assert_eq!(out["errors"][0], "oops");
        // Sections that did not run are absent, not null.
        assert!(out["reports"][0].get("performance").is_none());
    }

    #[test]
    fn test_compose_audit_json_no_errors_is_empty_array() {
        let out = compose_audit_json(&sample_report(), &[]);
        assert!(out["errors"].as_array().unwrap().is_empty());
    }
}
