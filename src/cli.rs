//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pagevet",
    version,
    about = "Pagevet — page snapshot diagnostics",
    long_about = "Pagevet — audit captured page snapshots for accessibility defects (WCAG 2.1), Core Web Vitals, and browser feature support.\n\nConfiguration precedence: CLI > pagevet.toml > defaults.",
    after_help = "Examples:\n  pagevet audit --snapshot \"snapshots/*.json\"\n  pagevet a11y --snapshot page.json --output json\n  pagevet perf --snapshot page.json --observe\n  pagevet compat --snapshot page.json --feature \"CSS Grid\" --feature WebGL",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for the three audit sections.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current pagevet version.")]
    Version,
    /// Run all three audits (accessibility, performance, compatibility)
    #[command(
        about = "Run the full audit",
        long_about = "Run accessibility, performance, and compatibility audits over every matched snapshot. Exits non-zero when critical or serious issues are found.",
        after_help = "Examples:\n  pagevet audit --snapshot \"snapshots/*.json\"\n  pagevet audit --output json --strict"
    )]
    Audit {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long = "snapshot", help = "Snapshot file glob (repeatable)")]
        snapshots: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Attach a short-lived LCP observer for late-arriving entries")]
        observe: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero on any issue, not just critical/serious")]
        strict: bool,
    },
    /// Accessibility checks only
    #[command(
        about = "Run accessibility checks",
        long_about = "Run the alt-text, form-label, heading-hierarchy, and contrast checks over matched snapshots."
    )]
    A11y {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long = "snapshot", help = "Snapshot file glob (repeatable)")]
        snapshots: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero on any issue, not just critical/serious")]
        strict: bool,
    },
    /// Core Web Vitals only
    #[command(
        about = "Collect Web Vitals",
        long_about = "Read LCP/FCP/CLS from each snapshot's performance timeline and rate them against the fixed thresholds."
    )]
    Perf {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long = "snapshot", help = "Snapshot file glob (repeatable)")]
        snapshots: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Attach a short-lived LCP observer for late-arriving entries")]
        observe: bool,
    },
    /// Browser compatibility only
    #[command(
        about = "Probe browser compatibility",
        long_about = "Parse the captured user agent and probe the feature list against each snapshot's runtime capability table."
    )]
    Compat {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long = "snapshot", help = "Snapshot file glob (repeatable)")]
        snapshots: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long = "feature", help = "Feature name to probe (repeatable; default: built-in list)")]
        features: Vec<String>,
    },
}
