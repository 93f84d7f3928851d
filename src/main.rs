//! Pagevet CLI binary entry point.
//! Delegates to modules for the audit sections and prints results.

mod a11y;
mod audit;
mod cli;
mod color;
mod compat;
mod config;
mod models;
mod output;
mod perf;
mod utils;

use audit::{AuditOptions, Sections};
use clap::Parser;
use cli::{Cli, Commands};
use config::Effective;

fn require_snapshots(eff: &Effective) {
    if !eff.snapshots_configured {
        eprintln!(
            "{} {}",
            utils::error_prefix(),
            "No snapshots configured. Pass --snapshot or add pagevet.toml."
        );
        std::process::exit(2);
    }
    if config::load_config(&eff.repo_root).is_none() {
        eprintln!(
            "{} {}",
            utils::note_prefix(),
            "No pagevet.toml found; using defaults."
        );
    }
}

fn run(eff: &Effective, opts: &AuditOptions, strict: bool) {
    let (report, errors) = audit::run_audit(&eff.repo_root, &eff.snapshots, opts);
    output::print_audit(&report, &eff.output, &errors);
    if report.reports.is_empty() && !errors.is_empty() {
        std::process::exit(2);
    }
    let failing = if strict {
        report.summary.total() > 0
    } else {
        report.summary.has_blocking()
    };
    if failing {
        std::process::exit(1);
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Audit {
            repo_root,
            snapshots,
            output,
            observe,
            strict,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                &snapshots,
                output.as_deref(),
                if observe { Some(true) } else { None },
                &[],
            );
            require_snapshots(&eff);
            let opts = AuditOptions {
                sections: Sections::all(),
                a11y: eff.a11y.clone(),
                observe: eff.observe,
                features: eff.features.clone(),
            };
            run(&eff, &opts, strict);
        }
        Commands::A11y {
            repo_root,
            snapshots,
            output,
            strict,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                &snapshots,
                output.as_deref(),
                None,
                &[],
            );
            require_snapshots(&eff);
            let opts = AuditOptions {
                sections: Sections {
                    a11y: true,
                    perf: false,
                    compat: false,
                },
                a11y: eff.a11y.clone(),
                observe: false,
                features: None,
            };
            run(&eff, &opts, strict);
        }
        Commands::Perf {
            repo_root,
            snapshots,
            output,
            observe,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                &snapshots,
                output.as_deref(),
                if observe { Some(true) } else { None },
                &[],
            );
            require_snapshots(&eff);
            let opts = AuditOptions {
                sections: Sections {
                    a11y: false,
                    perf: true,
                    compat: false,
                },
                a11y: eff.a11y.clone(),
                observe: eff.observe,
                features: None,
            };
            run(&eff, &opts, false);
        }
        Commands::Compat {
            repo_root,
            snapshots,
            output,
            features,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                &snapshots,
                output.as_deref(),
                None,
                &features,
            );
            require_snapshots(&eff);
            let opts = AuditOptions {
                sections: Sections {
                    a11y: false,
                    perf: false,
                    compat: true,
                },
                a11y: eff.a11y.clone(),
                observe: false,
                features: eff.features.clone(),
            };
            run(&eff, &opts, false);
        }
    }
}
