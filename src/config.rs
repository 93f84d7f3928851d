//! Configuration discovery and effective settings resolution.
//!
//! Pagevet reads `pagevet.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags. Defaults:
//! - `snapshots`: none (must be configured or passed via `--snapshot`)
//! - `output`: `human`
//! - `[contrast].unparseable`: `flag` (unparseable colors report as a
//!   worst-case violation; set `skip` to drop unmeasurable pairs)
//! - `[contrast].max_elements`: 1000
//! - `[perf].observe`: false
//! - `[compat].features`: the built-in probe list
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::a11y::{A11yOptions, UnparseablePolicy};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
/// Contrast-check configuration section under `[contrast]`.
pub struct ContrastCfg {
    pub unparseable: Option<UnparseablePolicy>,
    #[serde(rename = "maxElements")]
    pub max_elements: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Performance section under `[perf]`.
pub struct PerfCfg {
    pub observe: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Compatibility section under `[compat]`.
pub struct CompatCfg {
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `pagevet.toml|yaml`.
pub struct PagevetConfig {
    pub snapshots: Option<Vec<String>>,
    pub output: Option<String>,
    #[serde(default)]
    pub contrast: Option<ContrastCfg>,
    #[serde(default)]
    pub perf: Option<PerfCfg>,
    #[serde(default)]
    pub compat: Option<CompatCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub snapshots: Vec<String>,
    pub snapshots_configured: bool,
    pub output: String,
    pub a11y: A11yOptions,
    pub observe: bool,
    pub features: Option<Vec<String>>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `pagevet.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("pagevet.toml").exists()
            || cur.join("pagevet.yaml").exists()
            || cur.join("pagevet.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `PagevetConfig` from `pagevet.toml` or `pagevet.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<PagevetConfig> {
    let toml_path = root.join("pagevet.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: PagevetConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["pagevet.yaml", "pagevet.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: PagevetConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_snapshots: &[String],
    cli_output: Option<&str>,
    cli_observe: Option<bool>,
    cli_features: &[String],
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let (snapshots, snapshots_configured) = if !cli_snapshots.is_empty() {
        (cli_snapshots.to_vec(), true)
    } else {
        match cfg.snapshots {
            Some(pats) if !pats.is_empty() => (pats, true),
            _ => (Vec::new(), false),
        }
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let contrast = cfg.contrast.unwrap_or_default();
    let defaults = A11yOptions::default();
    let a11y = A11yOptions {
        max_contrast_elements: contrast
            .max_elements
            .unwrap_or(defaults.max_contrast_elements),
        unparseable: contrast.unparseable.unwrap_or(defaults.unparseable),
    };

    let observe = cli_observe
        .or_else(|| cfg.perf.as_ref().and_then(|p| p.observe))
        .unwrap_or(false);

    let features = if !cli_features.is_empty() {
        Some(cli_features.to_vec())
    } else {
        cfg.compat.and_then(|c| c.features)
    };

    Effective {
        repo_root,
        snapshots,
        snapshots_configured,
        output,
        a11y,
        observe,
        features,
    }
}
