//! Shared data models for audit output: issues, impact levels, summaries.

pub mod snapshot;

use serde::Serialize;
use std::fmt;

/// Ordered severity of one accessibility defect, least to most severe.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Impact::Minor => "minor",
            Impact::Moderate => "moderate",
            Impact::Serious => "serious",
            Impact::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Fixed vocabulary of detectable accessibility defects.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MissingAlt,
    EmptyAltWithoutRole,
    MissingId,
    MissingLabel,
    MultipleH1,
    SkippedHeadingLevel,
    LowContrast,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::MissingAlt => "missing-alt",
            IssueKind::EmptyAltWithoutRole => "empty-alt-without-role",
            IssueKind::MissingId => "missing-id",
            IssueKind::MissingLabel => "missing-label",
            IssueKind::MultipleH1 => "multiple-h1",
            IssueKind::SkippedHeadingLevel => "skipped-heading-level",
            IssueKind::LowContrast => "low-contrast",
        }
    }
}

#[derive(Serialize, Clone, Debug)]
/// A single detected accessibility defect.
///
/// `element` is a node path inside the snapshot document (the report is
/// handed around by value, so nodes are referenced by address rather than
/// borrowed past the audit pass).
pub struct Issue {
    pub file: String,
    pub element: String,
    pub kind: IssueKind,
    pub impact: Impact,
    pub message: String,
    #[serde(rename = "helpUrl", skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
}

#[derive(Serialize, Clone, Copy, Debug, Default)]
/// Aggregated per-impact counts used by printers and exit codes.
pub struct AuditSummary {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
    pub files: usize,
}

impl AuditSummary {
    pub fn record(&mut self, impact: Impact) {
        match impact {
            Impact::Critical => self.critical += 1,
            Impact::Serious => self.serious += 1,
            Impact::Moderate => self.moderate += 1,
            Impact::Minor => self.minor += 1,
        }
    }

    /// Whether the run should fail CI under the default (non-strict) policy.
    pub fn has_blocking(&self) -> bool {
        self.critical > 0 || self.serious > 0
    }

    pub fn total(&self) -> usize {
        self.critical + self.serious + self.moderate + self.minor
    }
}
