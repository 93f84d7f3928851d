//! Pagevet core library.
//!
//! This crate exposes programmatic APIs for auditing captured page
//! snapshots: accessibility defects per WCAG 2.1, Core Web Vitals, and
//! browser feature support.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `color`: CSS color parsing and WCAG contrast math.
//! - `a11y`: The four accessibility checks and the combined detector.
//! - `perf`: Performance timeline reads, LCP observation, metric ratings.
//! - `compat`: User-agent parsing and feature-support probing.
//! - `audit`: Orchestration across snapshot files and sections.
//! - `models`: Issue/summary data models and the snapshot schema.
//! - `output`: Human/JSON printers for audit reports.
//! - `utils`: Supporting helpers.
//!
//! Note: All documentation comments are written in English by convention.
pub mod a11y;
pub mod audit;
pub mod cli;
pub mod color;
pub mod compat;
pub mod config;
pub mod models;
pub mod output;
pub mod perf;
pub mod utils;
