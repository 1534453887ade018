//! Structured diagnostics for scan operations.
//!
//! Skipped files and per-file failures are collected instead of aborting the
//! scan, sorted deterministically, and reported in both human and JSON output.

pub mod scan_diagnostics;

pub use scan_diagnostics::{DiagnosticStage, ScanDiagnostic, SkipReason};
