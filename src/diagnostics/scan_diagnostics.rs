//! Scan diagnostics: skip reasons and per-file errors.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Reason why a file was not handed to the extractor.
///
/// Variants are declared in report order: rule-based skips first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `.git/`, `node_modules/`, the callmap cache directory
    IgnoredInternal,
    IgnoredByGitignore,
    /// Matched an `--exclude` glob
    ExcludedByGlob,
    NotPhp,
    NotAFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::IgnoredInternal => "internal ignore rule",
            SkipReason::IgnoredByGitignore => "matched by gitignore",
            SkipReason::ExcludedByGlob => "excluded by pattern",
            SkipReason::NotPhp => "not a PHP file",
            SkipReason::NotAFile => "not a regular file",
        })
    }
}

/// Where a file failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    Read,
    Parse,
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticStage::Read => "reading file",
            DiagnosticStage::Parse => "parsing source",
        })
    }
}

/// A diagnostic event from the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanDiagnostic {
    Skipped {
        /// Path relative to its source root
        path: String,
        reason: SkipReason,
    },
    Error {
        /// Path relative to its source root
        path: String,
        stage: DiagnosticStage,
        message: String,
    },
}

impl ScanDiagnostic {
    pub fn path(&self) -> &str {
        match self {
            ScanDiagnostic::Skipped { path, .. } => path,
            ScanDiagnostic::Error { path, .. } => path,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ScanDiagnostic::Error { .. } => 0,
            ScanDiagnostic::Skipped { .. } => 1,
        }
    }

    pub fn skipped(path: String, reason: SkipReason) -> Self {
        ScanDiagnostic::Skipped { path, reason }
    }

    pub fn error(path: String, stage: DiagnosticStage, message: String) -> Self {
        ScanDiagnostic::Error {
            path,
            stage,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ScanDiagnostic::Error { .. })
    }

    /// One line for stderr:
    /// - "SKIP vendor/autoload.php: excluded by pattern"
    /// - "ERROR src/Bad.php: parsing source: syntax error near line 5"
    pub fn format_stderr(&self) -> String {
        match self {
            ScanDiagnostic::Skipped { path, reason } => format!("SKIP {}: {}", path, reason),
            ScanDiagnostic::Error {
                path,
                stage,
                message,
            } => format!("ERROR {}: {}: {}", path, stage, message),
        }
    }
}

impl fmt::Display for ScanDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_stderr())
    }
}

impl PartialOrd for ScanDiagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// By path, then errors before skips, then stage or reason, then message.
impl Ord for ScanDiagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path()
            .cmp(other.path())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| match (self, other) {
                (
                    ScanDiagnostic::Error { stage: a, message: ma, .. },
                    ScanDiagnostic::Error { stage: b, message: mb, .. },
                ) => a.cmp(b).then_with(|| ma.cmp(mb)),
                (
                    ScanDiagnostic::Skipped { reason: a, .. },
                    ScanDiagnostic::Skipped { reason: b, .. },
                ) => a.cmp(b),
                _ => Ordering::Equal,
            })
    }
}
