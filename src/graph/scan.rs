//! Source tree scanning.
//!
//! Enumerates PHP files under every source root, extracts each one on a
//! rayon pool, and reduces the per-worker partial graphs into one
//! [`CallGraph`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use super::call_graph::CallGraph;
use super::filter::FileFilter;
use super::package_name::PackageNameCache;
use crate::diagnostics::{DiagnosticStage, ScanDiagnostic, SkipReason};
use crate::ingest::pool::warmup_parser;
use crate::ingest::{extract_file, ExtractError};

/// Progress callback, receives (files done, files total).
pub type ScanProgress = dyn Fn(usize, usize) + Send + Sync;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source root does not exist or is not a directory: {0}")]
    MissingRoot(PathBuf),

    #[error("no source roots given")]
    NoRoots,

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("PHP parser unavailable: {0}")]
    Parser(#[source] ExtractError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What to scan and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub roots: Vec<PathBuf>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Worker threads; `None` uses rayon's default
    #[serde(default)]
    pub jobs: Option<usize>,
    /// Persist the package-name cache under the first root
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

impl ScanConfig {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            exclude: Vec::new(),
            jobs: None,
            use_cache: true,
        }
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Package-name cache for this scan: loaded from the first root when
    /// caching is enabled, otherwise an in-memory store.
    pub fn package_cache(&self) -> PackageNameCache {
        match self.roots.first() {
            Some(root) if self.use_cache => PackageNameCache::load(root),
            _ => PackageNameCache::in_memory(),
        }
    }

    /// Fail before any work if a root is missing.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.roots.is_empty() {
            return Err(ScanError::NoRoots);
        }
        for root in &self.roots {
            if !root.is_dir() {
                return Err(ScanError::MissingRoot(root.clone()));
            }
        }
        Ok(())
    }
}

/// Result of a scan: the merged graph plus everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub graph: CallGraph,
    /// Sorted (path, errors first) after a full scan
    pub diagnostics: Vec<ScanDiagnostic>,
    pub files_scanned: usize,
}

impl ScanOutcome {
    /// Combine two partial outcomes. `self` precedes `other`.
    pub fn merge(mut self, other: ScanOutcome) -> ScanOutcome {
        self.graph = self.graph.merge(other.graph);
        self.diagnostics.extend(other.diagnostics);
        self.files_scanned += other.files_scanned;
        self
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// One file queued for extraction.
struct SourceFile {
    path: PathBuf,
    display: String,
}

/// Scan every root in `config` into one call graph.
///
/// # Guarantees
/// - Missing roots fail with [`ScanError::MissingRoot`] before any file is read
/// - Files are dispatched in sorted order and reduced in that order, so the
///   result does not depend on thread scheduling
/// - Unreadable or unparsable files become diagnostics; the rest still scan
pub fn scan(config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
    scan_with_progress(config, None)
}

pub fn scan_with_progress(
    config: &ScanConfig,
    progress: Option<&ScanProgress>,
) -> Result<ScanOutcome, ScanError> {
    config.validate()?;
    warmup_parser().map_err(ScanError::Parser)?;

    let mut skipped = Vec::new();
    let mut files = Vec::new();
    for root in &config.roots {
        let filter = FileFilter::new(root, &config.exclude)?;
        collect_files(&filter, &mut files, &mut skipped)?;
    }

    let total = files.len();
    tracing::info!(roots = config.roots.len(), files = total, "scanning PHP sources");

    let done = AtomicUsize::new(0);
    let run = || {
        files
            .par_iter()
            .fold(ScanOutcome::default, |acc, file| {
                let partial = scan_file(file);
                if let Some(cb) = progress {
                    cb(done.fetch_add(1, Ordering::Relaxed) + 1, total);
                }
                acc.merge(partial)
            })
            .reduce(ScanOutcome::default, ScanOutcome::merge)
    };

    let mut outcome = match config.jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()?
            .install(run),
        None => run(),
    };

    outcome.diagnostics.extend(skipped);
    outcome.diagnostics.sort();

    tracing::info!(
        files = outcome.files_scanned,
        classes = outcome.graph.class_count(),
        methods = outcome.graph.method_count(),
        edges = outcome.graph.edge_count(),
        errors = outcome.error_count(),
        "scan complete"
    );
    Ok(outcome)
}

/// Walk one root, queueing PHP files in sorted order.
fn collect_files(
    filter: &FileFilter,
    files: &mut Vec<SourceFile>,
    skipped: &mut Vec<ScanDiagnostic>,
) -> Result<(), ScanError> {
    let mut found = Vec::new();
    for entry in walkdir::WalkDir::new(filter.root())
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: filter.root().to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        match filter.should_skip(path) {
            None => found.push(path.to_path_buf()),
            Some(SkipReason::NotPhp) | Some(SkipReason::NotAFile) => {}
            Some(reason) => {
                tracing::debug!(path = %path.display(), %reason, "skipping file");
                skipped.push(filter.skip_diagnostic(path, reason));
            }
        }
    }
    found.sort();
    files.extend(found.into_iter().map(|path| SourceFile {
        display: filter.relative_path(&path),
        path,
    }));
    Ok(())
}

fn scan_file(file: &SourceFile) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    let source = match std::fs::read(&file.path) {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(path = %file.display, error = %err, "skipping unreadable file");
            outcome.diagnostics.push(ScanDiagnostic::error(
                file.display.clone(),
                DiagnosticStage::Read,
                err.to_string(),
            ));
            return outcome;
        }
    };

    match extract_file(&file.path, &source) {
        Ok(facts) => {
            tracing::debug!(
                path = %file.display,
                classes = facts.classes.len(),
                methods = facts.methods.len(),
                calls = facts.calls.len(),
                "extracted"
            );
            outcome.graph.add_file_facts(facts);
            outcome.files_scanned = 1;
        }
        Err(err) => {
            tracing::warn!(path = %file.display, error = %err, "skipping file that failed to parse");
            outcome.diagnostics.push(ScanDiagnostic::error(
                file.display.clone(),
                DiagnosticStage::Parse,
                err.to_string(),
            ));
        }
    }
    outcome
}

/// Scan a single directory with default settings.
pub fn scan_directory(dir: &Path) -> Result<ScanOutcome, ScanError> {
    scan(&ScanConfig::new(vec![dir.to_path_buf()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_fails_before_scanning() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().to_path_buf();
        let missing = temp_dir.path().join("nope");
        fs::write(present.join("A.php"), "<?php class A {}").unwrap();

        let config = ScanConfig::new(vec![present, missing.clone()]);
        match scan(&config) {
            Err(ScanError::MissingRoot(path)) => assert_eq!(path, missing),
            other => panic!("expected MissingRoot, got {:?}", other.map(|o| o.files_scanned)),
        }
    }

    #[test]
    fn test_no_roots() {
        assert!(matches!(scan(&ScanConfig::default()), Err(ScanError::NoRoots)));
    }

    #[test]
    fn test_parse_failure_is_a_diagnostic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Good.php"), "<?php class Good { public function a() {} }").unwrap();
        fs::write(root.join("Bad.php"), "<?php class Bad { public function ( }").unwrap();
        fs::write(root.join("notes.txt"), "not php").unwrap();

        let outcome = scan_directory(root).unwrap();
        assert_eq!(outcome.files_scanned, 1);
        assert_eq!(outcome.graph.method_count(), 1);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].path(), "Bad.php");
        assert!(outcome.diagnostics[0].is_error());
    }

    #[test]
    fn test_jobs_do_not_change_result() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for i in 0..8 {
            fs::write(
                root.join(format!("C{i}.php")),
                format!(
                    "<?php class C{i} {{ public function run() {{ $n = new C{next}(); $n->run(); }} }}",
                    next = (i + 1) % 8
                ),
            )
            .unwrap();
        }

        let serial = scan(&ScanConfig::new(vec![root.to_path_buf()]).with_jobs(Some(1))).unwrap();
        let parallel = scan(&ScanConfig::new(vec![root.to_path_buf()]).with_jobs(Some(4))).unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(serial.graph.edge_count(), 16);
    }

    #[test]
    fn test_excluded_php_file_reported() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(root.join("tests/ATest.php"), "<?php class ATest {}").unwrap();
        fs::write(root.join("A.php"), "<?php class A {}").unwrap();

        let config =
            ScanConfig::new(vec![root.to_path_buf()]).with_exclude(vec!["tests/**".to_string()]);
        let outcome = scan(&config).unwrap();
        assert_eq!(outcome.graph.class_count(), 1);
        assert_eq!(
            outcome.diagnostics,
            vec![ScanDiagnostic::skipped(
                "tests/ATest.php".to_string(),
                SkipReason::ExcludedByGlob
            )]
        );
    }
}
