//! File filtering for gitignore-style rules and `--exclude` globs.
//!
//! Precedence:
//! 1. Hard internal ignores (.git/, node_modules/, the callmap cache)
//! 2. Gitignore-style rules (.gitignore, .ignore)
//! 3. `--exclude` globs
//! 4. Only `.php` files pass
//!
//! Same inputs always produce the same decision.

use ignore::gitignore::Gitignore;
use std::path::{Path, PathBuf};

use crate::common::relative_to;
use crate::diagnostics::{ScanDiagnostic, SkipReason};
use crate::graph::package_name::CACHE_DIR;
use crate::graph::ScanError;

/// Directories that are always ignored.
const INTERNAL_IGNORE_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules", CACHE_DIR];

const PHP_EXTENSION: &str = "php";

/// Filtering state for one source root.
pub struct FileFilter {
    root: PathBuf,
    gitignore: Option<Gitignore>,
    exclude_patterns: Vec<globset::GlobMatcher>,
}

impl FileFilter {
    /// Build a filter for `root`.
    ///
    /// Exclude globs are matched against both the root-relative path and the
    /// full path, so `*/tests/*` and `tests/**` both work.
    pub fn new(root: &Path, exclude_patterns: &[String]) -> Result<Self, ScanError> {
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let gitignore = Self::load_gitignore(&root);
        let exclude_patterns = Self::compile_globs(exclude_patterns)?;

        Ok(Self {
            root,
            gitignore,
            exclude_patterns,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_gitignore(root: &Path) -> Option<Gitignore> {
        let mut builder = ignore::gitignore::GitignoreBuilder::new(root);
        for name in [".gitignore", ".ignore"] {
            let path = root.join(name);
            if path.exists() {
                if let Some(err) = builder.add(&path) {
                    tracing::warn!(path = %path.display(), error = %err, "failed to load ignore file");
                }
            }
        }
        match builder.build() {
            Ok(gitignore) => Some(gitignore),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed ignore rules");
                None
            }
        }
    }

    fn compile_globs(patterns: &[String]) -> Result<Vec<globset::GlobMatcher>, ScanError> {
        patterns
            .iter()
            .map(|pattern| {
                globset::Glob::new(pattern)
                    .map(|glob| glob.compile_matcher())
                    .map_err(|source| ScanError::InvalidGlob {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// `None` if the file should be scanned, otherwise why not.
    pub fn should_skip(&self, path: &Path) -> Option<SkipReason> {
        if !path.is_file() {
            return Some(SkipReason::NotAFile);
        }

        if self.is_internal_ignore(path) {
            return Some(SkipReason::IgnoredInternal);
        }

        if let (Some(gitignore), Ok(rel)) = (&self.gitignore, path.strip_prefix(&self.root)) {
            if gitignore.matched_path_or_any_parents(rel, false).is_ignore() {
                return Some(SkipReason::IgnoredByGitignore);
            }
        }

        if !self.exclude_patterns.is_empty() {
            let rel = self.relative_path(path);
            let full = path.to_string_lossy().replace('\\', "/");
            if self
                .exclude_patterns
                .iter()
                .any(|m| m.is_match(&rel) || m.is_match(&full))
            {
                return Some(SkipReason::ExcludedByGlob);
            }
        }

        let is_php = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(PHP_EXTENSION));
        if !is_php {
            return Some(SkipReason::NotPhp);
        }

        None
    }

    fn is_internal_ignore(&self, path: &Path) -> bool {
        relative_to(path, &self.root).components().any(|component| {
            matches!(component, std::path::Component::Normal(dir)
                if INTERNAL_IGNORE_DIRS.contains(&dir.to_string_lossy().as_ref()))
        })
    }

    /// Root-relative path with forward slashes.
    pub fn relative_path(&self, path: &Path) -> String {
        relative_to(path, &self.root)
            .to_string_lossy()
            .replace('\\', "/")
    }

    pub fn skip_diagnostic(&self, path: &Path, reason: SkipReason) -> ScanDiagnostic {
        ScanDiagnostic::skipped(self.relative_path(path), reason)
    }
}
