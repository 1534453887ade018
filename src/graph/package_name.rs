//! Composer package name detection and its on-disk lookaside cache.
//!
//! # Detection Strategy
//!
//! 1. Read `name` from `composer.json` in the directory
//! 2. No file, unreadable file, or no `name` key: no package
//!
//! Detected names are memoised per directory in [`PackageNameCache`], which
//! persists as pretty JSON under `<root>/.callmap-cache/package_names.json`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cache directory created under a source root.
pub const CACHE_DIR: &str = ".callmap-cache";

const CACHE_FILE: &str = "package_names.json";
const MANIFEST: &str = "composer.json";

#[derive(Debug, Error)]
pub enum PackageCacheError {
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize package cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct ComposerManifest {
    name: Option<String>,
}

/// Package name declared by `dir/composer.json`, if any.
pub fn detect_package_name(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join(MANIFEST)).ok()?;
    parse_composer_name(&content)
}

fn parse_composer_name(content: &str) -> Option<String> {
    let manifest: ComposerManifest = serde_json::from_str(content).ok()?;
    manifest
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Directory → package name store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageNameCache {
    cache_file: Option<PathBuf>,
    names: BTreeMap<String, String>,
}

impl PackageNameCache {
    /// In-memory cache that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache stored under `root`. A missing or corrupt file yields
    /// an empty cache.
    pub fn load(root: &Path) -> Self {
        let cache_file = root.join(CACHE_DIR).join(CACHE_FILE);
        let names = match fs::read_to_string(&cache_file) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!(path = %cache_file.display(), error = %err, "discarding corrupt package cache");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            cache_file: Some(cache_file),
            names,
        }
    }

    /// Write the cache back to disk. No-op for in-memory caches.
    pub fn save(&self) -> Result<(), PackageCacheError> {
        let Some(cache_file) = &self.cache_file else {
            return Ok(());
        };
        if let Some(dir) = cache_file.parent() {
            fs::create_dir_all(dir).map_err(|source| PackageCacheError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.names)?;
        fs::write(cache_file, json).map_err(|source| PackageCacheError::Write {
            path: cache_file.clone(),
            source,
        })
    }

    pub fn get(&self, dir: &Path) -> Option<&str> {
        self.names.get(&key(dir)).map(String::as_str)
    }

    pub fn set(&mut self, dir: &Path, name: impl Into<String>) {
        self.names.insert(key(dir), name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Cached name for `dir`, falling back to reading its manifest.
    pub fn lookup(&mut self, dir: &Path) -> Option<String> {
        if let Some(name) = self.get(dir) {
            return Some(name.to_string());
        }
        let name = detect_package_name(dir)?;
        self.set(dir, name.clone());
        Some(name)
    }
}

fn key(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}
