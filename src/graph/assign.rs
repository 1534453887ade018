//! Component assignment policies.
//!
//! Each policy maps (class, declaring file) to a component label; the
//! [`ComponentGraph`](super::ComponentGraph) only ever sees the labels.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::component::ComponentAssigner;
use super::package_name::PackageNameCache;

/// Which assigner the `components` command uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentPolicy {
    #[default]
    TopSegment,
    PackageName,
}

fn canonical_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .map(|root| std::fs::canonicalize(root).unwrap_or_else(|_| root.clone()))
        .collect()
}

/// The deepest root that contains `file`.
fn owning_root<'r>(roots: &'r [PathBuf], file: &Path) -> Option<&'r Path> {
    roots
        .iter()
        .filter(|root| file.starts_with(root))
        .max_by_key(|root| root.components().count())
        .map(PathBuf::as_path)
}

/// First path segment under the source root.
///
/// `<root>/billing/src/Invoice.php` → `billing`. Files directly inside the
/// root belong to a component named after the root directory.
#[derive(Debug, Clone)]
pub struct TopSegment {
    roots: Vec<PathBuf>,
}

impl TopSegment {
    pub fn new(roots: &[PathBuf]) -> Self {
        Self {
            roots: canonical_roots(roots),
        }
    }

    fn segment(&self, file: &Path) -> Option<String> {
        let root = owning_root(&self.roots, file)?;
        let rel = file.strip_prefix(root).ok()?;
        let mut components = rel.components();
        let first = components.next()?;
        if components.next().is_none() {
            return root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        Some(first.as_os_str().to_string_lossy().into_owned())
    }
}

impl ComponentAssigner for TopSegment {
    fn component_for(&self, _class: &str, file: &Path) -> Option<String> {
        self.segment(file)
    }
}

/// Nearest `composer.json` name between the file's directory and its root.
/// Falls back to [`TopSegment`].
#[derive(Debug)]
pub struct PackageName {
    fallback: TopSegment,
    cache: Mutex<PackageNameCache>,
}

impl PackageName {
    pub fn new(roots: &[PathBuf], cache: PackageNameCache) -> Self {
        Self {
            fallback: TopSegment::new(roots),
            cache: Mutex::new(cache),
        }
    }

    /// Hand the cache back, e.g. to save it.
    pub fn into_cache(self) -> PackageNameCache {
        match self.cache.into_inner() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn package_of(&self, file: &Path) -> Option<String> {
        let root = owning_root(&self.fallback.roots, file)?;
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut dir = file.parent();
        while let Some(current) = dir {
            if let Some(name) = cache.lookup(current) {
                return Some(name);
            }
            if current == root {
                break;
            }
            dir = current.parent();
        }
        None
    }
}

impl ComponentAssigner for PackageName {
    fn component_for(&self, class: &str, file: &Path) -> Option<String> {
        self.package_of(file)
            .or_else(|| self.fallback.component_for(class, file))
    }
}

/// Every class is its own component.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerClass;

impl ComponentAssigner for PerClass {
    fn component_for(&self, class: &str, _file: &Path) -> Option<String> {
        Some(class.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_top_segment() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        let assigner = TopSegment::new(&[root.clone()]);

        assert_eq!(
            assigner.component_for("A", &root.join("billing/src/Invoice.php")),
            Some("billing".to_string())
        );
        let root_name = root.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(
            assigner.component_for("A", &root.join("Loose.php")),
            Some(root_name)
        );
        assert_eq!(assigner.component_for("A", Path::new("/elsewhere/X.php")), None);
    }

    #[test]
    fn test_package_name_with_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        fs::create_dir_all(root.join("billing/src/Model")).unwrap();
        fs::create_dir_all(root.join("api/src")).unwrap();
        fs::write(root.join("billing/composer.json"), r#"{"name": "acme/billing"}"#).unwrap();

        let assigner = PackageName::new(&[root.clone()], PackageNameCache::in_memory());
        assert_eq!(
            assigner.component_for("I", &root.join("billing/src/Model/Invoice.php")),
            Some("acme/billing".to_string())
        );
        assert_eq!(
            assigner.component_for("C", &root.join("api/src/Controller.php")),
            Some("api".to_string())
        );

        let cache = assigner.into_cache();
        assert_eq!(cache.get(&root.join("billing")), Some("acme/billing"));
    }

    #[test]
    fn test_per_class() {
        assert_eq!(
            PerClass.component_for("App\\A", Path::new("a.php")),
            Some("App\\A".to_string())
        );
    }
}
