//! Configuration loading from `callmap.toml`.
//!
//! Every key is optional; explicit CLI flags override file values.
//!
//! ## Example
//!
//! ```toml
//! src = ["services/billing", "services/api"]
//! exclude = ["*/tests/*", "*/vendor/*"]
//! jobs = 4
//! cache = true
//!
//! [sequence]
//! depth = 4
//! entries = ["App\\Http\\OrderController::store"]
//!
//! [components]
//! policy = "package-name"
//! weighting = "unique"
//! granularity = "component"
//! max-edges = 40
//! edge-label = "all"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::graph::{ComponentPolicy, Weighting};
use crate::projection::{EdgeDetail, EdgeLabel, Granularity};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "callmap.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Config file this was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub src: Vec<PathBuf>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub jobs: Option<usize>,
    pub cache: Option<bool>,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub components: ComponentsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SequenceConfig {
    pub depth: Option<usize>,
    #[serde(default)]
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ComponentsConfig {
    pub policy: Option<ComponentPolicy>,
    pub weighting: Option<Weighting>,
    pub granularity: Option<Granularity>,
    pub max_edges: Option<usize>,
    pub edge_label: Option<EdgeLabel>,
    pub edge_detail: Option<EdgeDetail>,
}

impl Config {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());

        // Relative source roots are relative to the config file.
        if let Some(base) = path.parent() {
            for root in &mut config.src {
                if root.is_relative() {
                    *root = base.join(&*root);
                }
            }
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// `callmap.toml` in `dir` if it exists, otherwise defaults.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading config");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}
