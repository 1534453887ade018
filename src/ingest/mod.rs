//! Per-file extraction: PHP source in, declarations and call edges out.

pub mod php;
pub mod pool;
pub mod resolver;

pub use php::PhpCallExtractor;
pub use resolver::{ClassScope, FileScope, InferredType, MethodScope};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::graph::{CallEdge, MethodKey, Visibility};

/// Everything one PHP file contributes to the call graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    pub path: PathBuf,
    /// Fully-qualified names of declared class-likes, in source order
    pub classes: Vec<String>,
    /// Declared methods, in source order
    pub methods: Vec<(MethodKey, Visibility)>,
    /// Call edges, in evaluation order within each method
    pub calls: Vec<CallEdge>,
}

impl FileFacts {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to parse {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("PHP parser setup failed: {0}")]
    ParserSetup(String),
}

/// Parse one PHP file and extract its facts.
///
/// A file whose tree contains syntax errors is rejected as a whole; no
/// partial facts are returned.
pub fn extract_file(path: &Path, source: &[u8]) -> Result<FileFacts, ExtractError> {
    let tree = pool::with_parser(|parser| parser.parse(source, None))?.ok_or_else(|| {
        ExtractError::ParseFailed {
            path: path.to_path_buf(),
            reason: "parser returned no tree".to_string(),
        }
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(1);
        return Err(ExtractError::ParseFailed {
            path: path.to_path_buf(),
            reason: format!("syntax error near line {}", line),
        });
    }

    Ok(PhpCallExtractor::new(path, source).extract(root))
}

fn first_error_line(node: tree_sitter::Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_line)
}
