//! callmap: a static call-graph mapper for PHP source trees
//!
//! callmap parses PHP files with tree-sitter, infers receiver types from
//! assignments and declared field types, and builds an in-memory call graph.
//! Two read-only projections sit on top of it:
//!
//! - **Sequence**: a depth-bounded trace from one entry method, rendered as a
//!   sequence diagram.
//! - **Aggregate**: the call graph folded into components (directory,
//!   composer package, or class), with weighted edges between them.
//!
//! # Pipeline
//!
//! ```text
//! ScanConfig ──scan──> CallGraph ──sequence::project──> SequenceTrace
//!                          │
//!                          └──ComponentGraph::from_call_graph──> ComponentGraph
//!                                                    └──aggregate::project──> AggregateView
//! ```
//!
//! # Resolution
//!
//! Names resolve against the file's namespace and `use` imports. Calls on
//! receivers whose type cannot be inferred produce no edge; free function
//! calls are kept as unresolved targets.
//!
//! # Determinism
//!
//! Files are scanned in sorted order and partial results are reduced in that
//! order, so repeated runs over the same tree produce identical output
//! regardless of `--jobs`.

pub mod common;
pub mod config;
pub mod diagnostics;
pub mod graph;
pub mod ingest;
pub mod output;
pub mod projection;
pub mod version;

pub use config::{Config, ConfigError};
pub use diagnostics::{DiagnosticStage, ScanDiagnostic, SkipReason};
pub use graph::{
    scan, CallEdge, CallGraph, CallKind, CallTarget, ComponentGraph, MethodKey, ScanConfig,
    ScanError, ScanOutcome, Visibility, Weighting,
};
pub use ingest::{extract_file, ExtractError, FileFacts};
pub use output::OutputFormat;
pub use projection::{AggregateOptions, AggregateView, ProjectionError, SequenceTrace};
pub use version::version;
