//! In-memory graphs built from a scan.
//!
//! - [`CallGraph`]: method nodes and call edges, one per scan
//! - [`ComponentGraph`]: the call graph folded to component granularity
//!
//! Scanning ([`scan`]) fills a call graph; assignment policies ([`assign`])
//! decide how it folds into components.

pub mod assign;
pub mod call_graph;
pub mod component;
pub mod filter;
pub mod package_name;
pub mod scan;

pub use assign::{ComponentPolicy, PackageName, PerClass, TopSegment};
pub use call_graph::{
    CallEdge, CallGraph, CallKind, CallTarget, MethodKey, MethodKeyParseError, Visibility,
    METHOD_SEPARATOR,
};
pub use component::{ComponentAssigner, ComponentGraph, EdgeStats, WeightedEdge, Weighting};
pub use filter::FileFilter;
pub use package_name::{detect_package_name, PackageCacheError, PackageNameCache, CACHE_DIR};
pub use scan::{scan, scan_directory, scan_with_progress, ScanConfig, ScanError, ScanOutcome, ScanProgress};
