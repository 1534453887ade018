//! Read-only projections of finished graphs.
//!
//! - [`sequence`]: bounded depth-first trace from one entry method
//! - [`aggregate`]: weighted component (or class) edge listing
//!
//! Neither projection mutates its input graph.

pub mod aggregate;
pub mod sequence;

pub use aggregate::{AggregateOptions, AggregateView, ComponentNode, EdgeDetail, EdgeLabel, Granularity};
pub use sequence::{CallLine, ProjectionError, SequenceTrace, DEFAULT_MAX_DEPTH};
