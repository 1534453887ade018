//! Sequence projection: a depth-bounded call trace from one entry method.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::graph::{CallGraph, CallKind, CallTarget, MethodKey, MethodKeyParseError};

/// Depth used when the caller does not choose one.
pub const DEFAULT_MAX_DEPTH: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("entry point not found in call graph: {0}")]
    EntryNotFound(MethodKey),

    #[error(transparent)]
    MalformedKey(#[from] MethodKeyParseError),
}

/// One arrow in the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLine {
    pub from_class: String,
    pub to_class: String,
    /// Method name, or `name()` for a function call
    pub label: String,
    pub kind: CallKind,
    /// Depth of the calling method; the entry is depth 0
    pub depth: usize,
}

impl CallLine {
    pub fn is_self_call(&self) -> bool {
        self.from_class == self.to_class
    }
}

/// Participants and call lines reachable from one entry method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTrace {
    pub entry: MethodKey,
    pub max_depth: usize,
    /// Classes in first-touch order, entry class first
    pub participants: Vec<String>,
    /// Call lines in depth-first emission order
    pub lines: Vec<CallLine>,
}

impl SequenceTrace {
    fn touch(&mut self, class: &str) {
        if !self.participants.iter().any(|p| p == class) {
            self.participants.push(class.to_string());
        }
    }
}

/// Project the trace rooted at `entry`.
///
/// A method at depth `d` emits one line per outgoing edge. A target is
/// expanded only when it is a known method, has not been visited, and
/// `d + 1 < max_depth`. The visited set makes cycles terminate.
pub fn project(
    graph: &CallGraph,
    entry: &MethodKey,
    max_depth: usize,
) -> Result<SequenceTrace, ProjectionError> {
    if !graph.has_method(entry) {
        return Err(ProjectionError::EntryNotFound(entry.clone()));
    }

    let mut trace = SequenceTrace {
        entry: entry.clone(),
        max_depth,
        participants: vec![entry.class.clone()],
        lines: Vec::new(),
    };
    if max_depth == 0 {
        return Ok(trace);
    }

    let mut visited = HashSet::new();
    visited.insert(entry.clone());
    expand(graph, entry, 0, &mut visited, &mut trace);
    Ok(trace)
}

/// Parse `entry` as `Class::method` and project it.
pub fn project_str(
    graph: &CallGraph,
    entry: &str,
    max_depth: usize,
) -> Result<SequenceTrace, ProjectionError> {
    let key: MethodKey = entry.parse()?;
    project(graph, &key, max_depth)
}

fn expand(
    graph: &CallGraph,
    method: &MethodKey,
    depth: usize,
    visited: &mut HashSet<MethodKey>,
    trace: &mut SequenceTrace,
) {
    for edge in graph.calls_from(method) {
        match &edge.target {
            CallTarget::Method(target) => {
                trace.touch(&target.class);
                trace.lines.push(CallLine {
                    from_class: method.class.clone(),
                    to_class: target.class.clone(),
                    label: target.method.clone(),
                    kind: edge.kind,
                    depth,
                });
                if depth + 1 < trace.max_depth
                    && graph.has_method(target)
                    && visited.insert(target.clone())
                {
                    expand(graph, target, depth + 1, visited, trace);
                }
            }
            CallTarget::Unresolved(_) => {
                trace.lines.push(CallLine {
                    from_class: method.class.clone(),
                    to_class: method.class.clone(),
                    label: edge.target.to_string(),
                    kind: edge.kind,
                    depth,
                });
            }
        }
    }
}
