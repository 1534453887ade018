//! Plain-text rendering for terminal output.

use std::fmt::Write;

use crate::output::ScanSummary;
use crate::projection::{AggregateView, SequenceTrace};

pub fn render_summary(summary: &ScanSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Scanned {} files: {} classes, {} methods, {} call edges",
        summary.files_scanned, summary.classes, summary.methods, summary.edges
    );
    for diagnostic in &summary.diagnostics {
        let _ = writeln!(out, "  {}", diagnostic);
    }
    out
}

/// Indented call tree, one line per call.
///
/// ```text
/// App\A::entry (depth 3)
///   App\A -> App\B : work
///     App\B -> App\B : strlen()
/// ```
pub fn render_sequence(trace: &SequenceTrace) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (depth {})", trace.entry, trace.max_depth);
    for line in &trace.lines {
        let indent = "  ".repeat(line.depth + 1);
        let _ = writeln!(
            out,
            "{}{} -> {} : {}",
            indent, line.from_class, line.to_class, line.label
        );
    }
    let _ = writeln!(out, "Participants: {}", trace.participants.join(", "));
    out
}

pub fn render_components(view: &AggregateView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Components ({}):", view.nodes.len());
    for node in &view.nodes {
        let _ = writeln!(out, "  {} ({} classes)", node.name, node.class_count);
    }

    let _ = writeln!(out, "Edges (total / unique):");
    for edge in &view.edges {
        let _ = writeln!(
            out,
            "  {} -> {} : {} / {}",
            edge.from, edge.to, edge.total, edge.unique
        );
        for call in &edge.calls {
            let _ = writeln!(out, "      {}", call);
        }
    }
    if view.truncated {
        let _ = writeln!(
            out,
            "  ... {} of {} edges shown",
            view.edges.len(),
            view.total_edges
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CallEdge, CallGraph, CallKind, CallTarget, MethodKey, Visibility};
    use crate::projection::sequence;

    #[test]
    fn test_render_sequence_indents_by_depth() {
        let key = |s: &str| -> MethodKey { s.parse().unwrap() };
        let mut graph = CallGraph::new();
        graph.add_method(key("A::entry"), Visibility::Public);
        graph.add_method(key("B::work"), Visibility::Public);
        graph.add_call(CallEdge::new(
            key("A::entry"),
            CallTarget::Method(key("B::work")),
            CallKind::Instance,
        ));
        graph.add_call(CallEdge::new(
            key("B::work"),
            CallTarget::Unresolved("strlen".to_string()),
            CallKind::Function,
        ));

        let text = render_sequence(&sequence::project(&graph, &key("A::entry"), 3).unwrap());
        assert_eq!(
            text,
            "A::entry (depth 3)\n  A -> B : work\n    B -> B : strlen()\nParticipants: A, B\n"
        );
    }
}
