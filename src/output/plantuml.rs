//! PlantUML rendering of projections.
//!
//! Participants and components are referenced through short aliases derived
//! from a SHA-256 digest of their name, so any PHP class name or package
//! name yields a valid PlantUML identifier and the same name always gets
//! the same alias.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::Write;

use crate::graph::{CallGraph, CallKind, Visibility, WeightedEdge};
use crate::projection::{AggregateView, EdgeDetail, EdgeLabel, SequenceTrace};

/// Stable PlantUML identifier for `name`: `P` + first 4 digest bytes in hex.
pub fn alias(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    format!("P{}", hex::encode(&digest[..4]))
}

fn visibility_symbol(visibility: Visibility) -> char {
    match visibility {
        Visibility::Public => '+',
        Visibility::Protected => '#',
        Visibility::Private => '-',
    }
}

fn escape(label: &str) -> String {
    label.replace('"', "'")
}

/// Sequence diagram for one trace.
///
/// When `graph` is given, each participant gets a note listing the methods
/// the trace touched on it with their visibility.
pub fn render_sequence(trace: &SequenceTrace, graph: Option<&CallGraph>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "@startuml");
    let _ = writeln!(out, "title {}", trace.entry);
    let _ = writeln!(out, "autonumber");

    for participant in &trace.participants {
        let _ = writeln!(
            out,
            "participant \"{}\" as {} << (C,#ADD1B2) >>",
            escape(participant),
            alias(participant)
        );
    }

    if let Some(graph) = graph {
        for participant in &trace.participants {
            let mut touched: Vec<String> = trace
                .lines
                .iter()
                .filter(|l| &l.to_class == participant && l.kind != CallKind::Function)
                .map(|l| l.label.clone())
                .collect();
            if participant == &trace.entry.class {
                touched.insert(0, trace.entry.method.clone());
            }
            let mut seen = HashSet::new();
            touched.retain(|method| seen.insert(method.clone()));
            let members: Vec<String> = touched
                .into_iter()
                .filter_map(|method| {
                    let key = crate::graph::MethodKey::new(participant.clone(), method.clone());
                    graph
                        .visibility(&key)
                        .map(|v| format!("{}{}()", visibility_symbol(v), method))
                })
                .collect();
            if !members.is_empty() {
                let _ = writeln!(
                    out,
                    "note over {} : {}",
                    alias(participant),
                    members.join("\\n")
                );
            }
        }
    }

    for line in &trace.lines {
        let arrow = match line.kind {
            CallKind::Constructor => "-->",
            _ => "->",
        };
        let _ = writeln!(
            out,
            "{} {} {} : {}",
            alias(&line.from_class),
            arrow,
            alias(&line.to_class),
            escape(&line.label)
        );
    }

    let _ = writeln!(out, "@enduml");
    out
}

fn edge_label(edge: &WeightedEdge, labels: EdgeLabel) -> String {
    let calls = edge.calls.iter().map(|c| escape(c));
    match labels {
        EdgeLabel::Counts => edge.weight.to_string(),
        EdgeLabel::Names => calls.collect::<Vec<_>>().join("\\n"),
        EdgeLabel::All => std::iter::once(edge.weight.to_string())
            .chain(calls)
            .collect::<Vec<_>>()
            .join("\\n"),
    }
}

/// Component diagram for an aggregate view.
pub fn render_components(view: &AggregateView, title: &str, caption: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "@startuml");
    if !title.is_empty() {
        let _ = writeln!(out, "title {}", title);
    }

    for node in &view.nodes {
        let _ = writeln!(
            out,
            "component \"{}\\n({} classes)\" as {}",
            escape(&node.name),
            node.class_count,
            alias(&node.name)
        );
    }
    let _ = writeln!(out);

    for edge in &view.edges {
        let (from, to) = (alias(&edge.from), alias(&edge.to));
        match view.detail {
            EdgeDetail::Aggregate => {
                let _ = writeln!(out, "{} --> {} : {}", from, to, edge_label(edge, view.labels));
            }
            EdgeDetail::All => {
                for call in &edge.calls {
                    match view.labels {
                        EdgeLabel::Counts => {
                            let _ = writeln!(out, "{} --> {}", from, to);
                        }
                        EdgeLabel::Names | EdgeLabel::All => {
                            let _ = writeln!(out, "{} --> {} : {}", from, to, escape(call));
                        }
                    }
                }
            }
        }
    }

    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "caption {}", caption);
    }
    let _ = writeln!(out, "@enduml");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CallEdge, CallTarget, ComponentGraph, MethodKey, Weighting};
    use crate::projection::{aggregate, sequence, AggregateOptions};

    fn key(s: &str) -> MethodKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_alias_is_stable_and_identifier_safe() {
        let a = alias("App\\Service\\A");
        assert_eq!(a, alias("App\\Service\\A"));
        assert_ne!(a, alias("App\\Service\\B"));
        assert_eq!(a.len(), 9);
        assert!(a.starts_with('P'));
        assert!(a[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_render_sequence() {
        let mut graph = CallGraph::new();
        graph.add_method(key("A::entry"), Visibility::Public);
        graph.add_method(key("B::work"), Visibility::Protected);
        graph.add_call(CallEdge::new(
            key("A::entry"),
            CallTarget::Method(key("B::work")),
            CallKind::Instance,
        ));
        let trace = sequence::project(&graph, &key("A::entry"), 2).unwrap();
        let uml = render_sequence(&trace, Some(&graph));

        assert!(uml.starts_with("@startuml\n"));
        assert!(uml.trim_end().ends_with("@enduml"));
        assert!(uml.contains(&format!("participant \"A\" as {}", alias("A"))));
        assert!(uml.contains(&format!("{} -> {} : work", alias("A"), alias("B"))));
        assert!(uml.contains(&format!("note over {} : #work()", alias("B"))));
        assert!(uml.contains(&format!("note over {} : +entry()", alias("A"))));
    }

    #[test]
    fn test_participant_note_lists_each_method_once() {
        let mut graph = CallGraph::new();
        graph.add_method(key("A::entry"), Visibility::Public);
        graph.add_method(key("B::work"), Visibility::Public);
        graph.add_method(key("B::other"), Visibility::Private);
        for target in ["B::work", "B::other", "B::work"] {
            graph.add_call(CallEdge::new(
                key("A::entry"),
                CallTarget::Method(key(target)),
                CallKind::Instance,
            ));
        }
        let trace = sequence::project(&graph, &key("A::entry"), 2).unwrap();
        let uml = render_sequence(&trace, Some(&graph));
        assert!(uml.contains(&format!("note over {} : +work()\\n-other()\n", alias("B"))));
    }

    fn labelled_view(labels: EdgeLabel, detail: EdgeDetail) -> AggregateView {
        let mut graph = ComponentGraph::new();
        graph.add_member("web", "W");
        graph.add_member("api", "Api");
        graph.add_call("web", "api", key("W::a"), key("Api::x"));
        graph.add_call("web", "api", key("W::a"), key("Api::x"));
        graph.add_call("web", "api", key("W::b"), key("Api::y"));
        aggregate::project(
            &graph,
            &AggregateOptions {
                labels,
                detail,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_component_edge_labels() {
        let arrow = format!("{} --> {}", alias("web"), alias("api"));

        let uml = render_components(&labelled_view(EdgeLabel::Names, EdgeDetail::Aggregate), "", None);
        assert!(uml.contains(&format!("{} : W::a -> Api::x\\nW::b -> Api::y\n", arrow)));

        let uml = render_components(&labelled_view(EdgeLabel::All, EdgeDetail::Aggregate), "", None);
        assert!(uml.contains(&format!("{} : 3\\nW::a -> Api::x\\nW::b -> Api::y\n", arrow)));

        let uml = render_components(&labelled_view(EdgeLabel::Names, EdgeDetail::All), "", None);
        assert!(uml.contains(&format!("{} : W::a -> Api::x\n", arrow)));
        assert!(uml.contains(&format!("{} : W::b -> Api::y\n", arrow)));

        let uml = render_components(&labelled_view(EdgeLabel::Counts, EdgeDetail::All), "", None);
        assert_eq!(uml.matches(&format!("{}\n", arrow)).count(), 2);
    }

    #[test]
    fn test_render_components() {
        let mut graph = ComponentGraph::new();
        graph.add_member("web", "W");
        graph.add_member("api", "Api");
        graph.add_call("web", "api", key("W::a"), key("Api::x"));
        let view = aggregate::project(
            &graph,
            &AggregateOptions {
                weighting: Weighting::Total,
                ..Default::default()
            },
        );
        let uml = render_components(&view, "System", Some("1 edge"));
        assert!(uml.contains("title System"));
        assert!(uml.contains(&format!("component \"web\\n(1 classes)\" as {}", alias("web"))));
        assert!(uml.contains(&format!("{} --> {} : 1", alias("web"), alias("api"))));
        assert!(uml.contains("caption 1 edge"));
    }
}
