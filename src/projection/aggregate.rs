//! Aggregate projection: weighted component edges, independent of any entry.

use serde::{Deserialize, Serialize};

use crate::graph::{ComponentGraph, WeightedEdge, Weighting};

/// Level the call graph was folded to before projecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Component,
    Class,
}

/// Text placed on a component edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeLabel {
    /// The edge weight
    #[default]
    Counts,
    /// The method pairs behind the edge
    Names,
    /// Weight followed by the method pairs
    All,
}

/// One arrow per component pair, or one arrow per distinct method pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDetail {
    #[default]
    Aggregate,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateOptions {
    pub granularity: Granularity,
    pub weighting: Weighting,
    /// Keep only the heaviest N edges
    pub max_edges: Option<usize>,
    pub labels: EdgeLabel,
    pub detail: EdgeDetail,
}

impl AggregateOptions {
    fn wants_calls(&self) -> bool {
        self.labels != EdgeLabel::Counts || self.detail == EdgeDetail::All
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub name: String,
    pub class_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateView {
    pub granularity: Granularity,
    pub weighting: Weighting,
    pub labels: EdgeLabel,
    pub detail: EdgeDetail,
    /// Sorted by name
    pub nodes: Vec<ComponentNode>,
    /// Heaviest first, ties by (from, to)
    pub edges: Vec<WeightedEdge>,
    /// Edge count before truncation
    pub total_edges: usize,
    pub truncated: bool,
}

pub fn project(graph: &ComponentGraph, options: &AggregateOptions) -> AggregateView {
    let nodes = graph
        .components()
        .into_iter()
        .map(|name| ComponentNode {
            name: name.to_string(),
            class_count: graph.class_count(name),
        })
        .collect();

    let total_edges = graph.edge_count();
    let mut edges = graph.top_edges(options.weighting, options.max_edges);
    if options.wants_calls() {
        for edge in &mut edges {
            if let Some(stats) = graph.edge_stats(&edge.from, &edge.to) {
                edge.calls = stats
                    .signatures()
                    .map(|(from, to)| format!("{} -> {}", from, to))
                    .collect();
            }
        }
    }

    AggregateView {
        granularity: options.granularity,
        weighting: options.weighting,
        labels: options.labels,
        detail: options.detail,
        nodes,
        truncated: edges.len() < total_edges,
        edges,
        total_edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MethodKey;

    fn key(s: &str) -> MethodKey {
        s.parse().unwrap()
    }

    fn sample() -> ComponentGraph {
        let mut graph = ComponentGraph::new();
        graph.add_member("web", "Web\\Controller");
        graph.add_member("api", "Api\\Client");
        graph.add_member("api", "Api\\Server");
        graph.add_member("db", "Db\\Conn");
        graph.add_call("web", "api", key("Web\\Controller::a"), key("Api\\Client::x"));
        graph.add_call("web", "api", key("Web\\Controller::a"), key("Api\\Client::x"));
        graph.add_call("api", "db", key("Api\\Server::q"), key("Db\\Conn::run"));
        graph
    }

    #[test]
    fn test_nodes_sorted_with_class_counts() {
        let view = project(&sample(), &AggregateOptions::default());
        let nodes: Vec<(&str, usize)> = view
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n.class_count))
            .collect();
        assert_eq!(nodes, vec![("api", 2), ("db", 1), ("web", 1)]);
        assert!(!view.truncated);
        assert_eq!(view.edges[0].from, "web");
        assert_eq!(view.edges[0].weight, 2);
    }

    #[test]
    fn test_truncation_flag() {
        let options = AggregateOptions {
            max_edges: Some(1),
            ..Default::default()
        };
        let view = project(&sample(), &options);
        assert_eq!(view.edges.len(), 1);
        assert_eq!(view.total_edges, 2);
        assert!(view.truncated);
    }

    #[test]
    fn test_unique_weighting() {
        let options = AggregateOptions {
            weighting: Weighting::Unique,
            ..Default::default()
        };
        let view = project(&sample(), &options);
        assert!(view.edges.iter().all(|e| e.weight == 1));
        assert_eq!(view.edges[0].from, "api");
    }

    #[test]
    fn test_method_pairs_only_when_labelled_by_name() {
        let counts = project(&sample(), &AggregateOptions::default());
        assert!(counts.edges.iter().all(|e| e.calls.is_empty()));

        let options = AggregateOptions {
            labels: EdgeLabel::Names,
            ..Default::default()
        };
        let view = project(&sample(), &options);
        assert_eq!(view.labels, EdgeLabel::Names);
        assert_eq!(
            view.edges[0].calls,
            vec!["Web\\Controller::a -> Api\\Client::x"]
        );

        let options = AggregateOptions {
            detail: EdgeDetail::All,
            ..Default::default()
        };
        let view = project(&sample(), &options);
        assert_eq!(view.edges[1].calls, vec!["Api\\Server::q -> Db\\Conn::run"]);
    }
}
