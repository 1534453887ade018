//! Component graph
//!
//! Groups classes into coarser components and keeps, per ordered component
//! pair, the number of folded call facts and the set of distinct
//! (fromMethod, toMethod) signatures.
//!
//! The graph itself performs no path or namespace logic. Membership comes from
//! a [`ComponentAssigner`] (see [`crate::graph::assign`]) or from explicit
//! `add_member` calls.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::call_graph::{CallGraph, MethodKey};

/// Maps a class (and the file declaring it) to a component label.
pub trait ComponentAssigner {
    fn component_for(&self, class: &str, file: &Path) -> Option<String>;
}

/// Weighting applied to aggregated edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Every folded call fact counts
    #[default]
    Total,
    /// Distinct (fromMethod, toMethod) signatures count once
    Unique,
}

/// Counters for one (from, to) component pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeStats {
    total: usize,
    signatures: BTreeSet<(MethodKey, MethodKey)>,
}

impl EdgeStats {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn unique(&self) -> usize {
        self.signatures.len()
    }

    /// Distinct (fromMethod, toMethod) pairs, ordered.
    pub fn signatures(&self) -> impl Iterator<Item = &(MethodKey, MethodKey)> + '_ {
        self.signatures.iter()
    }

    pub fn weight(&self, weighting: Weighting) -> usize {
        match weighting {
            Weighting::Total => self.total(),
            Weighting::Unique => self.unique(),
        }
    }

    fn record(&mut self, from_method: MethodKey, to_method: MethodKey) {
        self.total += 1;
        self.signatures.insert((from_method, to_method));
    }

    fn absorb(&mut self, other: EdgeStats) {
        self.total += other.total;
        self.signatures.extend(other.signatures);
    }
}

/// An aggregated edge ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub from: String,
    pub to: String,
    pub weight: usize,
    pub total: usize,
    pub unique: usize,
    /// `from -> to` method pairs; filled only when a label mode asks for them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<String>,
}

/// Per-component class sets and per-pair call statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentGraph {
    members: BTreeMap<String, BTreeSet<String>>,
    edges: BTreeMap<(String, String), EdgeStats>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component that may own no classes.
    pub fn add_component(&mut self, component: impl Into<String>) {
        self.members.entry(component.into()).or_default();
    }

    /// Record that `class` belongs to `component`. Re-adding is a no-op.
    pub fn add_member(&mut self, component: impl Into<String>, class: impl Into<String>) {
        self.members
            .entry(component.into())
            .or_default()
            .insert(class.into());
    }

    /// Record one call fact between two components.
    pub fn add_call(
        &mut self,
        from_component: &str,
        to_component: &str,
        from_method: MethodKey,
        to_method: MethodKey,
    ) {
        self.add_component(from_component);
        self.add_component(to_component);
        self.edges
            .entry((from_component.to_string(), to_component.to_string()))
            .or_default()
            .record(from_method, to_method);
    }

    /// Fold a call graph using `assigner` for component membership.
    ///
    /// Edges whose source or target class has no component (functions,
    /// classes outside the scanned tree) are not folded.
    pub fn from_call_graph<A: ComponentAssigner + ?Sized>(graph: &CallGraph, assigner: &A) -> Self {
        let mut components = ComponentGraph::new();
        let mut class_component: BTreeMap<&str, String> = BTreeMap::new();

        for (class, file) in graph.classes() {
            if let Some(component) = assigner.component_for(class, file) {
                components.add_member(component.clone(), class.clone());
                class_component.insert(class.as_str(), component);
            }
        }

        for edge in graph.all_edges() {
            let Some(target) = edge.target.as_method() else {
                continue;
            };
            let (Some(from), Some(to)) = (
                class_component.get(edge.source.class.as_str()),
                class_component.get(target.class.as_str()),
            ) else {
                continue;
            };
            components.add_call(from, to, edge.source.clone(), target.clone());
        }

        components
    }

    /// Component names in lexical order.
    pub fn components(&self) -> Vec<&str> {
        self.members.keys().map(String::as_str).collect()
    }

    pub fn class_count(&self, component: &str) -> usize {
        self.members.get(component).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn classes_of(&self, component: &str) -> Option<&BTreeSet<String>> {
        self.members.get(component)
    }

    pub fn edge_stats(&self, from: &str, to: &str) -> Option<&EdgeStats> {
        self.edges.get(&(from.to_string(), to.to_string()))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Aggregated edges, heaviest first, ties by (from, to).
    pub fn weighted_edges(&self, weighting: Weighting) -> Vec<WeightedEdge> {
        let mut edges: Vec<WeightedEdge> = self
            .edges
            .iter()
            .map(|((from, to), stats)| WeightedEdge {
                from: from.clone(),
                to: to.clone(),
                weight: stats.weight(weighting),
                total: stats.total(),
                unique: stats.unique(),
                calls: Vec::new(),
            })
            .collect();
        edges.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| a.from.cmp(&b.from))
                .then_with(|| a.to.cmp(&b.to))
        });
        edges
    }

    /// The first `max` edges of [`weighted_edges`](Self::weighted_edges).
    /// `None` keeps every edge. Dropped edges are not bucketed.
    pub fn top_edges(&self, weighting: Weighting, max: Option<usize>) -> Vec<WeightedEdge> {
        let mut edges = self.weighted_edges(weighting);
        if let Some(max) = max {
            edges.truncate(max);
        }
        edges
    }

    /// Drill-down view: `component`, every component it talks to (either
    /// direction) with their class sets, and only the edges touching it.
    pub fn subgraph_for(&self, component: &str) -> ComponentGraph {
        let mut sub = ComponentGraph::new();
        sub.add_component(component);
        if let Some(classes) = self.members.get(component) {
            sub.members.insert(component.to_string(), classes.clone());
        }
        for ((from, to), stats) in &self.edges {
            if from != component && to != component {
                continue;
            }
            for name in [from, to] {
                let classes = self.members.get(name).cloned().unwrap_or_default();
                sub.members.insert(name.clone(), classes);
            }
            sub.edges.insert((from.clone(), to.clone()), stats.clone());
        }
        sub
    }

    /// Merge another component graph into this one. Class sets are unioned,
    /// totals add up, signature sets are unioned.
    pub fn merge(mut self, other: ComponentGraph) -> ComponentGraph {
        for (component, classes) in other.members {
            self.members.entry(component).or_default().extend(classes);
        }
        for (pair, stats) in other.edges {
            self.edges.entry(pair).or_default().absorb(stats);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MethodKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_class_membership_is_a_set() {
        let mut graph = ComponentGraph::new();
        graph.add_member("billing", "Billing\\Invoice");
        graph.add_member("billing", "Billing\\Invoice");
        graph.add_member("billing", "Billing\\Payment");
        graph.add_component("empty");

        assert_eq!(graph.class_count("billing"), 2);
        assert_eq!(graph.class_count("empty"), 0);
        assert_eq!(graph.class_count("missing"), 0);
        assert_eq!(graph.components(), vec!["billing", "empty"]);
    }

    #[test]
    fn test_total_and_unique_counts() {
        let mut graph = ComponentGraph::new();
        graph.add_call("web", "api", key("W::a"), key("Api::x"));
        graph.add_call("web", "api", key("W::a"), key("Api::x"));
        graph.add_call("web", "api", key("W::b"), key("Api::x"));

        let stats = graph.edge_stats("web", "api").unwrap();
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.unique(), 2);
        let pairs: Vec<String> = stats
            .signatures()
            .map(|(from, to)| format!("{} -> {}", from, to))
            .collect();
        assert_eq!(pairs, vec!["W::a -> Api::x", "W::b -> Api::x"]);
        assert!(graph.edge_stats("api", "web").is_none());
    }

    #[test]
    fn test_ordering_and_truncation() {
        let mut graph = ComponentGraph::new();
        graph.add_call("b", "c", key("B::x"), key("C::y"));
        graph.add_call("a", "c", key("A::x"), key("C::y"));
        for _ in 0..3 {
            graph.add_call("z", "a", key("Z::x"), key("A::y"));
        }

        let all = graph.weighted_edges(Weighting::Total);
        let pairs: Vec<(&str, &str)> = all.iter().map(|e| (e.from.as_str(), e.to.as_str())).collect();
        assert_eq!(pairs, vec![("z", "a"), ("a", "c"), ("b", "c")]);

        let top = graph.top_edges(Weighting::Total, Some(2));
        assert_eq!(top.len(), 2);
        assert_eq!(top[1].from, "a");

        assert_eq!(graph.top_edges(Weighting::Total, Some(10)).len(), 3);
        assert_eq!(graph.top_edges(Weighting::Unique, Some(0)).len(), 0);

        let unique = graph.weighted_edges(Weighting::Unique);
        assert!(unique.iter().all(|e| e.weight == 1));
        assert_eq!(unique[0].from, "a");
    }

    #[test]
    fn test_merge_unions_classes_and_adds_totals() {
        let mut left = ComponentGraph::new();
        left.add_member("web", "W");
        left.add_call("web", "api", key("W::a"), key("Api::x"));

        let mut right = ComponentGraph::new();
        right.add_member("web", "W");
        right.add_member("api", "Api");
        right.add_call("web", "api", key("W::a"), key("Api::x"));

        let merged = left.clone().merge(right.clone());
        assert_eq!(merged, right.merge(left));
        assert_eq!(merged.class_count("web"), 1);
        let stats = merged.edge_stats("web", "api").unwrap();
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.unique(), 1);
    }

    #[test]
    fn test_subgraph_keeps_only_touching_edges() {
        let mut graph = ComponentGraph::new();
        graph.add_member("web", "W");
        graph.add_member("api", "Api");
        graph.add_member("db", "Db");
        graph.add_member("mail", "M");
        graph.add_call("web", "api", key("W::a"), key("Api::x"));
        graph.add_call("api", "db", key("Api::x"), key("Db::q"));
        graph.add_call("mail", "db", key("M::s"), key("Db::q"));

        let sub = graph.subgraph_for("api");
        assert_eq!(sub.components(), vec!["api", "db", "web"]);
        assert_eq!(sub.edge_count(), 2);
        assert!(sub.edge_stats("mail", "db").is_none());
        assert_eq!(sub.class_count("db"), 1);
    }
}
