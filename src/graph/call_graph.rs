//! Call graph store
//!
//! Append-only store of method nodes, class → file mappings and call edges
//! discovered across one scan. Partial graphs built by independent workers are
//! combined with [`CallGraph::merge`].
//!
//! # Identity
//!
//! A method node is identified by its [`MethodKey`] (class FQN + method name).
//! Keys are never rewritten once recorded.
//!
//! # Multiplicity
//!
//! Edges are not deduplicated: two identical call sites produce two edges.
//! Downstream weighting relies on this.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ingest::FileFacts;

/// Separator between class and method in a rendered [`MethodKey`].
pub const METHOD_SEPARATOR: &str = "::";

/// Identity of a method node: (fully-qualified class name, method name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    pub class: String,
    pub method: String,
}

impl MethodKey {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.class, METHOD_SEPARATOR, self.method)
    }
}

/// Error returned when a `Class::method` string cannot be split.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected `Class::method`, got '{0}'")]
pub struct MethodKeyParseError(pub String);

impl FromStr for MethodKey {
    type Err = MethodKeyParseError;

    /// Parse `Class::method`, splitting at the last `::`.
    ///
    /// A leading `\` on the class is dropped so that `\App\Foo::bar` and
    /// `App\Foo::bar` name the same node.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, method) = s
            .trim()
            .rsplit_once(METHOD_SEPARATOR)
            .ok_or_else(|| MethodKeyParseError(s.to_string()))?;
        let class = class.trim_start_matches('\\');
        if class.is_empty() || method.is_empty() {
            return Err(MethodKeyParseError(s.to_string()));
        }
        Ok(MethodKey::new(class, method))
    }
}

/// Declared visibility of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Methods without an explicit modifier are public in PHP
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_modifier(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// How a call site invokes its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// `$obj->m()` on an object of known type
    Instance,
    /// `Type::m()`
    Static,
    /// `f()`
    Function,
    /// `new Type(...)`
    Constructor,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Instance => "instance",
            CallKind::Static => "static",
            CallKind::Function => "function",
            CallKind::Constructor => "constructor",
        }
    }
}

/// Target of a call edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallTarget {
    /// Class and method are both known
    Method(MethodKey),
    /// Only a symbolic name is known (free function)
    Unresolved(String),
}

impl CallTarget {
    pub fn as_method(&self) -> Option<&MethodKey> {
        match self {
            CallTarget::Method(key) => Some(key),
            CallTarget::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::Method(key) => write!(f, "{}", key),
            CallTarget::Unresolved(name) => write!(f, "{}()", name),
        }
    }
}

/// One observed call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallEdge {
    /// Method containing the call site
    pub source: MethodKey,
    pub target: CallTarget,
    pub kind: CallKind,
}

impl CallEdge {
    pub fn new(source: MethodKey, target: CallTarget, kind: CallKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }
}

/// Aggregate store of all method nodes and call edges of one scan.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    methods: BTreeMap<MethodKey, Visibility>,
    classes: BTreeMap<String, PathBuf>,
    edges: HashMap<MethodKey, Vec<CallEdge>>,
    entry_points: Vec<MethodKey>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a method declaration. Recording the same key twice keeps the
    /// last visibility.
    pub fn add_method(&mut self, key: MethodKey, visibility: Visibility) {
        self.methods.insert(key, visibility);
    }

    /// Record the file that declares `class`.
    pub fn add_class(&mut self, class: impl Into<String>, file: impl Into<PathBuf>) {
        self.classes.insert(class.into(), file.into());
    }

    /// Append a call edge.
    pub fn add_call(&mut self, edge: CallEdge) {
        self.edges.entry(edge.source.clone()).or_default().push(edge);
    }

    /// Fold the facts extracted from one translation unit into the graph.
    pub fn add_file_facts(&mut self, facts: FileFacts) {
        for class in facts.classes {
            self.add_class(class, facts.path.clone());
        }
        for (key, visibility) in facts.methods {
            self.add_method(key, visibility);
        }
        for edge in facts.calls {
            self.add_call(edge);
        }
    }

    /// Explicitly designate an entry point. Duplicates are ignored.
    pub fn add_entry_point(&mut self, key: MethodKey) {
        if !self.entry_points.contains(&key) {
            self.entry_points.push(key);
        }
    }

    /// Entry points for sequence projection.
    ///
    /// Explicit entry points in insertion order when any were added,
    /// otherwise every public method in key order.
    pub fn entry_points(&self) -> Vec<MethodKey> {
        if !self.entry_points.is_empty() {
            return self.entry_points.clone();
        }
        self.methods
            .iter()
            .filter(|(_, vis)| **vis == Visibility::Public)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// All methods with their visibility, in key order.
    pub fn methods(&self) -> &BTreeMap<MethodKey, Visibility> {
        &self.methods
    }

    pub fn has_method(&self, key: &MethodKey) -> bool {
        self.methods.contains_key(key)
    }

    pub fn visibility(&self, key: &MethodKey) -> Option<Visibility> {
        self.methods.get(key).copied()
    }

    /// Class FQN → declaring file, in class order.
    pub fn classes(&self) -> &BTreeMap<String, PathBuf> {
        &self.classes
    }

    pub fn class_file(&self, class: &str) -> Option<&Path> {
        self.classes.get(class).map(PathBuf::as_path)
    }

    /// Outgoing edges of `key` in insertion order. Unknown keys yield an
    /// empty slice.
    pub fn calls_from(&self, key: &MethodKey) -> &[CallEdge] {
        self.edges.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every edge, grouped by source in key order.
    pub fn all_edges(&self) -> Vec<&CallEdge> {
        let mut sources: Vec<&MethodKey> = self.edges.keys().collect();
        sources.sort();
        sources
            .into_iter()
            .flat_map(|source| self.edges[source].iter())
            .collect()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Merge another graph into this one.
    ///
    /// Methods and classes are unioned, edges are concatenated, explicit
    /// entry points are appended without duplicates. The result is the same
    /// edge multiset regardless of merge order.
    pub fn merge(mut self, other: CallGraph) -> CallGraph {
        self.methods.extend(other.methods);
        self.classes.extend(other.classes);
        for (source, mut edges) in other.edges {
            self.edges.entry(source).or_default().append(&mut edges);
        }
        for entry in other.entry_points {
            self.add_entry_point(entry);
        }
        self
    }

    /// Edge multiset in a canonical order.
    fn sorted_edges(&self) -> Vec<&CallEdge> {
        let mut edges: Vec<&CallEdge> = self.edges.values().flatten().collect();
        edges.sort();
        edges
    }
}

impl PartialEq for CallGraph {
    /// Graphs are equal when they hold the same methods, classes and edge
    /// multiset. Edge insertion order does not matter.
    fn eq(&self, other: &Self) -> bool {
        self.methods == other.methods
            && self.classes == other.classes
            && self.sorted_edges() == other.sorted_edges()
    }
}

impl Eq for CallGraph {}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MethodKey {
        s.parse().unwrap()
    }

    fn call(from: &str, to: &str) -> CallEdge {
        CallEdge::new(key(from), CallTarget::Method(key(to)), CallKind::Instance)
    }

    #[test]
    fn test_method_key_parses_at_last_separator() {
        let k: MethodKey = "\\App\\Service\\Foo::bar".parse().unwrap();
        assert_eq!(k.class, "App\\Service\\Foo");
        assert_eq!(k.method, "bar");
        assert_eq!(k.to_string(), "App\\Service\\Foo::bar");

        assert!("NoSeparator".parse::<MethodKey>().is_err());
        assert!("::bar".parse::<MethodKey>().is_err());
        assert!("Foo::".parse::<MethodKey>().is_err());
    }

    #[test]
    fn test_calls_from_unknown_source_is_empty() {
        let graph = CallGraph::new();
        assert!(graph.calls_from(&key("A::missing")).is_empty());
    }

    #[test]
    fn test_duplicate_calls_are_kept() {
        let mut graph = CallGraph::new();
        graph.add_call(call("A::run", "B::work"));
        graph.add_call(call("A::run", "B::work"));
        assert_eq!(graph.calls_from(&key("A::run")).len(), 2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_add_method_last_visibility_wins() {
        let mut graph = CallGraph::new();
        graph.add_method(key("A::x"), Visibility::Public);
        graph.add_method(key("A::x"), Visibility::Private);
        assert_eq!(graph.visibility(&key("A::x")), Some(Visibility::Private));
        assert_eq!(graph.method_count(), 1);
    }

    #[test]
    fn test_entry_points_default_to_public_methods() {
        let mut graph = CallGraph::new();
        graph.add_method(key("B::pub_b"), Visibility::Public);
        graph.add_method(key("A::pub_a"), Visibility::Public);
        graph.add_method(key("A::hidden"), Visibility::Private);
        graph.add_method(key("A::inherited"), Visibility::Protected);

        assert_eq!(graph.entry_points(), vec![key("A::pub_a"), key("B::pub_b")]);

        graph.add_entry_point(key("A::hidden"));
        graph.add_entry_point(key("A::hidden"));
        assert_eq!(graph.entry_points(), vec![key("A::hidden")]);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut left = CallGraph::new();
        left.add_method(key("A::run"), Visibility::Public);
        left.add_class("A", "a/A.php");
        left.add_call(call("A::run", "B::work"));

        let mut right = CallGraph::new();
        right.add_method(key("B::work"), Visibility::Public);
        right.add_class("B", "b/B.php");
        right.add_call(call("A::run", "C::assist"));
        right.add_call(call("B::work", "C::assist"));

        let lr = left.clone().merge(right.clone());
        let rl = right.merge(left);
        assert_eq!(lr, rl);
        assert_eq!(lr.edge_count(), 3);
        assert_eq!(lr.method_count(), 2);
        assert_eq!(lr.class_file("B"), Some(Path::new("b/B.php")));
    }

    #[test]
    fn test_all_edges_grouped_by_source_order() {
        let mut graph = CallGraph::new();
        graph.add_call(call("B::b", "C::c"));
        graph.add_call(call("A::a", "B::b"));
        graph.add_call(call("A::a", "C::c"));

        let sources: Vec<String> = graph
            .all_edges()
            .iter()
            .map(|e| e.source.to_string())
            .collect();
        assert_eq!(sources, vec!["A::a", "A::a", "B::b"]);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(CallTarget::Method(key("A::b")).to_string(), "A::b");
        assert_eq!(CallTarget::Unresolved("strlen".into()).to_string(), "strlen()");
    }
}
