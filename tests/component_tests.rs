//! Folding scanned call graphs into components.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use callmap::graph::{
    scan, ComponentGraph, PackageName, PackageNameCache, PerClass, ScanConfig, TopSegment,
    Weighting, CACHE_DIR,
};
use callmap::output::plantuml;
use callmap::projection::{aggregate, AggregateOptions, Granularity};

fn write(root: &Path, rel: &str, source: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

/// web/Controller calls billing/Invoice twice through `total` and once
/// through `issue`; billing/Invoice calls shared/Money once.
fn services_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "web/Controller.php",
        r#"<?php
namespace Web;

use Billing\Invoice;

class Controller
{
    private Invoice $invoice;

    public function show()
    {
        $this->invoice->total();
        $this->invoice->total();
        $this->invoice->issue();
    }
}
"#,
    );
    write(
        root,
        "billing/Invoice.php",
        r#"<?php
namespace Billing;

use Shared\Money;

class Invoice
{
    public function total()
    {
        Money::sum();
    }

    public function issue()
    {
    }
}
"#,
    );
    write(
        root,
        "shared/Money.php",
        r#"<?php
namespace Shared;

class Money
{
    public static function sum()
    {
    }
}
"#,
    );
    temp_dir
}

fn root_of(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().to_path_buf()
}

#[test]
fn test_top_segment_fold() {
    let temp_dir = services_tree();
    let roots = vec![root_of(&temp_dir)];
    let outcome = scan(&ScanConfig::new(roots.clone())).unwrap();

    let components = ComponentGraph::from_call_graph(&outcome.graph, &TopSegment::new(&roots));
    assert_eq!(components.components(), vec!["billing", "shared", "web"]);

    let web_billing = components.edge_stats("web", "billing").unwrap();
    assert_eq!(web_billing.total(), 3);
    assert_eq!(web_billing.unique(), 2);
    assert_eq!(components.edge_stats("billing", "shared").unwrap().total(), 1);
    assert!(components.edge_stats("shared", "web").is_none());

    for edge in components.weighted_edges(Weighting::Total) {
        let stats = components.edge_stats(&edge.from, &edge.to).unwrap();
        assert!(stats.total() >= stats.unique());
    }
}

#[test]
fn test_package_name_fold_uses_composer_names() {
    let temp_dir = services_tree();
    let root = root_of(&temp_dir);
    fs::write(root.join("web/composer.json"), r#"{"name": "acme/web"}"#).unwrap();
    fs::write(root.join("billing/composer.json"), r#"{"name": "acme/billing"}"#).unwrap();

    let roots = vec![root.clone()];
    let outcome = scan(&ScanConfig::new(roots.clone())).unwrap();
    let assigner = PackageName::new(&roots, PackageNameCache::load(&root));
    let components = ComponentGraph::from_call_graph(&outcome.graph, &assigner);

    // shared/ has no composer.json and falls back to its directory
    assert_eq!(
        components.components(),
        vec!["acme/billing", "acme/web", "shared"]
    );
    assert_eq!(components.edge_stats("acme/web", "acme/billing").unwrap().total(), 3);

    let cache = assigner.into_cache();
    assert!(!cache.is_empty());
    cache.save().unwrap();
    assert!(root.join(CACHE_DIR).is_dir());

    let reloaded = PackageNameCache::load(&root);
    assert_eq!(reloaded.len(), cache.len());
}

#[test]
fn test_aggregate_view_weighting_and_truncation() {
    let temp_dir = services_tree();
    let roots = vec![root_of(&temp_dir)];
    let outcome = scan(&ScanConfig::new(roots.clone())).unwrap();
    let components = ComponentGraph::from_call_graph(&outcome.graph, &TopSegment::new(&roots));

    let unique = aggregate::project(
        &components,
        &AggregateOptions {
            weighting: Weighting::Unique,
            ..Default::default()
        },
    );
    assert_eq!(unique.total_edges, 2);
    assert!(!unique.truncated);
    assert_eq!(unique.edges[0].from, "web");
    assert_eq!(unique.edges[0].weight, 2);

    let top = aggregate::project(
        &components,
        &AggregateOptions {
            max_edges: Some(1),
            ..Default::default()
        },
    );
    assert!(top.truncated);
    assert_eq!(top.edges.len(), 1);
    assert_eq!(top.edges[0].weight, 3);

    let uml = plantuml::render_components(&top, "Services", Some("1 of 2 edges shown"));
    assert!(uml.contains("title Services"));
    assert!(uml.contains("caption 1 of 2 edges shown"));
    assert!(uml.contains("\"web\\n(1 classes)\""));
}

#[test]
fn test_class_granularity() {
    let temp_dir = services_tree();
    let roots = vec![root_of(&temp_dir)];
    let outcome = scan(&ScanConfig::new(roots)).unwrap();
    let classes = ComponentGraph::from_call_graph(&outcome.graph, &PerClass);

    let view = aggregate::project(
        &classes,
        &AggregateOptions {
            granularity: Granularity::Class,
            ..Default::default()
        },
    );
    let names: Vec<&str> = view.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Billing\\Invoice", "Shared\\Money", "Web\\Controller"]);
    assert_eq!(view.total_edges, 2);
}

#[test]
fn test_focus_keeps_neighbours_only() {
    let temp_dir = services_tree();
    let roots = vec![root_of(&temp_dir)];
    let outcome = scan(&ScanConfig::new(roots.clone())).unwrap();
    let components = ComponentGraph::from_call_graph(&outcome.graph, &TopSegment::new(&roots));

    let focused = components.subgraph_for("web");
    assert_eq!(focused.components(), vec!["billing", "web"]);
    assert_eq!(focused.edge_count(), 1);
}
