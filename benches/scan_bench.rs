//! Scan and projection benchmarks over a generated PHP tree.
//!
//! Run with: cargo bench --bench scan_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use callmap::graph::{scan, ComponentGraph, ScanConfig, TopSegment};
use callmap::projection::{aggregate, sequence, AggregateOptions};

const PACKAGES: usize = 8;
const CLASSES_PER_PACKAGE: usize = 25;

/// Each class holds a typed field of the next class (wrapping across
/// packages) and calls into it from two methods, plus one static call.
fn write_tree(root: &Path) {
    let total = PACKAGES * CLASSES_PER_PACKAGE;
    for i in 0..total {
        let pkg = i / CLASSES_PER_PACKAGE;
        let next = (i + 1) % total;
        let next_pkg = next / CLASSES_PER_PACKAGE;
        let source = format!(
            r#"<?php
namespace Pkg{pkg};

use Pkg{next_pkg}\Node{next};

class Node{i}
{{
    private Node{next} $next;

    public function handle()
    {{
        $this->next->handle();
        $this->next->describe();
        $this->audit();
    }}

    public function describe()
    {{
        Node{next}::build();
        return sprintf('%d', {i});
    }}

    public static function build()
    {{
        return new Node{i}();
    }}

    private function audit()
    {{
    }}
}}
"#
        );
        let dir = root.join(format!("pkg{}", pkg));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("Node{}.php", i)), source).unwrap();
    }
}

fn benchmark_scan(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    write_tree(temp_dir.path());
    let files = (PACKAGES * CLASSES_PER_PACKAGE) as u64;

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Elements(files));
    for jobs in [1, 4] {
        let config = ScanConfig::new(vec![temp_dir.path().to_path_buf()]).with_jobs(Some(jobs));
        group.bench_function(format!("jobs_{}", jobs), |b| {
            b.iter(|| black_box(scan(&config).unwrap()))
        });
    }
    group.finish();
}

fn benchmark_projections(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    write_tree(temp_dir.path());
    let roots = vec![temp_dir.path().to_path_buf()];
    let outcome = scan(&ScanConfig::new(roots.clone())).unwrap();
    let entry = "Pkg0\\Node0::handle".parse().unwrap();

    c.bench_function("sequence_depth_10", |b| {
        b.iter(|| black_box(sequence::project(&outcome.graph, &entry, 10).unwrap()))
    });

    let assigner = TopSegment::new(&roots);
    c.bench_function("fold_components", |b| {
        b.iter(|| black_box(ComponentGraph::from_call_graph(&outcome.graph, &assigner)))
    });

    let components = ComponentGraph::from_call_graph(&outcome.graph, &assigner);
    c.bench_function("aggregate_view", |b| {
        b.iter(|| black_box(aggregate::project(&components, &AggregateOptions::default())))
    });
}

criterion_group!(benches, benchmark_scan, benchmark_projections);
criterion_main!(benches);
