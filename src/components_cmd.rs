//! Components command: weighted communication between components.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use callmap::graph::{
    CallGraph, ComponentGraph, ComponentPolicy, PackageName, PerClass, ScanConfig,
    TopSegment,
};
use callmap::output::{
    generate_execution_id, human, plantuml, to_json, ComponentsResponse, DrilldownView,
    JsonResponse,
};
use callmap::projection::{aggregate, AggregateOptions, Granularity};
use callmap::{Config, OutputFormat};

use crate::cli::ComponentsArgs;
use crate::{emit, run_scan, scan_summary};

pub fn run_components(args: ComponentsArgs, scan_config: ScanConfig, config: &Config) -> Result<bool> {
    let options = AggregateOptions {
        granularity: args
            .granularity
            .map(Into::into)
            .or(config.components.granularity)
            .unwrap_or_default(),
        weighting: args
            .weighting
            .map(Into::into)
            .or(config.components.weighting)
            .unwrap_or_default(),
        max_edges: args.max_edges.or(config.components.max_edges),
        labels: args
            .edge_label
            .map(Into::into)
            .or(config.components.edge_label)
            .unwrap_or_default(),
        detail: args
            .edge_detail
            .map(Into::into)
            .or(config.components.edge_detail)
            .unwrap_or_default(),
    };
    let policy: ComponentPolicy = args
        .policy
        .map(Into::into)
        .or(config.components.policy)
        .unwrap_or_default();

    let outcome = run_scan(&scan_config)?;
    let components = fold(&outcome.graph, &scan_config, options.granularity, policy);
    let components = match &args.focus {
        Some(focus) => {
            if components.classes_of(focus).is_none() {
                anyhow::bail!("unknown component: {}", focus);
            }
            components.subgraph_for(focus)
        }
        None => components,
    };

    let view = aggregate::project(&components, &options);
    let drilldowns = drilldown_views(&components, &options, args.drilldown_all);

    if let Some(dir) = &args.drilldown_dir {
        write_drilldowns(dir, &drilldowns)?;
    }

    let caption = view
        .truncated
        .then(|| format!("{} of {} edges shown", view.edges.len(), view.total_edges));
    let summary = scan_summary(&outcome);
    let rendered = match OutputFormat::from(args.sink.output) {
        OutputFormat::Human => {
            let mut out = human::render_summary(&summary);
            out.push('\n');
            out.push_str(&human::render_components(&view));
            out
        }
        OutputFormat::Json => {
            let partial = view.truncated;
            let response = ComponentsResponse {
                scan: summary,
                view,
                drilldowns: if args.drilldown_dir.is_some() || args.drilldown_all {
                    drilldowns
                } else {
                    Vec::new()
                },
            };
            to_json(&JsonResponse::new(response, &generate_execution_id()).with_partial(partial))?
        }
        OutputFormat::PlantUml => {
            plantuml::render_components(&view, &args.title, caption.as_deref())
        }
    };
    emit(&rendered, args.sink.out.as_deref())?;
    Ok(true)
}

/// Fold the call graph with the assigner selected by granularity and policy.
fn fold(
    graph: &CallGraph,
    scan_config: &ScanConfig,
    granularity: Granularity,
    policy: ComponentPolicy,
) -> ComponentGraph {
    let roots = &scan_config.roots;
    match (granularity, policy) {
        (Granularity::Class, _) => ComponentGraph::from_call_graph(graph, &PerClass),
        (Granularity::Component, ComponentPolicy::TopSegment) => {
            ComponentGraph::from_call_graph(graph, &TopSegment::new(roots))
        }
        (Granularity::Component, ComponentPolicy::PackageName) => {
            let assigner = PackageName::new(roots, scan_config.package_cache());
            let components = ComponentGraph::from_call_graph(graph, &assigner);
            if let Err(err) = assigner.into_cache().save() {
                tracing::warn!(error = %err, "failed to save package-name cache");
            }
            components
        }
    }
}

/// One view per component. Components without edges are skipped unless
/// `include_empty` is set.
fn drilldown_views(
    components: &ComponentGraph,
    options: &AggregateOptions,
    include_empty: bool,
) -> Vec<DrilldownView> {
    components
        .components()
        .into_iter()
        .filter_map(|name| {
            let sub = components.subgraph_for(name);
            if sub.edge_count() == 0 && !include_empty {
                return None;
            }
            Some(DrilldownView {
                component: name.to_string(),
                view: aggregate::project(&sub, options),
            })
        })
        .collect()
}

/// File stem for a drill-down diagram: anything outside `[A-Za-z0-9_-]`
/// becomes `_`.
fn drilldown_stem(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// One file name per component, in order. Components whose sanitised names
/// collide get `_2`, `_3`, ... so no diagram overwrites another.
fn drilldown_file_names<'a>(components: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used = HashSet::new();
    components
        .into_iter()
        .map(|component| {
            let stem = drilldown_stem(component);
            let mut name = format!("{}.puml", stem);
            let mut suffix = 2;
            while !used.insert(name.to_ascii_lowercase()) {
                name = format!("{}_{}.puml", stem, suffix);
                suffix += 1;
            }
            if suffix > 2 {
                tracing::warn!(component, file = %name, "drill-down file name collides, renamed");
            }
            name
        })
        .collect()
}

fn write_drilldowns(dir: &Path, drilldowns: &[DrilldownView]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create drill-down directory {}", dir.display()))?;
    let names = drilldown_file_names(drilldowns.iter().map(|d| d.component.as_str()));
    for (drilldown, name) in drilldowns.iter().zip(names) {
        let path = dir.join(name);
        let title = format!("{} communications", drilldown.component);
        let uml = plantuml::render_components(&drilldown.view, &title, None);
        std::fs::write(&path, uml)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote drill-down");
    }
    Ok(())
}
