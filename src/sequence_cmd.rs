//! Sequence command: call traces from entry methods.

use anyhow::{bail, Context, Result};
use callmap::graph::{CallGraph, MethodKey, ScanConfig, ScanOutcome};
use callmap::output::{
    generate_execution_id, human, plantuml, to_json, JsonResponse, ScanSummary, SequenceResponse,
};
use callmap::projection::{sequence, ProjectionError, SequenceTrace, DEFAULT_MAX_DEPTH};
use callmap::{Config, OutputFormat};

use crate::cli::SequenceArgs;
use crate::{emit, run_scan, scan_summary};

pub fn run_sequence(args: SequenceArgs, scan_config: ScanConfig, config: &Config) -> Result<bool> {
    let depth = args
        .depth
        .or(config.sequence.depth)
        .unwrap_or(DEFAULT_MAX_DEPTH);
    let requested = if args.entry.is_empty() {
        config.sequence.entries.clone()
    } else {
        args.entry.clone()
    };
    let requested: Vec<MethodKey> = requested
        .iter()
        .map(|entry| {
            entry
                .parse()
                .with_context(|| format!("invalid --entry '{}'", entry))
        })
        .collect::<Result<_>>()?;

    let mut outcome = run_scan(&scan_config)?;
    for key in requested {
        outcome.graph.add_entry_point(key);
    }
    let ScanOutcome { graph, .. } = &outcome;

    let entries = graph.entry_points();
    if entries.is_empty() {
        bail!("no entry points: the scanned tree declares no public methods");
    }

    let (traces, missing) = project_all(graph, &entries, depth);
    for key in &missing {
        tracing::warn!(entry = %key, "entry point not found");
        eprintln!("Error: entry point not found: {}", key);
    }

    let summary = scan_summary(&outcome);
    let format = OutputFormat::from(args.sink.output);
    let rendered = match format {
        OutputFormat::Human => render_human(&summary, &traces),
        OutputFormat::Json => {
            let response = SequenceResponse {
                scan: summary,
                traces,
                missing_entries: missing.iter().map(ToString::to_string).collect(),
            };
            to_json(&JsonResponse::new(response, &generate_execution_id()))?
        }
        OutputFormat::PlantUml => traces
            .iter()
            .map(|trace| plantuml::render_sequence(trace, Some(graph)))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    emit(&rendered, args.sink.out.as_deref())?;

    Ok(missing.is_empty())
}

/// Project every entry; entries that are not methods of `graph` are
/// returned separately and do not stop the others.
fn project_all(
    graph: &CallGraph,
    entries: &[MethodKey],
    depth: usize,
) -> (Vec<SequenceTrace>, Vec<MethodKey>) {
    let mut traces = Vec::new();
    let mut missing = Vec::new();
    for entry in entries {
        match sequence::project(graph, entry, depth) {
            Ok(trace) => traces.push(trace),
            Err(ProjectionError::EntryNotFound(key)) => missing.push(key),
            Err(ProjectionError::MalformedKey(err)) => {
                tracing::warn!(error = %err, "skipping malformed entry");
            }
        }
    }
    (traces, missing)
}

fn render_human(summary: &ScanSummary, traces: &[SequenceTrace]) -> String {
    let mut out = human::render_summary(summary);
    for trace in traces {
        out.push('\n');
        out.push_str(&human::render_sequence(trace));
    }
    out
}
