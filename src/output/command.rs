//! JSON output types for CLI commands
//!
//! Every JSON document is wrapped in a [`JsonResponse`] carrying the schema
//! version and an execution ID so consumers can parse output stably across
//! releases.

use serde::{Deserialize, Serialize};

use crate::diagnostics::ScanDiagnostic;
use crate::projection::{AggregateView, SequenceTrace};

/// Current JSON output schema version
pub const CALLMAP_JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Wrapper for all JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    pub schema_version: String,
    pub execution_id: String,
    pub data: T,
    /// Set when output was truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
}

impl<T> JsonResponse<T> {
    pub fn new(data: T, execution_id: &str) -> Self {
        JsonResponse {
            schema_version: CALLMAP_JSON_SCHEMA_VERSION.to_string(),
            execution_id: execution_id.to_string(),
            data,
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = Some(partial);
        self
    }
}

/// Scan totals reported alongside every projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub files_scanned: usize,
    pub classes: usize,
    pub methods: usize,
    pub edges: usize,
    pub diagnostics: Vec<ScanDiagnostic>,
}

/// `callmap sequence --output json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceResponse {
    pub scan: ScanSummary,
    pub traces: Vec<SequenceTrace>,
    /// Requested entries that are not methods of the scanned tree
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_entries: Vec<String>,
}

/// `callmap components --output json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsResponse {
    pub scan: ScanSummary,
    pub view: AggregateView,
    /// Per-component drill-down views, when requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drilldowns: Vec<DrilldownView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrilldownView {
    pub component: String,
    pub view: AggregateView,
}

/// Response for errors in JSON mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable category, e.g. `scan_failed`
    pub error: String,
    pub message: String,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Human,
    /// JSON with schema versioning
    Json,
    /// PlantUML diagram source
    PlantUml,
}

/// Unique-enough ID for this run: timestamp + process ID.
pub fn generate_execution_id() -> String {
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let pid = process::id();

    format!("{:x}-{:x}", timestamp, pid)
}

/// Render `data` as pretty JSON.
pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Print `data` as pretty JSON to stdout.
pub fn output_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", to_json(data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_id_format() {
        let id = generate_execution_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 2, "Execution ID should have 2 parts: {}", id);
        assert!(parts.iter().all(|p| u64::from_str_radix(p, 16).is_ok()));
    }

    #[test]
    fn test_envelope_fields() {
        let response = JsonResponse::new(vec![1, 2], "abc-1");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["schema_version"], CALLMAP_JSON_SCHEMA_VERSION);
        assert_eq!(json["execution_id"], "abc-1");
        assert!(json.get("partial").is_none());

        let json = serde_json::to_value(response.with_partial(true)).unwrap();
        assert_eq!(json["partial"], true);
    }
}
