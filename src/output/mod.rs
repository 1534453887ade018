//! Output formats for CLI commands: human text, JSON, PlantUML.

pub mod command;
pub mod human;
pub mod plantuml;

pub use command::{
    generate_execution_id, output_json, to_json, ComponentsResponse, DrilldownView, ErrorResponse,
    JsonResponse, OutputFormat, ScanSummary, SequenceResponse, CALLMAP_JSON_SCHEMA_VERSION,
};
