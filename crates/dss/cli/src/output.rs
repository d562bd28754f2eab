//! Output formatting utilities

use colored::*;
use dss_types::ClassificationResponse;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML format
    Yaml,
    /// Human-readable table
    Table,
}

#[derive(Tabled)]
struct ResponseRow {
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Authority")]
    authority: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&ClassificationResponse> for ResponseRow {
    fn from(response: &ClassificationResponse) -> Self {
        match response {
            ClassificationResponse::Classified(c) => Self {
                status: "CLASSIFIED",
                category: c.category.to_string(),
                mode: c.decision_mode.to_string(),
                confidence: format!("{:.2}", c.confidence),
                authority: format!("{} / {}", c.clearance_authority, c.appraisal_body),
                reason: c.reason.clone(),
            },
            ClassificationResponse::Undetermined {
                reason,
                missing_fields,
            } => Self {
                status: "UNDETERMINED",
                category: "-".into(),
                mode: "-".into(),
                confidence: "-".into(),
                authority: "-".into(),
                reason: format!("{reason}: {}", missing_fields.join(", ")),
            },
        }
    }
}

/// Print classification responses. A single response prints as an object.
pub fn print_responses(
    responses: &[ClassificationResponse],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match (format, responses) {
        (OutputFormat::Table, _) => {
            let rows: Vec<ResponseRow> = responses.iter().map(ResponseRow::from).collect();
            println!("{}", Table::new(rows));
            Ok(())
        }
        (_, [single]) => print_single(single, format),
        _ => print_single(&responses, format),
    }
}

/// Print rows as a table, or the same data as JSON/YAML.
pub fn print_table<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table if data.is_empty() => {
            println!("{}", "No results".dimmed());
            Ok(())
        }
        OutputFormat::Table => {
            println!("{}", Table::new(data));
            Ok(())
        }
        _ => print_single(&data, format),
    }
}

/// Print a single item as JSON or YAML.
pub fn print_single<T: Serialize + ?Sized>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
        OutputFormat::Json | OutputFormat::Table => {
            println!("{}", serde_json::to_string_pretty(data)?)
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
