use std::path::Path;

use anyhow::Context;
use clap::Args;
use dss_engine::Pipeline;
use serde_json::Value;
use tracing::info;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Submission file (JSON object, or an array of objects); `-` reads stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Echo the canonical record and log it between stages
    #[arg(long)]
    pub debug: bool,
}

pub async fn execute(args: ClassifyArgs, config: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config_dir(config)
        .with_context(|| format!("failed to load rule set from {}", config.display()))?;
    let submission = read_submission(&args.input)?;

    match submission {
        Value::Array(projects) => {
            info!(projects = projects.len(), "Classifying batch");
            let mut responses = Vec::with_capacity(projects.len());
            for project in &projects {
                responses.push(pipeline.classify(project, args.debug).await);
            }
            output::print_responses(&responses, format)
        }
        project => {
            let response = pipeline.classify(&project, args.debug).await;
            output::print_responses(std::slice::from_ref(&response), format)
        }
    }
}

fn read_submission(input: &str) -> anyhow::Result<Value> {
    let text = if input == "-" {
        std::io::read_to_string(std::io::stdin()).context("failed to read submission from stdin")?
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };
    serde_json::from_str(&text).context("submission is not valid JSON")
}
