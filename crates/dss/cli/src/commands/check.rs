use std::path::Path;

use anyhow::Context;
use dss_types::RuleSet;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};

/// One sector of the rule set summary.
#[derive(Serialize, Tabled)]
pub struct SectorSummary {
    #[tabled(rename = "Sector")]
    pub sector: String,
    #[tabled(rename = "Activities")]
    pub activities: usize,
    #[tabled(rename = "Rules")]
    pub rules: usize,
    #[tabled(rename = "Mandatory (activity)")]
    pub mandatory_activities: usize,
}

pub fn summarize(rules: &RuleSet) -> Vec<SectorSummary> {
    rules
        .dss
        .sectors()
        .map(|(sector, activities)| SectorSummary {
            sector: sector.to_string(),
            activities: activities.len(),
            rules: activities.values().map(Vec::len).sum(),
            mandatory_activities: rules
                .mandatory
                .sector
                .get_ignore_case(sector)
                .map_or(0, |(_, mandatory)| mandatory.activities.len()),
        })
        .collect()
}

pub fn execute(config: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let rules = RuleSet::load_dir(config)
        .with_context(|| format!("failed to load rule set from {}", config.display()))?;

    output::print_table(summarize(&rules), format)?;
    if matches!(format, OutputFormat::Table) {
        output::print_success(&format!(
            "Rule set valid: {} mapped fields, {} overrides, {} rules",
            rules.field_mapping.fields().count(),
            rules.overrides.absolute_overrides.len() + rules.overrides.activity_overrides.len(),
            rules.dss.rule_count(),
        ));
    }
    Ok(())
}
