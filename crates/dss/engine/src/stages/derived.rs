use std::sync::Arc;

use async_trait::async_trait;
use dss_types::{CanonicalRecord, CapacityEntry, EngineConfig, RuleSet};
use serde_json::Value;
use tracing::debug;

use crate::context::{ClassificationContext, StageResult};
use crate::stages::capacity::standard_unit;
use crate::traits::PipelineStage;

/// Populate `derived_parameters` for the rule engine.
///
/// `effective_capacity` is the total effective capacity for normalized
/// records. Records outside normalization read their proposed capacity
/// directly. Every numeric form field is then copied over unless a
/// parameter of that name already exists.
pub fn derive_parameters(record: &mut CanonicalRecord, engine: &EngineConfig) {
    let effective = if standard_unit(record, engine).is_some() {
        record
            .capacity_normalization
            .total_effective_capacity
            .as_ref()
            .map(|total| total.value)
    } else {
        record
            .capacity_normalization
            .proposed_capacity
            .as_ref()
            .map(CapacityEntry::value)
            .or_else(|| {
                record
                    .form1_part_a
                    .get("proposed_capacity")
                    .and_then(CapacityEntry::from_value)
                    .map(|entry| entry.value())
            })
    };
    if let Some(value) = effective {
        record.derived_parameters.effective_capacity = Some(value);
    }

    let numeric: Vec<(String, f64)> = record
        .form1_part_a
        .iter()
        .filter_map(|(field, value)| match value {
            Value::Number(n) => n.as_f64().map(|v| (field.clone(), v)),
            _ => None,
        })
        .collect();
    for (field, value) in numeric {
        record.derived_parameters.insert_if_absent(&field, value);
    }
}

/// Stage 3: Derived Parameters. Always passes.
pub struct DerivedParametersStage {
    rules: Arc<RuleSet>,
}

impl DerivedParametersStage {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl PipelineStage for DerivedParametersStage {
    fn stage_name(&self) -> &str {
        "Derived Parameters"
    }

    fn stage_number(&self) -> u8 {
        3
    }

    async fn evaluate(&self, context: &mut ClassificationContext) -> StageResult {
        derive_parameters(&mut context.record, &self.rules.engine);
        debug!(
            effective_capacity = ?context.record.derived_parameters.effective_capacity,
            parameters = context.record.derived_parameters.values.len(),
            "Derived parameters computed"
        );
        StageResult::Pass
    }
}
