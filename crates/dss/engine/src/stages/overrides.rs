use std::sync::Arc;

use async_trait::async_trait;
use dss_types::{path, CanonicalRecord, Decision, OverrideRules, RuleSet};
use serde_json::Value;
use tracing::info;

use crate::context::{ClassificationContext, StageResult};
use crate::traits::PipelineStage;

/// Forced category A, if any override rule triggers.
///
/// Absolute overrides are checked first, in declared order, then activity
/// overrides.
pub fn evaluate_overrides(record: &CanonicalRecord, rules: &OverrideRules) -> Option<Decision> {
    let document = record.to_value();

    for rule in &rules.absolute_overrides {
        let Some(value) = path::lookup(&document, &rule.canonical_path) else {
            continue;
        };
        let triggered = match (&rule.trigger_value, &rule.trigger_condition) {
            (Some(expected), _) => json_equals(value, expected),
            (None, Some(condition)) => path::as_number(value)
                .is_some_and(|v| condition.operator.apply(v, condition.value)),
            (None, None) => false,
        };
        if triggered {
            info!(path = %rule.canonical_path, reason = %rule.reason, "Absolute override triggered");
            return Some(Decision::overridden(&rule.reason));
        }
    }

    let activity = record.project_identity.activity.to_lowercase();
    rules
        .activity_overrides
        .iter()
        .find(|rule| activity.contains(&rule.activity_contains.to_lowercase()))
        .map(|rule| {
            info!(token = %rule.activity_contains, reason = %rule.reason, "Activity override triggered");
            Decision::overridden(&rule.reason)
        })
}

/// JSON equality where numbers compare by value (`5 == 5.0`).
fn json_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

/// Stage 1: Override Evaluation
///
/// A triggered override concludes the pipeline; capacity normalization,
/// mandatory validation and the rule engine never run.
pub struct OverrideStage {
    rules: Arc<RuleSet>,
}

impl OverrideStage {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl PipelineStage for OverrideStage {
    fn stage_name(&self) -> &str {
        "Override Evaluation"
    }

    fn stage_number(&self) -> u8 {
        1
    }

    async fn evaluate(&self, context: &mut ClassificationContext) -> StageResult {
        match evaluate_overrides(&context.record, &self.rules.overrides) {
            Some(decision) => StageResult::Conclude(decision),
            None => StageResult::Pass,
        }
    }
}
