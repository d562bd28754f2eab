use async_trait::async_trait;
use tracing::info;

use crate::context::{ClassificationContext, StageResult};
use crate::rules::RuleEngine;
use crate::traits::PipelineStage;

/// Stage 5: Rule Evaluation
///
/// Runs the [`RuleEngine`] and writes any similarity correction back into
/// the record: the corrected activity label and its provenance.
pub struct RuleEvaluationStage {
    engine: RuleEngine,
}

impl RuleEvaluationStage {
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl PipelineStage for RuleEvaluationStage {
    fn stage_name(&self) -> &str {
        "Rule Evaluation"
    }

    fn stage_number(&self) -> u8 {
        5
    }

    async fn evaluate(&self, context: &mut ClassificationContext) -> StageResult {
        context.dump_record("before rule evaluation");

        let outcome = self.engine.classify(&context.record).await;
        if let Some(found) = outcome.provenance {
            context.record.project_identity.activity = found.key;
            context.record.derived_parameters.record_similarity(found.score);
        }

        info!(
            category = %outcome.decision.category,
            decision_mode = %outcome.decision.decision_mode,
            reason = %outcome.decision.reason,
            "Rule evaluation complete"
        );
        StageResult::Conclude(outcome.decision)
    }
}
