use async_trait::async_trait;

use crate::context::{ClassificationContext, StageResult};

/// Trait for each stage of the classification pipeline.
///
/// Stages run in order over a shared [`ClassificationContext`]. A stage may
/// enrich the record and pass, or return a terminal result that ends the run.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Human-readable stage name.
    fn stage_name(&self) -> &str;

    /// Stage number (1-5); field mapping is stage 0.
    fn stage_number(&self) -> u8;

    /// Evaluate this stage.
    async fn evaluate(&self, context: &mut ClassificationContext) -> StageResult;
}
