use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dss_similarity::{EmbeddingFactory, HttpEmbedder, SimilarityRegistry};
use dss_types::{
    Classification, ClassificationResponse, Decision, RuleSet, SimilarityConfig,
};
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::context::{ClassificationContext, StageResult};
use crate::error::PipelineError;
use crate::rules::{RuleEngine, NO_MATCH_REASON};
use crate::stages::mapping::map_fields;
use crate::stages::{
    CapacityStage, DerivedParametersStage, MandatoryStage, OverrideStage, RuleEvaluationStage,
};
use crate::traits::PipelineStage;

/// The classification pipeline.
///
/// Built once from a rule set and shared across requests. Requests are
/// independent; the similarity registry is the only state they share.
pub struct Pipeline {
    rules: Arc<RuleSet>,
    similarity: Arc<SimilarityRegistry>,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn new(rules: RuleSet, similarity: Arc<SimilarityRegistry>) -> Self {
        let rules = Arc::new(rules);
        let engine = RuleEngine::new(Arc::clone(&rules), Arc::clone(&similarity));
        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(OverrideStage::new(Arc::clone(&rules))),
            Box::new(CapacityStage::new(Arc::clone(&rules))),
            Box::new(DerivedParametersStage::new(Arc::clone(&rules))),
            Box::new(MandatoryStage::new(Arc::clone(&rules))),
            Box::new(RuleEvaluationStage::new(engine)),
        ];
        Self {
            rules,
            similarity,
            stages,
        }
    }

    /// Load the rule set in `dir` and wire the configured similarity provider.
    pub fn from_config_dir(dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let rules = RuleSet::load_dir(dir)?;
        let similarity = similarity_registry(&rules.engine.similarity)?;
        Ok(Self::new(rules, Arc::new(similarity)))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn similarity(&self) -> &Arc<SimilarityRegistry> {
        &self.similarity
    }

    /// Classify one raw submission.
    ///
    /// With `verbose` set, the canonical record is echoed in the response
    /// and logged between stages.
    #[instrument(name = "classify", skip(self, raw), fields(request_id = %Uuid::new_v4()))]
    pub async fn classify(&self, raw: &Value, verbose: bool) -> ClassificationResponse {
        let context = self.evaluate(raw, verbose).await;
        self.respond(context)
    }

    /// Run the stages over `raw`, stopping at the first terminal result.
    pub async fn evaluate(&self, raw: &Value, verbose: bool) -> ClassificationContext {
        let (record, unmapped) = map_fields(raw, &self.rules.field_mapping);
        debug!(
            sector = %record.project_identity.sector,
            activity = %record.project_identity.activity,
            unmapped = ?unmapped,
            "Fields mapped"
        );

        let mut context = ClassificationContext::new(record, verbose);
        for stage in &self.stages {
            debug!(
                stage = stage.stage_name(),
                number = stage.stage_number(),
                "Evaluating stage"
            );
            let result = stage.evaluate(&mut context).await;
            let terminal = result.is_terminal();
            context.record_stage(stage.stage_name(), result);
            if terminal {
                break;
            }
        }
        context
    }

    /// Assemble the response for an evaluated context.
    pub fn respond(&self, context: ClassificationContext) -> ClassificationResponse {
        let decision = match context.outcome() {
            Some(StageResult::Undetermined {
                reason,
                missing_fields,
            }) => {
                return ClassificationResponse::Undetermined {
                    reason: reason.clone(),
                    missing_fields: missing_fields.clone(),
                };
            }
            Some(StageResult::Conclude(decision)) => decision.clone(),
            Some(StageResult::Pass) | None => Decision::fallback(NO_MATCH_REASON),
        };
        ClassificationResponse::Classified(self.finalize(decision, context))
    }

    fn finalize(&self, mut decision: Decision, context: ClassificationContext) -> Classification {
        let record = context.record;
        if record.derived_parameters.matched_by_similarity() {
            decision.confidence = decision
                .confidence
                .min(self.rules.engine.similarity_confidence_cap);
        }

        info!(
            category = %decision.category,
            decision_mode = %decision.decision_mode,
            confidence = decision.confidence,
            "Project classified"
        );

        let mut classification = Classification::new(decision);
        if context.debug {
            classification.canonical_project = Some(record);
        }
        classification
    }
}

/// Registry for `config`: disabled, or embedding-backed over HTTP.
pub fn similarity_registry(config: &SimilarityConfig) -> Result<SimilarityRegistry, PipelineError> {
    if !config.enabled {
        return Ok(SimilarityRegistry::disabled());
    }
    let embedder = HttpEmbedder::from_config(config)?;
    info!(model = %config.model, "Semantic activity matching enabled");
    let factory = EmbeddingFactory::new(Arc::new(embedder));
    Ok(SimilarityRegistry::new(Arc::new(factory))
        .with_failure_cooldown(Duration::from_millis(config.failure_cooldown_ms)))
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.stage_name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
