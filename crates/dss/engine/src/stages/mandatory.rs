//! Stage 4: Mandatory Validation
//!
//! Three tiers of required fields accumulate into one missing set:
//!
//! 1. `global`
//! 2. the sector's `common` list
//! 3. the activity's list, matched exactly (case-insensitive); skipped when
//!    the activity has no entry
//!
//! Disjunctive activities are satisfied by any one of their configured
//! alternatives. When none is present, every alternative is reported.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use dss_types::{CanonicalRecord, EngineConfig, MandatoryRules, RuleSet};
use tracing::{debug, info};

use crate::context::{ClassificationContext, StageResult};
use crate::traits::PipelineStage;

pub const MISSING_FIELDS_REASON: &str = "Missing mandatory fields";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationState {
    Valid,
    Undetermined,
}

/// Outcome of mandatory validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub status: ValidationState,
    /// Deduplicated, sorted.
    pub missing_fields: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.status == ValidationState::Valid
    }
}

pub fn validate_mandatory(
    record: &CanonicalRecord,
    rules: &MandatoryRules,
    engine: &EngineConfig,
) -> ValidationReport {
    let mut missing = BTreeSet::new();
    let mut require = |field: &String| {
        if !record.has_field(field) {
            missing.insert(field.clone());
        }
    };

    rules.global.iter().for_each(&mut require);

    let identity = &record.project_identity;
    if let Some((_, sector)) = rules.sector.get_ignore_case(&identity.sector) {
        sector.common.iter().for_each(&mut require);

        if let Some((activity, fields)) = sector.activities.get_ignore_case(&identity.activity) {
            match engine.disjunctive_fields(activity) {
                Some(alternatives) => {
                    if !alternatives.iter().any(|field| record.has_field(field)) {
                        alternatives.iter().for_each(&mut require);
                    }
                }
                None => fields.iter().for_each(&mut require),
            }
        }
    }

    let missing_fields: Vec<String> = missing.into_iter().collect();
    let status = if missing_fields.is_empty() {
        ValidationState::Valid
    } else {
        ValidationState::Undetermined
    };
    ValidationReport {
        status,
        missing_fields,
    }
}

/// Stage 4 wrapper over [`validate_mandatory`].
pub struct MandatoryStage {
    rules: Arc<RuleSet>,
}

impl MandatoryStage {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl PipelineStage for MandatoryStage {
    fn stage_name(&self) -> &str {
        "Mandatory Validation"
    }

    fn stage_number(&self) -> u8 {
        4
    }

    async fn evaluate(&self, context: &mut ClassificationContext) -> StageResult {
        context.dump_record("before mandatory validation");

        let report = validate_mandatory(&context.record, &self.rules.mandatory, &self.rules.engine);
        if report.is_valid() {
            debug!("Mandatory fields present");
            return StageResult::Pass;
        }

        let status = &mut context.record.validation_status;
        status.missing_mandatory_fields = report.missing_fields.clone();
        status.is_valid_for_classification = false;

        info!(missing = ?report.missing_fields, "Classification undetermined");
        StageResult::Undetermined {
            reason: MISSING_FIELDS_REASON.to_string(),
            missing_fields: report.missing_fields,
        }
    }
}
