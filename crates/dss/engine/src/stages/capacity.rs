//! Stage 2: Capacity Normalization
//!
//! Brings capacities into the sector's standard unit and derives
//! `total_effective_capacity`. Normalization is idempotent: applying it to
//! its own output changes nothing.

use std::sync::Arc;

use async_trait::async_trait;
use dss_types::{CanonicalRecord, Capacity, CapacityEntry, EngineConfig, RuleSet};
use tracing::{debug, warn};

use crate::context::{ClassificationContext, StageResult};
use crate::traits::PipelineStage;

const EXPANSION: &str = "expansion";
const NEW: &str = "new";

/// Whether `record` is subject to capacity normalization, and in which unit.
pub fn standard_unit<'a>(record: &CanonicalRecord, engine: &'a EngineConfig) -> Option<&'a str> {
    let identity = &record.project_identity;
    if engine.capacity.non_standard_unit(&identity.activity).is_some() {
        return None;
    }
    engine.capacity.standard_unit(&identity.sector)
}

/// Normalize the capacity block of `record` in place.
///
/// Returns `false` when the record is outside normalization (sector without
/// a standard unit, or an activity with its own unit). Such records are
/// left untouched.
pub fn normalize_capacity(record: &mut CanonicalRecord, engine: &EngineConfig) -> bool {
    let Some(unit) = standard_unit(record, engine) else {
        debug!(
            sector = %record.project_identity.sector,
            activity = %record.project_identity.activity,
            "Capacity normalization skipped"
        );
        return false;
    };

    let identity = &mut record.project_identity;
    let proposal = engine.canonical_proposal(&identity.type_of_proposal);
    if proposal != identity.proposal_key() {
        debug!(from = %identity.type_of_proposal, to = %proposal, "Proposal type normalized");
        identity.type_of_proposal = proposal.clone();
    }

    let form = &record.form1_part_a;
    let block = &mut record.capacity_normalization;
    for (slot, field) in [
        (&mut block.existing_capacity, "existing_capacity"),
        (&mut block.proposed_capacity, "proposed_capacity"),
    ] {
        let entry = slot
            .take()
            .or_else(|| form.get(field).and_then(CapacityEntry::from_value));
        *slot = entry.map(|e| CapacityEntry::Measured(e.into_measured(unit)));
    }

    let existing = block.existing_capacity.as_ref().and_then(CapacityEntry::as_measured);
    let proposed = block.proposed_capacity.as_ref().and_then(CapacityEntry::as_measured);
    block.total_effective_capacity = total_capacity(&proposal, existing, proposed, unit);
    true
}

/// `existing + proposed` for expansions, `proposed` for new projects.
///
/// Without a proposed capacity, or for any other proposal type, there is no
/// total.
fn total_capacity(
    proposal: &str,
    existing: Option<&Capacity>,
    proposed: Option<&Capacity>,
    default_unit: &str,
) -> Option<Capacity> {
    let proposed = proposed?;
    let unit = if proposed.unit.is_empty() {
        default_unit
    } else {
        proposed.unit.as_str()
    };

    match proposal {
        EXPANSION => {
            let existing_value = match existing {
                Some(existing) => {
                    if !existing.unit.is_empty() && existing.unit != unit {
                        warn!(
                            existing_unit = %existing.unit,
                            proposed_unit = %unit,
                            "Capacity units differ; summing values as-is"
                        );
                    }
                    existing.value
                }
                None => 0.0,
            };
            Some(Capacity::new(existing_value + proposed.value, unit))
        }
        NEW => Some(Capacity::new(proposed.value, unit)),
        _ => None,
    }
}

/// Stage 2 wrapper over [`normalize_capacity`]. Always passes.
pub struct CapacityStage {
    rules: Arc<RuleSet>,
}

impl CapacityStage {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl PipelineStage for CapacityStage {
    fn stage_name(&self) -> &str {
        "Capacity Normalization"
    }

    fn stage_number(&self) -> u8 {
        2
    }

    async fn evaluate(&self, context: &mut ClassificationContext) -> StageResult {
        if normalize_capacity(&mut context.record, &self.rules.engine) {
            debug!(
                total = ?context.record.capacity_normalization.total_effective_capacity,
                "Capacity normalized"
            );
        }
        StageResult::Pass
    }
}
