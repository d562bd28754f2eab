//! DSS Engine: environmental-clearance classification pipeline.
//!
//! ## Stages
//!
//! 0. **Field Mapping**: raw submission into a canonical record
//! 1. **Override Evaluation**: forced category A, ends the run
//! 2. **Capacity Normalization**: structured capacities and their total
//! 3. **Derived Parameters**: scalars read by rule conditions
//! 4. **Mandatory Validation**: `UNDETERMINED` ends the run
//! 5. **Rule Evaluation**: first matching DSS rule, semantic fallback,
//!    default B2
//!
//! Field mapping builds the record and so runs ahead of the staged loop.
//! The remaining stages implement [`PipelineStage`] and run in order over a
//! [`ClassificationContext`].
//!
//! ## Invariants
//!
//! - An override decision is final: no later stage runs.
//! - Capacity totals are never invented. An underivable total stays absent.
//! - Rule lists are first-match-wins, in declared order.
//! - The activity label is rewritten by semantic similarity at most once.
//! - Similarity-assisted classifications report confidence at most the
//!   configured cap.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod rules;
pub mod stages;
pub mod traits;

pub use context::{ClassificationContext, StageResult};
pub use error::PipelineError;
pub use pipeline::{similarity_registry, Pipeline};
pub use rules::{RuleEngine, RuleOutcome};
pub use stages::mandatory::{validate_mandatory, ValidationReport, ValidationState};
pub use stages::mapping::map_fields;
pub use stages::{
    CapacityStage, DerivedParametersStage, MandatoryStage, OverrideStage, RuleEvaluationStage,
};
pub use traits::PipelineStage;
