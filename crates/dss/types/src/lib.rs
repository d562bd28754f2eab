//! DSS Types: shared vocabulary of the classification pipeline.
//!
//! - [`record`]: the canonical project record threaded through every stage
//! - [`config`]: rule-set schemas (field mapping, overrides, mandatory fields,
//!   DSS rules) and engine knobs, loaded once at startup
//! - [`decision`]: categories, decision modes and the response envelope
//! - [`path`]: dot-path lookup/insert over JSON documents

pub mod config;
pub mod decision;
pub mod error;
pub mod path;
pub mod record;

pub use config::{
    AbsoluteOverride, ActivityMatchMode, ActivityOverride, CapacityConfig, ComparisonOp,
    Condition, DssRule, DssRules, EngineConfig, FieldMapping, FieldSpec, Keyed, MandatoryRules,
    OverrideRules, RuleSet, SectorMandatory, SectorRules, SimilarityConfig, ThresholdCondition,
    DSS_RULES_FILE, ENGINE_FILE, FIELD_MAPPING_FILE, MANDATORY_FIELDS_FILE, OVERRIDE_RULES_FILE,
};
pub use decision::{
    Category, Classification, ClassificationResponse, Decision, DecisionMode,
    DEFAULT_FALLBACK_CONFIDENCE, OVERRIDE_CONFIDENCE,
};
pub use error::ConfigError;
pub use record::{
    CanonicalRecord, Capacity, CapacityEntry, CapacityNormalization, DerivedParameters,
    normalize_key, ProjectIdentity, ValidationStatus, SEMANTIC_SIMILARITY,
};
