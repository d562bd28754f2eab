pub mod capacity;
pub mod derived;
pub mod mandatory;
pub mod mapping;
pub mod overrides;
pub mod rules;

pub use capacity::CapacityStage;
pub use derived::DerivedParametersStage;
pub use mandatory::MandatoryStage;
pub use overrides::OverrideStage;
pub use rules::RuleEvaluationStage;
