use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::CanonicalRecord;

/// Confidence attached to every override decision.
pub const OVERRIDE_CONFIDENCE: f64 = 1.0;
/// Confidence of the terminal B2 fallback.
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.6;
const RULE_CONFIDENCE: f64 = 0.95;
const RULE_B2_CONFIDENCE: f64 = 0.9;

/// Environmental-clearance category, from most to least severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    A,
    B1,
    B2,
}

impl Category {
    /// Authority that grants clearance for this category.
    pub fn clearance_authority(&self) -> &'static str {
        match self {
            Category::A => "MoEFCC",
            Category::B1 => "SEIAA",
            Category::B2 => "DEIAA",
        }
    }

    /// Body that appraises projects of this category.
    pub fn appraisal_body(&self) -> &'static str {
        match self {
            Category::A => "EAC",
            Category::B1 => "SEAC",
            Category::B2 => "DEAC",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::A => write!(f, "A"),
            Category::B1 => write!(f, "B1"),
            Category::B2 => write!(f, "B2"),
        }
    }
}

/// How a decision was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionMode {
    Override,
    RuleBased,
    DefaultFallback,
}

impl fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionMode::Override => write!(f, "OVERRIDE"),
            DecisionMode::RuleBased => write!(f, "RULE_BASED"),
            DecisionMode::DefaultFallback => write!(f, "DEFAULT_FALLBACK"),
        }
    }
}

/// A category decision before authority metadata is attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub category: Category,
    pub decision_mode: DecisionMode,
    pub reason: String,
    pub confidence: f64,
}

impl Decision {
    /// Forced category A from an override rule.
    pub fn overridden(reason: impl Into<String>) -> Self {
        Self {
            category: Category::A,
            decision_mode: DecisionMode::Override,
            reason: reason.into(),
            confidence: OVERRIDE_CONFIDENCE,
        }
    }

    /// Category selected by a matching DSS rule.
    pub fn rule_matched(category: Category, reason: impl Into<String>) -> Self {
        let confidence = match category {
            Category::B2 => RULE_B2_CONFIDENCE,
            Category::A | Category::B1 => RULE_CONFIDENCE,
        };
        Self {
            category,
            decision_mode: DecisionMode::RuleBased,
            reason: reason.into(),
            confidence,
        }
    }

    /// Conservative B2 outcome when no rule applies.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            category: Category::B2,
            decision_mode: DecisionMode::DefaultFallback,
            reason: reason.into(),
            confidence: DEFAULT_FALLBACK_CONFIDENCE,
        }
    }
}

/// A completed classification with authority metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub decision_mode: DecisionMode,
    pub reason: String,
    pub confidence: f64,
    pub clearance_authority: String,
    pub appraisal_body: String,
    /// Echo of the canonical record, only in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_project: Option<CanonicalRecord>,
}

impl Classification {
    pub fn new(decision: Decision) -> Self {
        Self {
            clearance_authority: decision.category.clearance_authority().to_string(),
            appraisal_body: decision.category.appraisal_body().to_string(),
            category: decision.category,
            decision_mode: decision.decision_mode,
            reason: decision.reason,
            confidence: decision.confidence,
            canonical_project: None,
        }
    }
}

/// Response envelope of one classification request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationResponse {
    /// A category was assigned.
    Classified(Classification),
    /// More data is needed before a category can be assigned.
    Undetermined {
        reason: String,
        missing_fields: Vec<String>,
    },
}

impl ClassificationResponse {
    pub fn is_classified(&self) -> bool {
        matches!(self, ClassificationResponse::Classified(_))
    }

    /// The classification, if one was made.
    pub fn classification(&self) -> Option<&Classification> {
        match self {
            ClassificationResponse::Classified(c) => Some(c),
            ClassificationResponse::Undetermined { .. } => None,
        }
    }

    /// Missing fields of an undetermined response (empty otherwise).
    pub fn missing_fields(&self) -> &[String] {
        match self {
            ClassificationResponse::Classified(_) => &[],
            ClassificationResponse::Undetermined { missing_fields, .. } => missing_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn confidence_table() {
        assert_eq!(Decision::rule_matched(Category::A, "r").confidence, 0.95);
        assert_eq!(Decision::rule_matched(Category::B1, "r").confidence, 0.95);
        assert_eq!(Decision::rule_matched(Category::B2, "r").confidence, 0.9);
        assert_eq!(Decision::overridden("r").confidence, 1.0);
        assert_eq!(Decision::fallback("r").confidence, 0.6);
    }

    #[test]
    fn authority_lookup() {
        assert_eq!(Category::A.clearance_authority(), "MoEFCC");
        assert_eq!(Category::A.appraisal_body(), "EAC");
        assert_eq!(Category::B1.clearance_authority(), "SEIAA");
        assert_eq!(Category::B1.appraisal_body(), "SEAC");
        assert_eq!(Category::B2.clearance_authority(), "DEIAA");
        assert_eq!(Category::B2.appraisal_body(), "DEAC");
    }

    #[test]
    fn classified_response_shape() {
        let response = ClassificationResponse::Classified(Classification::new(
            Decision::rule_matched(Category::A, "Cement >= 2 MTPA"),
        ));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "CLASSIFIED",
                "category": "A",
                "decision_mode": "RULE_BASED",
                "reason": "Cement >= 2 MTPA",
                "confidence": 0.95,
                "clearance_authority": "MoEFCC",
                "appraisal_body": "EAC",
            })
        );
    }

    #[test]
    fn undetermined_response_shape() {
        let response = ClassificationResponse::Undetermined {
            reason: "Missing mandatory fields".into(),
            missing_fields: vec!["effective_capacity".into()],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "UNDETERMINED");
        assert_eq!(value["missing_fields"], json!(["effective_capacity"]));
        assert!(response.classification().is_none());
    }
}
