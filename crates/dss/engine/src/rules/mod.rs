//! Hierarchical rule matching with a bounded semantic fallback.
//!
//! `sector -> activity key -> ordered rules`. Within the matched activity
//! the first rule whose condition holds wins. When nothing matches, the
//! sector's similarity provider may correct the activity label once and
//! matching runs again; otherwise the result is the default B2.

pub mod condition;

use std::sync::Arc;

use dss_similarity::{SimilarityLookup, SimilarityMatch, SimilarityRegistry};
use dss_types::{
    normalize_key, ActivityMatchMode, CanonicalRecord, Decision, DssRule, RuleSet, SectorRules,
};
use tracing::{debug, info};

pub use condition::{evaluate, resolve_field, CAPACITY_METRICS};

/// Matching attempts per request: the original label plus one corrected label.
pub const MAX_MATCH_ATTEMPTS: usize = 2;

pub const NO_MATCH_REASON: &str = "No matching DSS rule";
pub const LOOKUP_UNAVAILABLE_REASON: &str = "No matching DSS rule (similarity lookup unavailable)";
const RULE_MATCHED_REASON: &str = "Rule matched";

/// Decision of the rule engine plus the similarity correction that led to it.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleOutcome {
    pub decision: Decision,
    /// Set when the activity label was rewritten by semantic similarity.
    pub provenance: Option<SimilarityMatch>,
}

impl RuleOutcome {
    fn new(decision: Decision, provenance: Option<SimilarityMatch>) -> Self {
        Self {
            decision,
            provenance,
        }
    }
}

/// The rule engine. Holds no per-request state; the record is only read.
#[derive(Clone, Debug)]
pub struct RuleEngine {
    rules: Arc<RuleSet>,
    similarity: Arc<SimilarityRegistry>,
}

impl RuleEngine {
    pub fn new(rules: Arc<RuleSet>, similarity: Arc<SimilarityRegistry>) -> Self {
        Self { rules, similarity }
    }

    pub async fn classify(&self, record: &CanonicalRecord) -> RuleOutcome {
        let sector = record.project_identity.sector_key();
        let Some(sector_rules) = self.rules.dss.sector(&sector) else {
            debug!(sector = %sector, "No rules for sector");
            return RuleOutcome::new(Decision::fallback(NO_MATCH_REASON), None);
        };

        let engine = &self.rules.engine;
        let mut activity = record.project_identity.activity_key();
        let mut provenance = None;
        let mut reason = NO_MATCH_REASON;

        for attempt in 1..=MAX_MATCH_ATTEMPTS {
            if let Some(decision) = self.match_rules(sector_rules, &activity, record) {
                return RuleOutcome::new(decision, provenance);
            }
            if attempt == MAX_MATCH_ATTEMPTS || activity.is_empty() {
                break;
            }

            let keys: Vec<String> = sector_rules.keys().map(str::to_string).collect();
            match self.similarity.nearest(&sector, &keys, &activity).await {
                SimilarityLookup::Match(found)
                    if found.score >= engine.similarity_threshold
                        && normalize_key(&found.key) != activity =>
                {
                    info!(
                        sector = %sector,
                        from = %activity,
                        to = %found.key,
                        score = found.score,
                        "Activity corrected by semantic similarity"
                    );
                    activity = normalize_key(&found.key);
                    provenance = Some(found);
                }
                SimilarityLookup::Match(found) => {
                    debug!(key = %found.key, score = found.score, "Similarity match not accepted");
                    break;
                }
                SimilarityLookup::NoMatch => break,
                SimilarityLookup::Unavailable(_) => {
                    reason = LOOKUP_UNAVAILABLE_REASON;
                    break;
                }
            }
        }

        RuleOutcome::new(Decision::fallback(reason), provenance)
    }

    /// First matching rule of the activity entry for `activity`.
    fn match_rules(
        &self,
        sector_rules: &SectorRules,
        activity: &str,
        record: &CanonicalRecord,
    ) -> Option<Decision> {
        let (key, rules) = match_activity(sector_rules, activity, self.rules.engine.activity_match_mode)?;
        let rule = first_match(rules, record)?;
        debug!(activity = %key, category = %rule.category, "DSS rule matched");
        Some(Decision::rule_matched(
            rule.category,
            rule.reason.as_deref().unwrap_or(RULE_MATCHED_REASON),
        ))
    }
}

/// Activity entry for `activity` under `mode`.
///
/// Exact matching compares case-insensitively. Contains matching prefers an
/// exact key, then the longest key contained in the activity, the earliest
/// declared winning ties.
pub fn match_activity<'a>(
    sector_rules: &'a SectorRules,
    activity: &str,
    mode: ActivityMatchMode,
) -> Option<(&'a str, &'a Vec<DssRule>)> {
    if activity.is_empty() {
        return None;
    }
    if let Some(exact) = sector_rules.get_ignore_case(activity) {
        return Some(exact);
    }
    match mode {
        ActivityMatchMode::Exact => None,
        ActivityMatchMode::Contains => {
            let activity = normalize_key(activity);
            sector_rules
                .iter()
                .filter(|(key, _)| {
                    let key = normalize_key(key);
                    !key.is_empty() && activity.contains(&key)
                })
                .fold(None, |best: Option<(&str, &Vec<DssRule>)>, candidate| match best {
                    Some((best_key, _)) if best_key.trim().len() >= candidate.0.trim().len() => best,
                    _ => Some(candidate),
                })
        }
    }
}

/// First rule, in declared order, that is unconditional or whose condition holds.
pub fn first_match<'a>(rules: &'a [DssRule], record: &CanonicalRecord) -> Option<&'a DssRule> {
    rules.iter().find(|rule| {
        rule.condition
            .as_ref()
            .map_or(true, |condition| evaluate(condition, record))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dss_similarity::StaticFactory;
    use dss_types::{Category, DecisionMode, DssRules, Keyed};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn record(document: Value) -> CanonicalRecord {
        let Value::Object(map) = document else {
            panic!("expected object")
        };
        CanonicalRecord::from_document(map)
    }

    fn dss() -> DssRules {
        serde_json::from_value(json!({
            "mining": {
                "stone quarry": [
                    {"condition": {"field": "max_mining_area_ha", "op": ">=", "value": 100}, "category": "A", "reason": "Quarry of 100 ha or more"},
                    {"condition": {"field": "max_mining_area_ha", "op": ">=", "value": 5}, "category": "B1", "reason": "Quarry of 5 to 100 ha"},
                    {"category": "B2", "reason": "Quarry below 5 ha"}
                ],
                "coal mining": [
                    {"condition": {"field": "coal_production_mtpa", "op": ">", "value": 8}, "category": "A"}
                ]
            },
            "industry": {
                "cement": [{"condition": {"field": "effective_capacity", "op": ">=", "value": 2}, "category": "A", "reason": "Cement plant of 2 MTPA or more"}],
                "cement grinding": [{"category": "B2", "reason": "Grinding unit"}]
            }
        }))
        .unwrap()
    }

    fn engine_with(factory: StaticFactory, mode: ActivityMatchMode) -> (RuleEngine, Arc<SimilarityRegistry>) {
        let mut rules = RuleSet {
            dss: dss(),
            ..RuleSet::default()
        };
        rules.engine.activity_match_mode = mode;
        let registry = Arc::new(SimilarityRegistry::new(Arc::new(factory)));
        (RuleEngine::new(Arc::new(rules), registry.clone()), registry)
    }

    fn engine(factory: StaticFactory) -> RuleEngine {
        engine_with(factory, ActivityMatchMode::Exact).0
    }

    fn quarry(activity: &str, area: f64) -> CanonicalRecord {
        record(json!({
            "project_identity": {"sector": "Mining", "activity": activity},
            "form1_part_a": {"max_mining_area_ha": area},
        }))
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let outcome = engine(StaticFactory::new()).classify(&quarry("Stone Quarry", 250.0)).await;
        assert_eq!(outcome.decision.category, Category::A);
        assert_eq!(outcome.decision.reason, "Quarry of 100 ha or more");
        assert_eq!(outcome.decision.confidence, 0.95);
        assert!(outcome.provenance.is_none());

        let outcome = engine(StaticFactory::new()).classify(&quarry("stone quarry", 2.0)).await;
        assert_eq!(outcome.decision.category, Category::B2);
        assert_eq!(outcome.decision.confidence, 0.9);
    }

    #[tokio::test]
    async fn unknown_sector_falls_back_without_lookup() {
        let factory = Arc::new(StaticFactory::new());
        let registry = Arc::new(SimilarityRegistry::new(factory.clone()));
        let rules = Arc::new(RuleSet {
            dss: dss(),
            ..RuleSet::default()
        });
        let engine = RuleEngine::new(rules, registry);

        let outcome = engine
            .classify(&record(json!({"project_identity": {"sector": "aviation", "activity": "airport"}})))
            .await;
        assert_eq!(outcome.decision, Decision::fallback(NO_MATCH_REASON));
        assert_eq!(factory.build_count(), 0);
    }

    #[tokio::test]
    async fn similarity_rewrites_activity_once() {
        let factory = StaticFactory::new().with_answer("limestone quarrying", "stone quarry", 0.91);
        let outcome = engine(factory).classify(&quarry("Limestone Quarrying", 20.0)).await;

        assert_eq!(outcome.decision.category, Category::B1);
        assert_eq!(outcome.decision.decision_mode, DecisionMode::RuleBased);
        assert_eq!(outcome.provenance, Some(SimilarityMatch::new("stone quarry", 0.91)));
    }

    #[tokio::test]
    async fn below_threshold_is_not_accepted() {
        let factory = StaticFactory::new().with_answer("gravel pit", "stone quarry", 0.84);
        let outcome = engine(factory).classify(&quarry("gravel pit", 20.0)).await;
        assert_eq!(outcome.decision, Decision::fallback(NO_MATCH_REASON));
        assert!(outcome.provenance.is_none());
    }

    #[tokio::test]
    async fn score_at_threshold_is_accepted() {
        let factory = StaticFactory::new().with_answer("gravel pit", "stone quarry", 0.85);
        let outcome = engine(factory).classify(&quarry("gravel pit", 20.0)).await;
        assert_eq!(outcome.decision.category, Category::B1);
        assert_eq!(outcome.provenance, Some(SimilarityMatch::new("stone quarry", 0.85)));
    }

    #[tokio::test]
    async fn rewrite_happens_at_most_once() {
        // The corrected label has no matching rule and would itself be
        // corrected again if a second rewrite were allowed.
        let factory = StaticFactory::new()
            .with_answer("open cast coal", "coal mining", 0.95)
            .with_answer("coal mining", "stone quarry", 0.99);
        let record = record(json!({"project_identity": {"sector": "mining", "activity": "open cast coal"}}));

        let outcome = engine(factory).classify(&record).await;
        assert_eq!(outcome.decision, Decision::fallback(NO_MATCH_REASON));
        assert_eq!(outcome.provenance, Some(SimilarityMatch::new("coal mining", 0.95)));
    }

    #[tokio::test]
    async fn same_key_is_not_a_correction() {
        let factory = StaticFactory::new().with_answer("coal mining", "Coal Mining", 1.0);
        let record = record(json!({"project_identity": {"sector": "mining", "activity": "coal mining"}}));
        let outcome = engine(factory).classify(&record).await;
        assert_eq!(outcome.decision.decision_mode, DecisionMode::DefaultFallback);
        assert!(outcome.provenance.is_none());
    }

    #[tokio::test]
    async fn unavailable_lookup_is_recorded_in_reason() {
        let outcome = engine(StaticFactory::new().failing_lookups())
            .classify(&quarry("gravel pit", 20.0))
            .await;
        assert_eq!(outcome.decision, Decision::fallback(LOOKUP_UNAVAILABLE_REASON));

        let outcome = engine(StaticFactory::new().failing_build())
            .classify(&quarry("gravel pit", 20.0))
            .await;
        assert_eq!(outcome.decision.reason, LOOKUP_UNAVAILABLE_REASON);
    }

    #[tokio::test]
    async fn contains_mode_prefers_longest_key() {
        let (engine, _) = engine_with(StaticFactory::new(), ActivityMatchMode::Contains);
        let record = record(json!({"project_identity": {"sector": "industry", "activity": "Clinker cement grinding unit"}}));
        let outcome = engine.classify(&record).await;
        assert_eq!(outcome.decision.reason, "Grinding unit");
    }

    #[tokio::test]
    async fn exact_mode_ignores_substrings() {
        let (engine, registry) = engine_with(StaticFactory::new(), ActivityMatchMode::Exact);
        let record = record(json!({"project_identity": {"sector": "industry", "activity": "cement grinding unit"}}));
        let outcome = engine.classify(&record).await;
        assert_eq!(outcome.decision.decision_mode, DecisionMode::DefaultFallback);
        assert_eq!(registry.constructed_sectors().await, vec!["industry".to_string()]);
    }

    #[test]
    fn contains_ties_go_to_declared_order() {
        let rules: SectorRules = Keyed::new(vec![
            ("kiln".into(), vec![]),
            ("mill".into(), vec![]),
        ]);
        let (key, _) = match_activity(&rules, "kiln and mill", ActivityMatchMode::Contains).unwrap();
        assert_eq!(key, "kiln");
    }

    proptest! {
        #[test]
        fn first_match_is_earliest_satisfied_rule(
            thresholds in proptest::collection::vec(0.0f64..100.0, 1..8),
            area in 0.0f64..100.0,
        ) {
            let rules: Vec<DssRule> = thresholds
                .iter()
                .enumerate()
                .map(|(i, t)| DssRule {
                    condition: Some(dss_types::Condition::Leaf {
                        field: "max_mining_area_ha".into(),
                        op: dss_types::ComparisonOp::Ge,
                        value: json!(t),
                    }),
                    category: Category::B1,
                    reason: Some(format!("rule {i}")),
                })
                .collect();
            let r = quarry("stone quarry", area);

            let expected = thresholds.iter().position(|t| area >= *t);
            let actual = first_match(&rules, &r)
                .and_then(|rule| rule.reason.as_deref())
                .map(|reason| reason.trim_start_matches("rule ").parse::<usize>().unwrap());
            prop_assert_eq!(actual, expected);
        }
    }
}
