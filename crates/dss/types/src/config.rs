//! Rule-set schemas.
//!
//! A rule set is four JSON documents loaded from one directory at startup,
//! plus an optional `engine.json` with engine knobs:
//!
//! | File | Type |
//! |---|---|
//! | `field_mapping.json` | [`FieldMapping`] |
//! | `mandatory_fields.json` | [`MandatoryRules`] |
//! | `override_rules.json` | [`OverrideRules`] |
//! | `dss_rules.json` | [`DssRules`] |
//! | `engine.json` (optional) | [`EngineConfig`] |
//!
//! Any load or validation failure is fatal; there is no partial rule set.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::info;

use crate::decision::Category;
use crate::error::ConfigError;
use crate::record::normalize_key;

pub const FIELD_MAPPING_FILE: &str = "field_mapping.json";
pub const MANDATORY_FIELDS_FILE: &str = "mandatory_fields.json";
pub const OVERRIDE_RULES_FILE: &str = "override_rules.json";
pub const DSS_RULES_FILE: &str = "dss_rules.json";
pub const ENGINE_FILE: &str = "engine.json";

// ---------------------------------------------------------------------------
// Ordered maps
// ---------------------------------------------------------------------------

/// A JSON object read as an ordered list of entries.
///
/// Declared order is significant for field mappings and rule activity keys,
/// so entries are kept exactly as they appear in the document.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyed<T>(Vec<(String, T)>);

impl<T> Keyed<T> {
    pub fn new(entries: Vec<(String, T)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter().map(|(_, v)| v)
    }

    /// First entry whose key equals `key` case-insensitively.
    pub fn get_ignore_case(&self, key: &str) -> Option<(&str, &T)> {
        let wanted = normalize_key(key);
        self.iter().find(|(k, _)| normalize_key(k) == wanted)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> FromIterator<(String, T)> for Keyed<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
            type Value = Keyed<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(Keyed(entries))
            }
        }

        deserializer.deserialize_map(KeyedVisitor(PhantomData))
    }
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

/// Where a canonical field comes from and where it lands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Candidate dot-paths into the raw submission, tried in order.
    pub sources: Vec<String>,
    /// Dot-path in the canonical record.
    pub canonical_path: String,
}

/// `canonical_field_name -> FieldSpec`, in declared order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(pub Keyed<FieldSpec>);

impl FieldMapping {
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Mandatory fields
// ---------------------------------------------------------------------------

/// Mandatory fields of one sector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorMandatory {
    #[serde(default)]
    pub common: Vec<String>,
    #[serde(default)]
    pub activities: Keyed<Vec<String>>,
}

/// Three-tier mandatory field configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MandatoryRules {
    #[serde(default)]
    pub global: Vec<String>,
    #[serde(default)]
    pub sector: Keyed<SectorMandatory>,
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Numeric comparison used by override triggers and rule conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
}

impl ComparisonOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Ge => lhs >= rhs,
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Le => lhs <= rhs,
            ComparisonOp::Eq => lhs == rhs,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Eq => "==",
        };
        f.write_str(symbol)
    }
}

/// `{operator, value}` threshold of an absolute override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCondition {
    pub operator: ComparisonOp,
    pub value: f64,
}

/// Forces category A when a canonical field matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteOverride {
    pub canonical_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_condition: Option<ThresholdCondition>,
    pub reason: String,
}

/// Forces category A when the activity contains a token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityOverride {
    pub activity_contains: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideRules {
    #[serde(default)]
    pub absolute_overrides: Vec<AbsoluteOverride>,
    #[serde(default)]
    pub activity_overrides: Vec<ActivityOverride>,
}

// ---------------------------------------------------------------------------
// DSS rules
// ---------------------------------------------------------------------------

/// Guard of a DSS rule.
///
/// Conjunction has no operator; it is expressed by rule ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Holds when any nested condition holds.
    Any { any: Vec<Condition> },
    /// `{field, op, value}` numeric comparison.
    Leaf {
        field: String,
        op: ComparisonOp,
        value: Value,
    },
}

/// One entry of an activity's ordered rule list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DssRule {
    /// `None` means the rule always matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Ordered rules of every activity key in one sector.
pub type SectorRules = Keyed<Vec<DssRule>>;

/// `sector -> activity_key -> [rule]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DssRules(pub Keyed<SectorRules>);

impl DssRules {
    /// Rules of a sector, matched case-insensitively.
    pub fn sector(&self, sector: &str) -> Option<&SectorRules> {
        self.0.get_ignore_case(sector).map(|(_, rules)| rules)
    }

    pub fn sectors(&self) -> impl Iterator<Item = (&str, &SectorRules)> {
        self.0.iter()
    }

    pub fn activity_count(&self) -> usize {
        self.0.values().map(Keyed::len).sum()
    }

    pub fn rule_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|sector| sector.values())
            .map(Vec::len)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Engine knobs
// ---------------------------------------------------------------------------

/// How a reported activity is matched against configured activity keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityMatchMode {
    /// Case-insensitive equality.
    #[default]
    Exact,
    /// Equality first, then the longest key contained in the activity.
    Contains,
}

/// Capacity normalization gating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Sectors whose capacities are normalized, with their standard unit.
    pub standard_units: BTreeMap<String, String>,
    /// Activities measured in their own unit; never normalized.
    pub non_standard_activities: BTreeMap<String, String>,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            standard_units: BTreeMap::from([("industry".to_string(), "MTPA".to_string())]),
            non_standard_activities: BTreeMap::from([(
                "paper mill".to_string(),
                "TPD".to_string(),
            )]),
        }
    }
}

impl CapacityConfig {
    pub fn standard_unit(&self, sector: &str) -> Option<&str> {
        lookup_ignore_case(&self.standard_units, sector).map(String::as_str)
    }

    pub fn non_standard_unit(&self, activity: &str) -> Option<&str> {
        lookup_ignore_case(&self.non_standard_activities, activity).map(String::as_str)
    }
}

/// Embedding service used for semantic activity matching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// When false, semantic fallback never matches.
    pub enabled: bool,
    /// Embedding endpoint URL.
    pub endpoint: Option<String>,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    /// How long a failed provider construction is remembered per sector.
    pub failure_cooldown_ms: u64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            model: "embed-english-v3.0".to_string(),
            api_key_env: None,
            timeout_ms: 10_000,
            failure_cooldown_ms: 30_000,
        }
    }
}

/// Engine behaviour knobs (`engine.json`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub activity_match_mode: ActivityMatchMode,
    /// Minimum similarity score for an activity rewrite.
    pub similarity_threshold: f64,
    /// Confidence ceiling of a similarity-assisted classification.
    pub similarity_confidence_cap: f64,
    /// Proposal type synonyms, e.g. `greenfield -> new`.
    pub proposal_synonyms: BTreeMap<String, String>,
    pub capacity: CapacityConfig,
    /// Activities satisfied by any one of the listed fields.
    pub disjunctive_activities: BTreeMap<String, Vec<String>>,
    pub similarity: SimilarityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activity_match_mode: ActivityMatchMode::Exact,
            similarity_threshold: 0.85,
            similarity_confidence_cap: 0.85,
            proposal_synonyms: BTreeMap::from([("greenfield".to_string(), "new".to_string())]),
            capacity: CapacityConfig::default(),
            disjunctive_activities: BTreeMap::from([(
                "hydroelectric project".to_string(),
                vec!["hydro_capacity_mw".to_string(), "dam_height_m".to_string()],
            )]),
            similarity: SimilarityConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Canonical proposal type for a (normalized) proposal key.
    pub fn canonical_proposal(&self, proposal: &str) -> String {
        lookup_ignore_case(&self.proposal_synonyms, proposal)
            .map(|canonical| normalize_key(canonical))
            .unwrap_or_else(|| normalize_key(proposal))
    }

    /// Alternative fields of a disjunctive activity.
    pub fn disjunctive_fields(&self, activity: &str) -> Option<&[String]> {
        lookup_ignore_case(&self.disjunctive_activities, activity).map(Vec::as_slice)
    }
}

fn lookup_ignore_case<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<&'a V> {
    let wanted = normalize_key(key);
    map.iter()
        .find(|(k, _)| normalize_key(k) == wanted)
        .map(|(_, v)| v)
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// Everything the pipeline needs, loaded once and shared read-only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet {
    pub field_mapping: FieldMapping,
    pub mandatory: MandatoryRules,
    pub overrides: OverrideRules,
    pub dss: DssRules,
    pub engine: EngineConfig,
}

impl RuleSet {
    /// Load and validate a rule set from a configuration directory.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let engine_path = dir.join(ENGINE_FILE);
        let engine = if engine_path.exists() {
            read_json(&engine_path)?
        } else {
            EngineConfig::default()
        };

        let rules = Self {
            field_mapping: read_json(&dir.join(FIELD_MAPPING_FILE))?,
            mandatory: read_json(&dir.join(MANDATORY_FIELDS_FILE))?,
            overrides: read_json(&dir.join(OVERRIDE_RULES_FILE))?,
            dss: read_json(&dir.join(DSS_RULES_FILE))?,
            engine,
        };
        rules.validate()?;

        info!(
            dir = %dir.display(),
            mapped_fields = rules.field_mapping.0.len(),
            sectors = rules.dss.0.len(),
            activities = rules.dss.activity_count(),
            rules = rules.dss.rule_count(),
            "Rule set loaded"
        );
        Ok(rules)
    }

    /// Structural checks the schemas alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, entry) in self.field_mapping.fields() {
            if entry.sources.is_empty() {
                return Err(ConfigError::invalid(
                    FIELD_MAPPING_FILE,
                    format!("field '{name}' has no sources"),
                ));
            }
            if entry.canonical_path.trim().is_empty() {
                return Err(ConfigError::invalid(
                    FIELD_MAPPING_FILE,
                    format!("field '{name}' has an empty canonical_path"),
                ));
            }
        }

        for rule in &self.overrides.absolute_overrides {
            match (&rule.trigger_value, &rule.trigger_condition) {
                (Some(_), None) => {}
                (None, Some(condition)) if condition.operator != ComparisonOp::Eq => {}
                (None, Some(_)) => {
                    return Err(ConfigError::invalid(
                        OVERRIDE_RULES_FILE,
                        format!(
                            "override on '{}' uses '==' in trigger_condition; use trigger_value",
                            rule.canonical_path
                        ),
                    ));
                }
                _ => {
                    return Err(ConfigError::invalid(
                        OVERRIDE_RULES_FILE,
                        format!(
                            "override on '{}' needs exactly one of trigger_value or trigger_condition",
                            rule.canonical_path
                        ),
                    ));
                }
            }
        }
        if let Some(rule) = self
            .overrides
            .activity_overrides
            .iter()
            .find(|rule| rule.activity_contains.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                OVERRIDE_RULES_FILE,
                format!("activity override '{}' has an empty token", rule.reason),
            ));
        }

        for (sector, activities) in self.dss.sectors() {
            for (activity, rules) in activities.iter() {
                for condition in rules.iter().filter_map(|r| r.condition.as_ref()) {
                    check_condition(condition).map_err(|reason| {
                        ConfigError::invalid(DSS_RULES_FILE, format!("{sector}/{activity}: {reason}"))
                    })?;
                }
            }
        }

        let engine = &self.engine;
        for (name, value) in [
            ("similarity_threshold", engine.similarity_threshold),
            ("similarity_confidence_cap", engine.similarity_confidence_cap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(
                    ENGINE_FILE,
                    format!("{name} must be within [0, 1], got {value}"),
                ));
            }
        }
        if engine.similarity.enabled && engine.similarity.endpoint.is_none() {
            return Err(ConfigError::invalid(
                ENGINE_FILE,
                "similarity is enabled but no endpoint is configured",
            ));
        }

        Ok(())
    }
}

fn check_condition(condition: &Condition) -> Result<(), String> {
    match condition {
        Condition::Any { any } if any.is_empty() => Err("empty 'any' condition".to_string()),
        Condition::Any { any } => any.iter().try_for_each(check_condition),
        Condition::Leaf { field, .. } if field.trim().is_empty() => {
            Err("condition without a field".to_string())
        }
        Condition::Leaf { .. } => Ok(()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELD_MAPPING: &str = r#"{
        "sector": {"sources": ["sector", "project.sector"], "canonical_path": "project_identity.sector"},
        "activity": {"sources": ["activity"], "canonical_path": "project_identity.activity"}
    }"#;
    const MANDATORY: &str = r#"{"global": ["sector"], "sector": {"industry": {"common": ["type_of_proposal"]}}}"#;
    const OVERRIDES: &str = r#"{"activity_overrides": [{"activity_contains": "nuclear", "reason": "Nuclear"}]}"#;
    const DSS: &str = r#"{
        "industry": {
            "cement": [
                {"condition": {"field": "effective_capacity", "op": ">=", "value": 2}, "category": "A", "reason": "big"},
                {"category": "B1", "reason": "small"}
            ],
            "steel plant": [{"category": "B1"}]
        }
    }"#;

    fn write_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn complete_dir() -> tempfile::TempDir {
        write_dir(&[
            (FIELD_MAPPING_FILE, FIELD_MAPPING),
            (MANDATORY_FIELDS_FILE, MANDATORY),
            (OVERRIDE_RULES_FILE, OVERRIDES),
            (DSS_RULES_FILE, DSS),
        ])
    }

    #[test]
    fn load_dir_reads_all_files() {
        let dir = complete_dir();
        let rules = RuleSet::load_dir(dir.path()).unwrap();

        let fields: Vec<&str> = rules.field_mapping.fields().map(|(name, _)| name).collect();
        assert_eq!(fields, vec!["sector", "activity"]);
        assert_eq!(rules.mandatory.global, vec!["sector".to_string()]);
        assert_eq!(rules.overrides.activity_overrides.len(), 1);
        assert_eq!(rules.dss.rule_count(), 3);
        assert_eq!(rules.engine, EngineConfig::default());
    }

    #[test]
    fn declared_order_is_preserved() {
        let rules: DssRules = serde_json::from_str(
            r#"{"mining": {"zeta": [], "alpha": [], "mid": []}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = rules.sector("MINING").unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn conditions_parse_leaf_and_any() {
        let condition: Condition = serde_json::from_value(json!({
            "any": [
                {"field": "road_length_km", "op": ">", "value": 100},
                {"field": "built_up_area_sqm", "op": ">=", "value": "150000"}
            ]
        }))
        .unwrap();
        match condition {
            Condition::Any { any } => assert_eq!(any.len(), 2),
            other => panic!("expected any, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = write_dir(&[(FIELD_MAPPING_FILE, FIELD_MAPPING)]);
        let err = RuleSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let dir = complete_dir();
        std::fs::write(dir.path().join(DSS_RULES_FILE), "{ not json").unwrap();
        let err = RuleSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_category_is_fatal() {
        let dir = complete_dir();
        std::fs::write(
            dir.path().join(DSS_RULES_FILE),
            r#"{"industry": {"cement": [{"category": "C"}]}}"#,
        )
        .unwrap();
        assert!(matches!(
            RuleSet::load_dir(dir.path()).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn override_without_trigger_is_invalid() {
        let dir = complete_dir();
        std::fs::write(
            dir.path().join(OVERRIDE_RULES_FILE),
            r#"{"absolute_overrides": [{"canonical_path": "a.b", "reason": "r"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            RuleSet::load_dir(dir.path()).unwrap_err(),
            ConfigError::Invalid { file: OVERRIDE_RULES_FILE, .. }
        ));
    }

    #[test]
    fn empty_any_is_invalid() {
        let dir = complete_dir();
        std::fs::write(
            dir.path().join(DSS_RULES_FILE),
            r#"{"industry": {"cement": [{"condition": {"any": []}, "category": "A"}]}}"#,
        )
        .unwrap();
        assert!(matches!(
            RuleSet::load_dir(dir.path()).unwrap_err(),
            ConfigError::Invalid { file: DSS_RULES_FILE, .. }
        ));
    }

    #[test]
    fn engine_file_overrides_defaults() {
        let dir = complete_dir();
        std::fs::write(
            dir.path().join(ENGINE_FILE),
            r#"{"activity_match_mode": "contains", "similarity_threshold": 0.9}"#,
        )
        .unwrap();
        let rules = RuleSet::load_dir(dir.path()).unwrap();
        assert_eq!(rules.engine.activity_match_mode, ActivityMatchMode::Contains);
        assert_eq!(rules.engine.similarity_threshold, 0.9);
        assert_eq!(rules.engine.similarity_confidence_cap, 0.85);
        assert_eq!(rules.engine.capacity.standard_unit("Industry"), Some("MTPA"));
    }

    #[test]
    fn proposal_synonyms() {
        let engine = EngineConfig::default();
        assert_eq!(engine.canonical_proposal("greenfield"), "new");
        assert_eq!(engine.canonical_proposal("Greenfield"), "new");
        assert_eq!(engine.canonical_proposal("expansion"), "expansion");
    }

    #[test]
    fn comparison_ops() {
        assert!(ComparisonOp::Ge.apply(2.0, 2.0));
        assert!(!ComparisonOp::Gt.apply(2.0, 2.0));
        assert!(ComparisonOp::Lt.apply(1.0, 2.0));
        assert!(ComparisonOp::Le.apply(2.0, 2.0));
        assert!(ComparisonOp::Eq.apply(3.0, 3.0));
    }
}
