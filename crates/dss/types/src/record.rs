//! The canonical project record.
//!
//! Created by the field mapper from a raw submission, enriched in place by
//! the later stages, and discarded once the response is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path;

/// Provenance marker written when the activity label was corrected by
/// semantic similarity.
pub const SEMANTIC_SIMILARITY: &str = "semantic_similarity";

/// Depth bound of the generic presence scan.
const MAX_SCAN_DEPTH: usize = 16;

/// Case-insensitive comparison key for sectors, activities and proposals.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Sector, activity and proposal type of a project.
///
/// Display casing is preserved; use the `*_key` accessors for comparisons.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectIdentity {
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub type_of_proposal: String,
    /// Other identity attributes (state, district, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectIdentity {
    pub fn sector_key(&self) -> String {
        normalize_key(&self.sector)
    }

    pub fn activity_key(&self) -> String {
        normalize_key(&self.activity)
    }

    pub fn proposal_key(&self) -> String {
        normalize_key(&self.type_of_proposal)
    }

    fn from_object(mut map: Map<String, Value>) -> Self {
        Self {
            sector: map.remove("sector").map(text).unwrap_or_default(),
            activity: map.remove("activity").map(text).unwrap_or_default(),
            type_of_proposal: map.remove("type_of_proposal").map(text).unwrap_or_default(),
            extra: map,
        }
    }
}

/// A measured capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

impl Capacity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// A capacity slot as submitted: either already measured, or a bare number
/// awaiting its unit from the capacity normalizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapacityEntry {
    Measured(Capacity),
    Bare(f64),
}

impl CapacityEntry {
    pub fn value(&self) -> f64 {
        match self {
            CapacityEntry::Measured(c) => c.value,
            CapacityEntry::Bare(v) => *v,
        }
    }

    /// The measured form, if the unit is already known.
    pub fn as_measured(&self) -> Option<&Capacity> {
        match self {
            CapacityEntry::Measured(c) => Some(c),
            CapacityEntry::Bare(_) => None,
        }
    }

    /// Attach `default_unit` to a bare number; measured entries are kept.
    pub fn into_measured(self, default_unit: &str) -> Capacity {
        match self {
            CapacityEntry::Measured(c) => c,
            CapacityEntry::Bare(v) => Capacity::new(v, default_unit),
        }
    }

    /// Lenient reading of a submitted capacity value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let amount = map.get("value").and_then(path::as_number)?;
                match map.get("unit").and_then(Value::as_str) {
                    Some(unit) if !unit.trim().is_empty() => {
                        Some(CapacityEntry::Measured(Capacity::new(amount, unit.trim())))
                    }
                    _ => Some(CapacityEntry::Bare(amount)),
                }
            }
            other => path::as_number(other).map(CapacityEntry::Bare),
        }
    }
}

/// Capacity block maintained by the capacity normalizer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityNormalization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_capacity: Option<CapacityEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_capacity: Option<CapacityEntry>,
    /// `None` means no capacity could be derived; it is never read as zero.
    #[serde(default)]
    pub total_effective_capacity: Option<Capacity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CapacityNormalization {
    fn from_object(mut map: Map<String, Value>) -> Self {
        let mut entry = |key: &str| map.remove(key).as_ref().and_then(CapacityEntry::from_value);
        let existing_capacity = entry("existing_capacity");
        let proposed_capacity = entry("proposed_capacity");
        let total_effective_capacity = entry("total_effective_capacity")
            .and_then(|e| e.as_measured().cloned());
        Self {
            existing_capacity,
            proposed_capacity,
            total_effective_capacity,
            extra: map,
        }
    }
}

/// Scalars computed for the rule engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_matched_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// Numeric form fields propagated for rule conditions.
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl DerivedParameters {
    /// Numeric parameter by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "effective_capacity" => self.effective_capacity,
            "similarity_score" => self.similarity_score,
            _ => self.values.get(name).copied(),
        }
    }

    /// Whether a parameter of this name exists.
    pub fn contains(&self, name: &str) -> bool {
        match name {
            "activity_matched_by" => self.activity_matched_by.is_some(),
            _ => self.get(name).is_some(),
        }
    }

    /// Set a parameter unless it already has a value.
    ///
    /// Similarity provenance is only written by [`Self::record_similarity`];
    /// its names are ignored here.
    pub fn insert_if_absent(&mut self, name: &str, value: f64) {
        match name {
            "effective_capacity" => {
                self.effective_capacity.get_or_insert(value);
            }
            "activity_matched_by" | "similarity_score" => {}
            _ => {
                self.values.entry(name.to_string()).or_insert(value);
            }
        }
    }

    /// Record that the activity label was corrected by semantic similarity.
    pub fn record_similarity(&mut self, score: f64) {
        self.activity_matched_by = Some(SEMANTIC_SIMILARITY.to_string());
        self.similarity_score = Some(score);
    }

    pub fn matched_by_similarity(&self) -> bool {
        self.activity_matched_by.as_deref() == Some(SEMANTIC_SIMILARITY)
    }

    /// Inbound provenance is dropped: a submission cannot claim a
    /// similarity rewrite the engine did not make.
    fn from_object(map: Map<String, Value>) -> Self {
        let mut derived = Self::default();
        for (key, value) in map {
            if let Some(number) = path::as_number(&value) {
                derived.insert_if_absent(&key, number);
            }
        }
        derived
    }
}

/// Completeness state of the record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatus {
    #[serde(default)]
    pub missing_mandatory_fields: Vec<String>,
    #[serde(default = "default_true")]
    pub is_valid_for_classification: bool,
}

impl Default for ValidationStatus {
    fn default() -> Self {
        Self {
            missing_mandatory_fields: Vec::new(),
            is_valid_for_classification: true,
        }
    }
}

impl ValidationStatus {
    /// Append a missing field and mark the record unclassifiable.
    pub fn mark_missing(&mut self, field: impl Into<String>) {
        self.missing_mandatory_fields.push(field.into());
        self.is_valid_for_classification = false;
    }
}

fn default_true() -> bool {
    true
}

/// The canonical project record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(default)]
    pub project_identity: ProjectIdentity,
    #[serde(default)]
    pub form1_part_a: Map<String, Value>,
    #[serde(default)]
    pub capacity_normalization: CapacityNormalization,
    #[serde(default)]
    pub derived_parameters: DerivedParameters,
    #[serde(default)]
    pub validation_status: ValidationStatus,
    /// Read-only passthrough of sensitivity flags and areas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environmental_sensitivity: Option<Value>,
    /// Any other top-level attribute written by the field mapping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanonicalRecord {
    /// Build a record from the document assembled by the field mapper.
    ///
    /// Never fails. Sections of the wrong shape are dropped, and values
    /// that cannot be read in a typed slot are left out of it.
    pub fn from_document(document: Map<String, Value>) -> Self {
        let mut record = Self::default();
        for (key, value) in document {
            match (Section::of(&key), value) {
                (Some(Section::Identity), Value::Object(map)) => {
                    record.project_identity = ProjectIdentity::from_object(map);
                }
                (Some(Section::Form), Value::Object(map)) => record.form1_part_a = map,
                (Some(Section::Capacity), Value::Object(map)) => {
                    record.capacity_normalization = CapacityNormalization::from_object(map);
                }
                (Some(Section::Derived), Value::Object(map)) => {
                    record.derived_parameters = DerivedParameters::from_object(map);
                }
                (Some(Section::Sensitivity), value) => {
                    record.environmental_sensitivity = path::is_present(&value).then_some(value);
                }
                (Some(_), value) => {
                    tracing::debug!(section = %key, value = %value, "ignoring record section");
                }
                (None, value) => {
                    record.extra.insert(key, value);
                }
            }
        }
        record
    }

    /// JSON view of the whole record.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Resolve a dot-path against the serialized record.
    pub fn lookup(&self, dot_path: &str) -> Option<Value> {
        path::lookup(&self.to_value(), dot_path).cloned()
    }

    /// A raw form attribute, `None` when absent, null or empty.
    pub fn form_value(&self, field: &str) -> Option<&Value> {
        self.form1_part_a.get(field).filter(|v| path::is_present(v))
    }

    /// A top-level attribute outside the typed sections.
    pub fn top_level(&self, field: &str) -> Option<&Value> {
        self.extra.get(field).filter(|v| path::is_present(v))
    }

    /// Whether `field` holds a present value anywhere in the record.
    ///
    /// Known fields are read from their typed location; other names fall
    /// back to a bounded scan of the whole record for a key of that name.
    pub fn has_field(&self, field: &str) -> bool {
        if let Some(present) = self.known_field(field) {
            return present;
        }
        contains_key(&self.to_value(), field, MAX_SCAN_DEPTH)
    }

    fn known_field(&self, field: &str) -> Option<bool> {
        let identity = &self.project_identity;
        let capacity = &self.capacity_normalization;
        let present = match field {
            "sector" => !identity.sector.trim().is_empty(),
            "activity" => !identity.activity.trim().is_empty(),
            "type_of_proposal" => !identity.type_of_proposal.trim().is_empty(),
            "existing_capacity" => {
                capacity.existing_capacity.is_some() || self.form_value(field).is_some()
            }
            "proposed_capacity" => {
                capacity.proposed_capacity.is_some() || self.form_value(field).is_some()
            }
            "total_effective_capacity" => capacity.total_effective_capacity.is_some(),
            "effective_capacity" => {
                self.derived_parameters.effective_capacity.is_some()
                    || self.form_value(field).is_some()
            }
            "activity_matched_by" | "similarity_score" => self.derived_parameters.contains(field),
            _ => return None,
        };
        Some(present)
    }
}

#[derive(Clone, Copy)]
enum Section {
    Identity,
    Form,
    Capacity,
    Derived,
    Validation,
    Sensitivity,
}

impl Section {
    fn of(key: &str) -> Option<Self> {
        match key {
            "project_identity" => Some(Section::Identity),
            "form1_part_a" => Some(Section::Form),
            "capacity_normalization" => Some(Section::Capacity),
            "derived_parameters" => Some(Section::Derived),
            "validation_status" => Some(Section::Validation),
            "environmental_sensitivity" => Some(Section::Sensitivity),
            _ => None,
        }
    }
}

fn contains_key(value: &Value, field: &str, depth: usize) -> bool {
    if depth == 0 {
        return false;
    }
    match value {
        Value::Object(map) => map.iter().any(|(key, child)| {
            (key == field && path::is_present(child)) || contains_key(child, field, depth - 1)
        }),
        Value::Array(items) => items.iter().any(|item| contains_key(item, field, depth - 1)),
        _ => false,
    }
}

fn text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn from_document_reads_typed_sections() {
        let record = CanonicalRecord::from_document(document(json!({
            "project_identity": {"sector": "Industry", "activity": "Cement", "state": "Goa"},
            "form1_part_a": {"proposed_capacity": 2.5},
            "capacity_normalization": {"existing_capacity": {"value": 1, "unit": "MTPA"}},
            "district": "North Goa",
        })));

        assert_eq!(record.project_identity.sector, "Industry");
        assert_eq!(record.project_identity.sector_key(), "industry");
        assert_eq!(record.project_identity.extra["state"], json!("Goa"));
        assert_eq!(
            record.capacity_normalization.existing_capacity,
            Some(CapacityEntry::Measured(Capacity::new(1.0, "MTPA")))
        );
        assert_eq!(record.top_level("district"), Some(&json!("North Goa")));
    }

    #[test]
    fn malformed_sections_are_dropped() {
        let record = CanonicalRecord::from_document(document(json!({
            "form1_part_a": 7,
            "project_identity": {"sector": 12},
        })));
        assert!(record.form1_part_a.is_empty());
        assert_eq!(record.project_identity.sector, "12");
        assert!(record.extra.is_empty());
    }

    #[test]
    fn capacity_entry_is_lenient() {
        assert_eq!(CapacityEntry::from_value(&json!(3)), Some(CapacityEntry::Bare(3.0)));
        assert_eq!(
            CapacityEntry::from_value(&json!({"value": "2"})),
            Some(CapacityEntry::Bare(2.0))
        );
        assert_eq!(CapacityEntry::from_value(&json!("lots")), None);
    }

    #[test]
    fn known_fields_use_typed_locations() {
        let mut record = CanonicalRecord::default();
        assert!(!record.has_field("effective_capacity"));
        record.derived_parameters.effective_capacity = Some(2.0);
        assert!(record.has_field("effective_capacity"));
        assert!(!record.has_field("total_effective_capacity"));
    }

    #[test]
    fn unknown_fields_are_found_at_any_depth() {
        let record = CanonicalRecord::from_document(document(json!({
            "environmental_sensitivity": {"areas": [{"forest_land_ha": 4}]},
            "form1_part_a": {"dam_height_m": ""},
        })));
        assert!(record.has_field("forest_land_ha"));
        assert!(!record.has_field("dam_height_m"));
        assert!(!record.has_field("road_length_km"));
    }

    #[test]
    fn similarity_provenance() {
        let mut derived = DerivedParameters::default();
        assert!(!derived.matched_by_similarity());
        derived.record_similarity(0.91);
        assert!(derived.matched_by_similarity());
        assert_eq!(derived.get("similarity_score"), Some(0.91));
    }

    #[test]
    fn mapped_provenance_is_ignored() {
        let record = CanonicalRecord::from_document(document(json!({
            "derived_parameters": {
                "activity_matched_by": "semantic_similarity",
                "similarity_score": 0.99,
                "road_length_km": 40,
            },
        })));
        let derived = &record.derived_parameters;
        assert!(!derived.matched_by_similarity());
        assert_eq!(derived.similarity_score, None);
        assert_eq!(derived.get("road_length_km"), Some(40.0));
    }

    #[test]
    fn whitespace_only_values_are_absent_everywhere() {
        let record = CanonicalRecord::from_document(document(json!({
            "project_identity": {"sector": "  ", "state": " \t"},
            "district": "   ",
        })));
        assert!(!record.has_field("sector"));
        assert!(!record.has_field("state"));
        assert!(!record.has_field("district"));
        assert_eq!(record.top_level("district"), None);
    }

    #[test]
    fn insert_if_absent_keeps_existing_value() {
        let mut derived = DerivedParameters::default();
        derived.insert_if_absent("effective_capacity", 1.0);
        derived.insert_if_absent("effective_capacity", 5.0);
        derived.insert_if_absent("road_length_km", 12.0);
        assert_eq!(derived.effective_capacity, Some(1.0));
        assert_eq!(derived.get("road_length_km"), Some(12.0));
    }
}
