//! Condition evaluation against the canonical record.

use dss_types::{path, CanonicalRecord, Condition};

/// Field names that fall back to the total effective capacity.
pub const CAPACITY_METRICS: &[&str] = &[
    "capacity",
    "effective_capacity",
    "proposed_capacity",
    "existing_capacity",
    "power_generation_mw",
    "hydro_capacity_mw",
];

/// Numeric value of `field` for rule conditions.
///
/// Sources are tried in order: derived parameters, form fields, the total
/// effective capacity (for [`CAPACITY_METRICS`] only), then top-level
/// attributes. The first source holding the field decides; a value there
/// that is not numeric resolves to `None` without consulting later sources.
pub fn resolve_field(record: &CanonicalRecord, field: &str) -> Option<f64> {
    let derived = &record.derived_parameters;
    if derived.contains(field) {
        return derived.get(field);
    }
    if let Some(value) = record.form_value(field) {
        return path::as_number(value);
    }
    if CAPACITY_METRICS.contains(&field) {
        if let Some(total) = &record.capacity_normalization.total_effective_capacity {
            return Some(total.value);
        }
    }
    record.top_level(field).and_then(path::as_number)
}

/// Whether `condition` holds. Unresolvable operands never match.
pub fn evaluate(condition: &Condition, record: &CanonicalRecord) -> bool {
    match condition {
        Condition::Any { any } => any.iter().any(|c| evaluate(c, record)),
        Condition::Leaf { field, op, value } => {
            match (resolve_field(record, field), path::as_number(value)) {
                (Some(lhs), Some(rhs)) => op.apply(lhs, rhs),
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dss_types::ComparisonOp;
    use serde_json::{json, Value};

    fn record(document: Value) -> CanonicalRecord {
        let Value::Object(map) = document else {
            panic!("expected object")
        };
        CanonicalRecord::from_document(map)
    }

    fn leaf(field: &str, op: ComparisonOp, value: Value) -> Condition {
        Condition::Leaf {
            field: field.into(),
            op,
            value,
        }
    }

    #[test]
    fn derived_beats_form() {
        let r = record(json!({
            "derived_parameters": {"road_length_km": 120},
            "form1_part_a": {"road_length_km": 10},
        }));
        assert_eq!(resolve_field(&r, "road_length_km"), Some(120.0));
    }

    #[test]
    fn form_values_unwrap_and_parse() {
        let r = record(json!({
            "form1_part_a": {"built_up_area_sqm": "150000", "dam_height_m": {"value": 42, "unit": "m"}},
        }));
        assert_eq!(resolve_field(&r, "built_up_area_sqm"), Some(150000.0));
        assert_eq!(resolve_field(&r, "dam_height_m"), Some(42.0));
    }

    #[test]
    fn capacity_synonyms_read_total() {
        let r = record(json!({
            "capacity_normalization": {"total_effective_capacity": {"value": 3.5, "unit": "MTPA"}},
        }));
        assert_eq!(resolve_field(&r, "capacity"), Some(3.5));
        assert_eq!(resolve_field(&r, "power_generation_mw"), Some(3.5));
        assert_eq!(resolve_field(&r, "road_length_km"), None);
    }

    #[test]
    fn top_level_is_last_resort() {
        let r = record(json!({"sugar_crushing_tcd": 6000}));
        assert_eq!(resolve_field(&r, "sugar_crushing_tcd"), Some(6000.0));
    }

    #[test]
    fn non_numeric_value_does_not_fall_through() {
        let r = record(json!({
            "form1_part_a": {"max_mining_area_ha": "large"},
            "max_mining_area_ha": 500,
        }));
        assert_eq!(resolve_field(&r, "max_mining_area_ha"), None);
        assert!(!evaluate(
            &leaf("max_mining_area_ha", ComparisonOp::Ge, json!(100)),
            &r
        ));
    }

    #[test]
    fn leaf_and_any() {
        let r = record(json!({"form1_part_a": {"road_length_km": 80, "built_up_area_sqm": 200000}}));
        let road = leaf("road_length_km", ComparisonOp::Gt, json!(100));
        let area = leaf("built_up_area_sqm", ComparisonOp::Ge, json!("150000"));
        assert!(!evaluate(&road, &r));
        assert!(evaluate(&area, &r));
        assert!(evaluate(&Condition::Any { any: vec![road, area] }, &r));
    }

    #[test]
    fn missing_field_or_bad_threshold_never_matches() {
        let r = record(json!({"form1_part_a": {"road_length_km": 80}}));
        assert!(!evaluate(&leaf("lane_count", ComparisonOp::Lt, json!(4)), &r));
        assert!(!evaluate(&leaf("road_length_km", ComparisonOp::Lt, json!("far")), &r));
        assert!(evaluate(&leaf("road_length_km", ComparisonOp::Eq, json!(80.0)), &r));
    }
}
