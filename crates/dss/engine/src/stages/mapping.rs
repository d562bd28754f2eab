//! Stage 0: Field Mapping
//!
//! Projects a raw nested submission onto the canonical record. Each
//! canonical field lists candidate source paths; the first one holding a
//! present value wins.

use dss_types::{path, CanonicalRecord, FieldMapping};
use serde_json::{Map, Value};
use tracing::debug;

/// Map `raw` into a canonical record.
///
/// Returns the record and the canonical fields no source resolved, in
/// declared order. Those fields are also noted in the record's
/// `validation_status`.
pub fn map_fields(raw: &Value, mapping: &FieldMapping) -> (CanonicalRecord, Vec<String>) {
    let mut document = Map::new();
    let mut missing = Vec::new();

    for (name, entry) in mapping.fields() {
        let found = entry
            .sources
            .iter()
            .find_map(|source| path::lookup(raw, source).map(|value| (source, value)));

        match found {
            Some((source, value)) => {
                debug!(field = name, source = %source, "Mapped field");
                path::insert(&mut document, &entry.canonical_path, value.clone());
            }
            None => missing.push(name.to_string()),
        }
    }

    let mut record = CanonicalRecord::from_document(document);
    for name in &missing {
        record.validation_status.mark_missing(name.as_str());
    }
    (record, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dss_types::{FieldSpec, Keyed};
    use serde_json::json;

    fn mapping(entries: &[(&str, &[&str], &str)]) -> FieldMapping {
        FieldMapping(Keyed::new(
            entries
                .iter()
                .map(|(name, sources, canonical_path)| {
                    (
                        name.to_string(),
                        FieldSpec {
                            sources: sources.iter().map(|s| s.to_string()).collect(),
                            canonical_path: canonical_path.to_string(),
                        },
                    )
                })
                .collect(),
        ))
    }

    #[test]
    fn first_present_source_wins() {
        let mapping = mapping(&[(
            "sector",
            &["project.sector", "sector", "meta.sector"],
            "project_identity.sector",
        )]);
        let raw = json!({"project": {"sector": ""}, "sector": "Industry", "meta": {"sector": "Mining"}});

        let (record, missing) = map_fields(&raw, &mapping);
        assert_eq!(record.project_identity.sector, "Industry");
        assert!(missing.is_empty());
        assert!(record.validation_status.is_valid_for_classification);
    }

    #[test]
    fn unresolved_fields_are_reported_in_order() {
        let mapping = mapping(&[
            ("district", &["district"], "district"),
            ("state", &["location.state"], "state"),
            ("activity", &["activity"], "project_identity.activity"),
        ]);
        let raw = json!({"location": "Goa", "activity": null});

        let (record, missing) = map_fields(&raw, &mapping);
        assert_eq!(missing, vec!["district", "state", "activity"]);
        assert_eq!(
            record.validation_status.missing_mandatory_fields,
            vec!["district", "state", "activity"]
        );
        assert!(!record.validation_status.is_valid_for_classification);
    }

    #[test]
    fn writes_nested_canonical_paths() {
        let mapping = mapping(&[
            ("proposed_capacity", &["capacity.proposed"], "form1_part_a.proposed_capacity"),
            ("forest_land_ha", &["forest_land_ha"], "environmental_sensitivity.forest_land_ha"),
        ]);
        let raw = json!({"capacity": {"proposed": 2.5}, "forest_land_ha": 12});

        let (record, _) = map_fields(&raw, &mapping);
        assert_eq!(record.form_value("proposed_capacity"), Some(&json!(2.5)));
        assert_eq!(
            record.environmental_sensitivity,
            Some(json!({"forest_land_ha": 12}))
        );
    }

    #[test]
    fn later_mapping_replaces_scalar_intermediate() {
        let mapping = mapping(&[
            ("site", &["site"], "site"),
            ("site_area", &["area"], "site.area_ha"),
        ]);
        let raw = json!({"site": "plot 7", "area": 40});

        let (record, _) = map_fields(&raw, &mapping);
        assert_eq!(record.top_level("site"), Some(&json!({"area_ha": 40})));
    }
}
