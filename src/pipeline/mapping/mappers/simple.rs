use serde_json::Value;

use super::base::{FieldMapper, MapperUtils};
use crate::constants::SIMPLE_IMPORTER;
use crate::error::Result;
use crate::types::{SourceRecord, TargetRecord};

/// Source field → target field, copied one-to-one
pub const DEFAULT_FIELD_TABLE: &[(&str, &str)] = &[
    ("id", "id"),
    // this is the description
    ("notes", "notes"),
    ("title", "title"),
];

/// Table-driven mapper: copies each listed field when the source value is
/// present and non-empty
pub struct SimpleMapper {
    name_prefix: String,
    fields: Vec<(String, String)>,
}

impl SimpleMapper {
    pub fn new(name_prefix: &str) -> Self {
        Self::with_fields(name_prefix, DEFAULT_FIELD_TABLE)
    }

    pub fn with_fields(name_prefix: &str, fields: &[(&str, &str)]) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
            fields: fields
                .iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
        }
    }

    fn source_value<'a>(src: &'a SourceRecord, field: &str) -> Option<&'a str> {
        let value = match field {
            "id" => Some(src.id.as_str()),
            "name" => Some(src.name.as_str()),
            "title" => Some(src.title.as_str()),
            "notes" => src.notes.as_deref(),
            "owner_division" => src.owner_division.as_deref(),
            "license_id" => src.license_id.as_deref(),
            other => src.extras.get(other).and_then(Value::as_str),
        };
        value.filter(|v| !v.is_empty())
    }

    fn set_target(target: &mut TargetRecord, field: &str, value: &str) {
        match field {
            "id" => target.id = Some(value.to_string()),
            "name" => target.name = Some(value.to_string()),
            "title" => target.title = Some(value.to_string()),
            "notes" => target.notes = Some(value.to_string()),
            "owner_org" => target.owner_org = value.to_string(),
            "license_id" => target.license_id = value.to_string(),
            other => target.set_extra(other, value),
        }
    }
}

impl FieldMapper for SimpleMapper {
    fn key(&self) -> &str {
        SIMPLE_IMPORTER
    }

    fn name(&self) -> &str {
        "Simple Field Table Mapper"
    }

    fn map(&self, src: &SourceRecord, mut target: TargetRecord) -> Result<TargetRecord> {
        for (src_field, target_field) in &self.fields {
            if let Some(value) = Self::source_value(src, src_field) {
                Self::set_target(&mut target, target_field, value);
            }
        }

        MapperUtils::apply_identity(&self.name_prefix, src, &mut target);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::{skeleton, source};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_copies_field_table() {
        let mapper = SimpleMapper::new("city-toronto");
        let src = source(json!({
            "id": "0a1b",
            "name": "ttc-routes",
            "title": "TTC Routes",
            "notes": "Surface routes"
        }));

        let target = mapper.map(&src, skeleton()).unwrap();
        assert_eq!(target.id.as_deref(), Some("0a1b"));
        assert_eq!(target.title.as_deref(), Some("TTC Routes"));
        assert_eq!(target.notes.as_deref(), Some("Surface routes"));
        assert_eq!(target.name.as_deref(), Some("city-toronto-ttc-routes"));
        assert_eq!(target.license_id, "notspecified");
        assert_eq!(target.package_type, "catalogue");
    }

    #[test]
    fn test_empty_notes_are_not_copied() {
        let mapper = SimpleMapper::new("city-toronto");
        let src = source(json!({"id": "1", "name": "n", "title": "T", "notes": ""}));

        let target = mapper.map(&src, skeleton()).unwrap();
        assert!(target.notes.is_none());
    }

    #[test]
    fn test_custom_table_reads_extension_fields() {
        let mapper = SimpleMapper::with_fields("city-toronto", &[("refresh_rate", "update_frequency")]);
        let src = source(json!({"id": "1", "name": "n", "title": "T", "refresh_rate": "Daily"}));

        let target = mapper.map(&src, skeleton()).unwrap();
        assert_eq!(target.extra_str("update_frequency"), Some("Daily"));
        assert_eq!(target.name.as_deref(), Some("city-toronto-n"));
    }
}
