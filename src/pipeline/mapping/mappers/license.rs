use tracing::debug;

use super::base::{FieldMapper, MapperUtils, ReferenceHandle};
use crate::constants::LICENSE_IMPORTER;
use crate::error::Result;
use crate::types::{License, SourceRecord, TargetRecord};

/// Maps a source license token onto a destination license
#[derive(Debug, Clone)]
pub struct LicenseRule {
    pub source_license_id: String,
    pub license: License,
}

impl LicenseRule {
    pub fn new(source_license_id: &str, license: License) -> Self {
        Self {
            source_license_id: source_license_id.to_string(),
            license,
        }
    }
}

/// Licenses recognised from the City of Toronto portal
pub fn default_license_rules() -> Vec<LicenseRule> {
    vec![LicenseRule::new(
        "city-of-toronto-license",
        License {
            // Should be unique, internal ID
            id: "city-of-toronto-license".to_string(),
            title: "Open Government Licence – Toronto".to_string(),
            url: "https://open.toronto.ca/open-data-license/".to_string(),
        },
    )]
}

/// Sets the destination license for recognised source licenses, creating
/// the license in the destination catalog when it is missing
pub struct LicenseMapper {
    name_prefix: String,
    rules: Vec<LicenseRule>,
    references: ReferenceHandle,
}

impl LicenseMapper {
    pub fn new(name_prefix: &str, references: ReferenceHandle) -> Self {
        Self::with_rules(name_prefix, references, default_license_rules())
    }

    pub fn with_rules(name_prefix: &str, references: ReferenceHandle, rules: Vec<LicenseRule>) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
            rules,
            references,
        }
    }
}

impl FieldMapper for LicenseMapper {
    fn key(&self) -> &str {
        LICENSE_IMPORTER
    }

    fn name(&self) -> &str {
        "License Mapping Importer"
    }

    fn map(&self, src: &SourceRecord, mut target: TargetRecord) -> Result<TargetRecord> {
        MapperUtils::apply_identity(&self.name_prefix, src, &mut target);

        let rule = src
            .license_id
            .as_deref()
            .and_then(|token| self.rules.iter().find(|r| r.source_license_id == token));

        // Unrecognised licenses keep the skeleton default
        if let Some(rule) = rule {
            self.references.ensure_license(&rule.license)?;
            debug!("Mapped license {} -> {}", rule.source_license_id, rule.license.id);
            target.license_id = rule.license.id.clone();
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::{references, skeleton, source};
    use super::*;
    use crate::app::ports::DestinationCatalog;
    use serde_json::json;

    #[test]
    fn test_recognised_license_is_created_and_mapped() {
        let (refs, catalog) = references();
        let mapper = LicenseMapper::new("city-toronto", refs);
        let src = source(json!({
            "id": "1", "name": "wards", "title": "Wards",
            "license_id": "city-of-toronto-license"
        }));

        let target = mapper.map(&src, skeleton()).unwrap();
        assert_eq!(target.license_id, "city-of-toronto-license");
        let license = catalog.license_show("city-of-toronto-license").unwrap().unwrap();
        assert_eq!(license.url, "https://open.toronto.ca/open-data-license/");
    }

    #[test]
    fn test_unknown_license_keeps_default() {
        let (refs, catalog) = references();
        let mapper = LicenseMapper::new("city-toronto", refs);
        let src = source(json!({"id": "1", "name": "wards", "title": "Wards", "license_id": "cc-by"}));

        let target = mapper.map(&src, skeleton()).unwrap();
        assert_eq!(target.license_id, "notspecified");
        assert_eq!(catalog.license_count(), 0);
    }

    #[test]
    fn test_mapping_twice_is_idempotent() {
        let (refs, catalog) = references();
        let mapper = LicenseMapper::new("city-toronto", refs);
        let src = source(json!({
            "id": "1", "name": "wards", "title": "Wards",
            "license_id": "city-of-toronto-license"
        }));

        let first = mapper.map(&src, skeleton()).unwrap();
        let second = mapper.map(&src, skeleton()).unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.license_count(), 1);
    }
}
