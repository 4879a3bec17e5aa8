use super::base::{FieldMapper, MapperUtils};
use crate::constants::ORGANIZATION_FRONTEND_IMPORTER;
use crate::error::Result;
use crate::types::{SourceRecord, TargetRecord};

/// Importer whose owning organization is picked when the import is
/// configured; `owner_org` arrives already set on the skeleton and is left alone.
pub struct OrganizationFrontendMapper {
    name_prefix: String,
}

impl OrganizationFrontendMapper {
    pub fn new(name_prefix: &str) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
        }
    }
}

impl FieldMapper for OrganizationFrontendMapper {
    fn key(&self) -> &str {
        ORGANIZATION_FRONTEND_IMPORTER
    }

    fn name(&self) -> &str {
        "Organization Mapping (Frontend) Importer"
    }

    fn map(&self, src: &SourceRecord, mut target: TargetRecord) -> Result<TargetRecord> {
        MapperUtils::apply_identity(&self.name_prefix, src, &mut target);
        Ok(target)
    }
}
