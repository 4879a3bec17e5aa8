use tracing::debug;

use super::base::{FieldMapper, MapperUtils, ReferenceHandle};
use crate::constants::ORGANIZATION_IMPORTER;
use crate::error::Result;
use crate::types::{Organization, SourceRecord, TargetRecord};

/// What a rule looks at in the source package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerOrgMatch {
    /// `organization.name` equals the value
    OrganizationName(String),
    /// `owner_division` equals the value
    Division(String),
}

impl OwnerOrgMatch {
    fn matches(&self, src: &SourceRecord) -> bool {
        match self {
            OwnerOrgMatch::OrganizationName(name) => src.organization_name() == Some(name.as_str()),
            OwnerOrgMatch::Division(division) => src.owner_division.as_deref() == Some(division.as_str()),
        }
    }
}

/// Overrides `owner_org` when it matches, optionally ensuring the
/// organization exists first
#[derive(Debug, Clone)]
pub struct OwnerOrgRule {
    pub matcher: OwnerOrgMatch,
    pub owner_org: String,
    pub ensure: Option<Organization>,
}

/// City of Toronto rules. The division rule comes last, so a matching
/// division overrides the organization rule.
pub fn default_owner_org_rules() -> Vec<OwnerOrgRule> {
    vec![
        OwnerOrgRule {
            matcher: OwnerOrgMatch::OrganizationName("city-of-toronto".to_string()),
            owner_org: "city-of-toronto".to_string(),
            ensure: Some(Organization {
                // unique internal id
                id: "city-of-toronto".to_string(),
                // unique, used in URLs
                name: "city-of-toronto".to_string(),
                title: "City of Toronto".to_string(),
                description: "City of Toronto description".to_string(),
            }),
        },
        OwnerOrgRule {
            matcher: OwnerOrgMatch::Division("Transportation Services".to_string()),
            owner_org: "city-of-toronto-transportation-services".to_string(),
            ensure: None,
        },
    ]
}

/// Chooses the owning organization from an ordered rule list.
///
/// Every rule is evaluated in list order and each match overwrites
/// `owner_org`, so the last matching rule wins. A package matching no rule
/// keeps the owner from the import configuration.
pub struct OrganizationMapper {
    name_prefix: String,
    rules: Vec<OwnerOrgRule>,
    references: ReferenceHandle,
}

impl OrganizationMapper {
    pub fn new(name_prefix: &str, references: ReferenceHandle) -> Self {
        Self::with_rules(name_prefix, references, default_owner_org_rules())
    }

    pub fn with_rules(name_prefix: &str, references: ReferenceHandle, rules: Vec<OwnerOrgRule>) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
            rules,
            references,
        }
    }
}

impl FieldMapper for OrganizationMapper {
    fn key(&self) -> &str {
        ORGANIZATION_IMPORTER
    }

    fn name(&self) -> &str {
        "Organization Mapping Importer"
    }

    fn map(&self, src: &SourceRecord, mut target: TargetRecord) -> Result<TargetRecord> {
        MapperUtils::apply_identity(&self.name_prefix, src, &mut target);

        for rule in self.rules.iter().filter(|r| r.matcher.matches(src)) {
            if let Some(organization) = &rule.ensure {
                self.references.ensure_organization(organization)?;
            }
            debug!("{:?} sets owner_org {} for {}", rule.matcher, rule.owner_org, src.id);
            target.owner_org = rule.owner_org.clone();
        }

        Ok(target)
    }
}
