use crate::app::ports::{CatalogContext, DestinationCatalog, UpsertOutcome};
use crate::error::{CatalogError, Result};
use crate::types::{License, Organization, TargetRecord};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// In-memory destination catalog for development/testing
#[derive(Default)]
pub struct InMemoryCatalog {
    licenses: Mutex<HashMap<String, License>>,
    organizations: Mutex<HashMap<String, Organization>>,
    // keyed by package id
    packages: Mutex<HashMap<String, TargetRecord>>,
}

// Poisoning is ignored: every insert is a single map operation
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn license_count(&self) -> usize {
        lock(&self.licenses).len()
    }

    pub fn organization_count(&self) -> usize {
        lock(&self.organizations).len()
    }

    pub fn package_count(&self) -> usize {
        lock(&self.packages).len()
    }

    pub fn package(&self, id: &str) -> Option<TargetRecord> {
        lock(&self.packages).get(id).cloned()
    }

    pub fn packages(&self) -> Vec<TargetRecord> {
        let mut all: Vec<_> = lock(&self.packages).values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn require_privileged(context: &CatalogContext) -> std::result::Result<(), CatalogError> {
        if context.is_privileged() {
            Ok(())
        } else {
            Err(CatalogError::Unauthorized)
        }
    }
}

impl DestinationCatalog for InMemoryCatalog {
    fn license_show(&self, id: &str) -> Result<Option<License>> {
        Ok(lock(&self.licenses).get(id).cloned())
    }

    fn license_create(
        &self,
        context: &CatalogContext,
        license: &License,
    ) -> std::result::Result<(), CatalogError> {
        Self::require_privileged(context)?;
        let mut licenses = lock(&self.licenses);
        if licenses.contains_key(&license.id) {
            return Err(CatalogError::AlreadyExists {
                kind: "license".to_string(),
                key: license.id.clone(),
            });
        }
        licenses.insert(license.id.clone(), license.clone());
        debug!("Created license: {}", license.id);
        Ok(())
    }

    fn organization_show(&self, id: &str) -> Result<Option<Organization>> {
        Ok(lock(&self.organizations).get(id).cloned())
    }

    fn organization_create(
        &self,
        context: &CatalogContext,
        organization: &Organization,
    ) -> std::result::Result<(), CatalogError> {
        Self::require_privileged(context)?;
        let mut organizations = lock(&self.organizations);
        if organizations.contains_key(&organization.id) {
            return Err(CatalogError::AlreadyExists {
                kind: "organization".to_string(),
                key: organization.id.clone(),
            });
        }
        // `name` is unique too, but a clash under another id is not the
        // requested organization
        if let Some(holder) = organizations.values().find(|o| o.name == organization.name) {
            return Err(CatalogError::Rejected(format!(
                "organization name '{}' is held by '{}'",
                organization.name, holder.id
            )));
        }
        organizations.insert(organization.id.clone(), organization.clone());
        debug!("Created organization: {}", organization.id);
        Ok(())
    }

    fn package_upsert(
        &self,
        context: &CatalogContext,
        package: &TargetRecord,
    ) -> std::result::Result<UpsertOutcome, CatalogError> {
        Self::require_privileged(context)?;
        let (Some(id), Some(name)) = (package.id.as_deref(), package.name.as_deref()) else {
            return Err(CatalogError::Rejected("package requires id and name".to_string()));
        };

        let mut packages = lock(&self.packages);
        let name_clash = packages
            .values()
            .any(|p| p.name.as_deref() == Some(name) && p.id.as_deref() != Some(id));
        if name_clash {
            return Err(CatalogError::Rejected(format!(
                "package name '{name}' is already in use"
            )));
        }

        let outcome = if packages.contains_key(id) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        };
        packages.insert(id.to_string(), package.clone());
        debug!("Upserted package: {} ({:?})", name, outcome);
        Ok(outcome)
    }
}
