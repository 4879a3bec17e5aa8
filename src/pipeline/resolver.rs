use crate::app::ports::{CatalogContext, DestinationCatalog};
use crate::error::{CatalogError, ImportError, ReferenceKind, Result};
use crate::metrics::ImportMetrics;
use crate::types::{License, Organization};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of an ensure-exists call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The entity was missing and this call created it
    Created,
    /// The entity already existed (or a concurrent caller created it first)
    AlreadyPresent,
}

/// Ensures shared reference entities exist in the destination catalog.
///
/// Lookups are anonymous; only the create path uses the supplied context.
/// An entity that already exists is never modified, even if its fields
/// differ from the requested ones.
pub struct ReferenceResolver {
    catalog: Arc<dyn DestinationCatalog>,
}

impl ReferenceResolver {
    pub fn new(catalog: Arc<dyn DestinationCatalog>) -> Self {
        Self { catalog }
    }

    pub fn ensure_license(&self, context: &CatalogContext, wanted: &License) -> Result<EnsureOutcome> {
        Self::ensure(
            ReferenceKind::License,
            &wanted.id,
            || self.catalog.license_show(&wanted.id).map(|l| l.is_some()),
            || self.catalog.license_create(context, wanted),
        )
    }

    pub fn ensure_organization(
        &self,
        context: &CatalogContext,
        wanted: &Organization,
    ) -> Result<EnsureOutcome> {
        Self::ensure(
            ReferenceKind::Organization,
            &wanted.id,
            || self.catalog.organization_show(&wanted.id).map(|o| o.is_some()),
            || self.catalog.organization_create(context, wanted),
        )
    }

    fn ensure(
        kind: ReferenceKind,
        key: &str,
        exists: impl FnOnce() -> Result<bool>,
        create: impl FnOnce() -> std::result::Result<(), CatalogError>,
    ) -> Result<EnsureOutcome> {
        let label = kind.to_string();

        if exists()? {
            debug!("{} '{}' already present", kind, key);
            ImportMetrics::record_reference(&label, false);
            return Ok(EnsureOutcome::AlreadyPresent);
        }

        match create() {
            Ok(()) => {
                info!("Created {} '{}'", kind, key);
                ImportMetrics::record_reference(&label, true);
                Ok(EnsureOutcome::Created)
            }
            // Lost a race with another run; the entity exists now
            Err(CatalogError::AlreadyExists { .. }) => {
                debug!("{} '{}' was created concurrently", kind, key);
                ImportMetrics::record_reference(&label, false);
                Ok(EnsureOutcome::AlreadyPresent)
            }
            Err(e) => Err(ImportError::ReferenceConflict {
                kind,
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
