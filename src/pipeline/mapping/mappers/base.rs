use std::sync::Arc;

use crate::app::ports::ContextProvider;
use crate::error::Result;
use crate::metrics::ImportMetrics;
use crate::pipeline::enrich::EnrichmentKind;
use crate::pipeline::resolver::{EnsureOutcome, ReferenceResolver};
use crate::types::{License, Organization, SourceRecord, TargetRecord};

/// Base trait for importer strategies
///
/// A mapper turns one (possibly enriched) source package plus the driver's
/// default skeleton into a complete destination record. Besides ensuring
/// reference entities exist, `map` must have no side effects: mapping the
/// same package onto a fresh skeleton twice yields equal records.
pub trait FieldMapper: Send + Sync {
    /// Registry key used to select this mapper
    fn key(&self) -> &str;

    /// Get a human-readable name for this mapper
    fn name(&self) -> &str;

    /// Enrichment stages that must run before this mapper sees a record
    fn enrichments(&self) -> &[EnrichmentKind] {
        &[]
    }

    fn map(&self, src: &SourceRecord, target: TargetRecord) -> Result<TargetRecord>;
}

/// A wrapper that adds metrics to any mapper implementation
pub struct MetricsMapper<M: FieldMapper> {
    inner: M,
}

impl<M: FieldMapper> MetricsMapper<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: FieldMapper> FieldMapper for MetricsMapper<M> {
    fn key(&self) -> &str {
        self.inner.key()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn enrichments(&self) -> &[EnrichmentKind] {
        self.inner.enrichments()
    }

    fn map(&self, src: &SourceRecord, target: TargetRecord) -> Result<TargetRecord> {
        match self.inner.map(src, target) {
            Ok(mapped) => {
                ImportMetrics::record_mapped(self.inner.key());
                Ok(mapped)
            }
            Err(e) => {
                ImportMetrics::record_mapping_error(self.inner.key());
                Err(e)
            }
        }
    }
}

/// Resolver plus the context provider used for its create path, handed to
/// mappers that reference shared entities
#[derive(Clone)]
pub struct ReferenceHandle {
    resolver: Arc<ReferenceResolver>,
    contexts: Arc<dyn ContextProvider>,
}

impl ReferenceHandle {
    pub fn new(resolver: Arc<ReferenceResolver>, contexts: Arc<dyn ContextProvider>) -> Self {
        Self { resolver, contexts }
    }

    pub fn ensure_license(&self, license: &License) -> Result<EnsureOutcome> {
        self.resolver
            .ensure_license(&self.contexts.build_context(), license)
    }

    pub fn ensure_organization(&self, organization: &Organization) -> Result<EnsureOutcome> {
        self.resolver
            .ensure_organization(&self.contexts.build_context(), organization)
    }
}

/// Common helpers for mapper implementations
pub struct MapperUtils;

impl MapperUtils {
    /// Imported names are prefixed to avoid collisions with packages created
    /// natively in the destination catalog
    pub fn prefixed_name(prefix: &str, name: &str) -> String {
        format!("{prefix}-{name}")
    }

    /// The identity triplet every mapper sets: prefixed `name`, `id`, `title`
    pub fn apply_identity(prefix: &str, src: &SourceRecord, target: &mut TargetRecord) {
        target.name = Some(Self::prefixed_name(prefix, &src.name));
        target.id = Some(src.id.clone());
        target.title = Some(src.title.clone());
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::infra::context::SiteUserContext;
    use crate::infra::in_memory_catalog::InMemoryCatalog;
    use serde_json::Value;

    pub fn source(value: Value) -> SourceRecord {
        SourceRecord::from_raw(value).unwrap()
    }

    pub fn skeleton() -> TargetRecord {
        TargetRecord::skeleton("city-of-toronto")
    }

    pub fn references() -> (ReferenceHandle, Arc<InMemoryCatalog>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let resolver = Arc::new(ReferenceResolver::new(catalog.clone()));
        let handle = ReferenceHandle::new(resolver, Arc::new(SiteUserContext::new("admin")));
        (handle, catalog)
    }
}
