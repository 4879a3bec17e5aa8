use crate::app::ports::{
    CatalogContext, DestinationCatalog, HttpClientPort, SourceEnumerator, UpsertOutcome,
};
use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::metrics::ImportMetrics;
use crate::pipeline::enrich::{build_stage, enrich, EnrichmentStage};
use crate::pipeline::mapping::{FieldMapper, MapperRegistry};
use crate::types::{SourceRecord, TargetRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// What the run does after yielding a per-record error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Yield the error in-line and keep going
    #[default]
    Continue,
    /// End the run after yielding the first error
    FailFast,
}

/// Result of draining a run into a destination catalog
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub import_id: Uuid,
    pub importer: String,
    pub total_records: usize,
    pub created: usize,
    pub updated: usize,
    pub source_errors: usize,
    pub enrichment_errors: usize,
    pub mapping_errors: usize,
    pub submission_errors: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportSummary {
    fn start(import_id: Uuid, importer: &str) -> Self {
        let now = Utc::now();
        Self {
            import_id,
            importer: importer.to_string(),
            total_records: 0,
            created: 0,
            updated: 0,
            source_errors: 0,
            enrichment_errors: 0,
            mapping_errors: 0,
            submission_errors: 0,
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn imported(&self) -> usize {
        self.created + self.updated
    }

    pub fn failed(&self) -> usize {
        self.source_errors + self.enrichment_errors + self.mapping_errors + self.submission_errors
    }

    fn record_error(&mut self, e: &ImportError) {
        match e {
            ImportError::Enrichment { .. } => self.enrichment_errors += 1,
            ImportError::Mapping { .. } => self.mapping_errors += 1,
            _ => self.source_errors += 1,
        }
        self.errors.push(e.to_string());
    }
}

/// Drives one import: source listing, enrichment, then the configured mapper
pub struct ImportDriver {
    config: ImportConfig,
    source: Arc<dyn SourceEnumerator>,
    mapper: Arc<dyn FieldMapper>,
    stages: Vec<Box<dyn EnrichmentStage>>,
    policy: ErrorPolicy,
}

impl ImportDriver {
    /// Build a driver without enrichment. Configuration problems are
    /// reported here, before any package is fetched.
    pub fn new(
        config: ImportConfig,
        source: Arc<dyn SourceEnumerator>,
        mapper: Arc<dyn FieldMapper>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            mapper,
            stages: Vec::new(),
            policy: ErrorPolicy::default(),
        })
    }

    /// Build a driver for the importer named `importer`, with the enrichment
    /// stages that importer declares
    pub fn from_config(
        config: ImportConfig,
        registry: &MapperRegistry,
        importer: &str,
        source: Arc<dyn SourceEnumerator>,
        http: Arc<dyn HttpClientPort>,
    ) -> Result<Self> {
        let mapper = registry.resolve(importer)?;
        let base_api = config.base_api()?.to_string();
        let stages = mapper
            .enrichments()
            .iter()
            .map(|kind| build_stage(*kind, http.clone(), &base_api))
            .collect();

        let mut driver = Self::new(config, source, mapper)?;
        driver.stages = stages;
        Ok(driver)
    }

    pub fn with_stage(mut self, stage: Box<dyn EnrichmentStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn mapper(&self) -> &dyn FieldMapper {
        self.mapper.as_ref()
    }

    /// Default fields assigned to every catalogue entry before mapping
    pub fn default_target(&self) -> TargetRecord {
        TargetRecord::skeleton(&self.config.owner_org)
    }

    /// Start a run. Packages are listed, enriched and mapped only as the
    /// returned iterator is consumed.
    #[instrument(skip(self), fields(import_id = %self.config.id, importer = self.mapper.key()))]
    pub fn run(&self) -> Result<ImportRun<'_>> {
        let base_api = self.config.base_api()?;
        info!("Starting import from {}", base_api);

        let decoded = self.source.list_all(base_api)?.map(|raw| {
            let raw = raw?;
            ImportMetrics::record_listed();
            SourceRecord::from_raw(raw)
        });

        Ok(ImportRun {
            driver: self,
            records: Box::new(enrich(decoded, &self.stages)),
            halted: false,
        })
    }

    /// Drain a run into `catalog`. With [`ErrorPolicy::FailFast`] the first
    /// error is returned; otherwise errors are counted in the summary.
    #[instrument(skip(self, catalog, context), fields(import_id = %self.config.id, importer = self.mapper.key()))]
    pub fn import_into(
        &self,
        catalog: &dyn DestinationCatalog,
        context: &CatalogContext,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::start(self.config.id, self.mapper.key());

        for item in self.run()? {
            summary.total_records += 1;

            let target = match item {
                Ok(target) => target,
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    if self.policy == ErrorPolicy::FailFast {
                        return Err(e);
                    }
                    summary.record_error(&e);
                    continue;
                }
            };

            match catalog.package_upsert(context, &target) {
                Ok(outcome) => {
                    ImportMetrics::record_submitted(true);
                    match outcome {
                        UpsertOutcome::Created => summary.created += 1,
                        UpsertOutcome::Updated => summary.updated += 1,
                    }
                }
                Err(e) => {
                    ImportMetrics::record_submitted(false);
                    let id = target.id.as_deref().unwrap_or_default();
                    error!("Destination rejected package {}: {}", id, e);
                    let err = ImportError::Source(format!("submission of package {id} failed: {e}"));
                    if self.policy == ErrorPolicy::FailFast {
                        return Err(err);
                    }
                    summary.submission_errors += 1;
                    summary.errors.push(err.to_string());
                }
            }

            if summary.total_records % 100 == 0 {
                debug!("Processed {} records", summary.total_records);
            }
        }

        summary.finished_at = Utc::now();
        info!(
            "Import finished: {} imported ({} created, {} updated), {} failed",
            summary.imported(),
            summary.created,
            summary.updated,
            summary.failed()
        );
        Ok(summary)
    }

    fn map_record(&self, src: &SourceRecord) -> Result<TargetRecord> {
        let mapped = self
            .mapper
            .map(src, self.default_target())
            .and_then(|target| target.verify_identity().map(|_| target));

        match mapped {
            Ok(target) => {
                debug!("Mapped {} -> {:?}", src.id, target.name);
                Ok(target)
            }
            Err(e) => Err(ImportError::mapping(&src.id, e)),
        }
    }
}

/// Lazy, single-pass sequence of mapped records from one run
pub struct ImportRun<'a> {
    driver: &'a ImportDriver,
    records: Box<dyn Iterator<Item = Result<SourceRecord>> + 'a>,
    halted: bool,
}

impl Iterator for ImportRun<'_> {
    type Item = Result<TargetRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }

        let item = match self.records.next()? {
            Ok(src) => self.driver.map_record(&src),
            Err(e) => Err(e),
        };

        if item.is_err() && self.driver.policy == ErrorPolicy::FailFast {
            self.halted = true;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::PackageStream;
    use crate::error::ReferenceKind;
    use crate::infra::context::AnonymousContext;
    use crate::infra::in_memory_catalog::InMemoryCatalog;
    use crate::pipeline::mapping::mappers::{LicenseMapper, SimpleMapper};
    use crate::pipeline::mapping::ReferenceHandle;
    use crate::pipeline::resolver::ReferenceResolver;
    use crate::types::RawPackage;
    use serde_json::{json, Value};

    struct FixedSource(Vec<Value>);

    impl SourceEnumerator for FixedSource {
        fn list_all<'a>(&'a self, _base_api: &str) -> Result<PackageStream<'a>> {
            Ok(Box::new(self.0.iter().cloned().map(Ok::<RawPackage, ImportError>)))
        }
    }

    /// Mapper that forgets the package name
    struct NamelessMapper;

    impl FieldMapper for NamelessMapper {
        fn key(&self) -> &str {
            "nameless"
        }
        fn name(&self) -> &str {
            "Nameless"
        }
        fn map(&self, src: &SourceRecord, mut target: TargetRecord) -> Result<TargetRecord> {
            target.id = Some(src.id.clone());
            Ok(target)
        }
    }

    fn packages() -> Vec<Value> {
        vec![
            json!({"id": "1", "name": "one", "title": "One"}),
            json!({"id": "2", "title": "Missing name"}),
            json!({"id": "3", "name": "three", "title": "Three"}),
        ]
    }

    fn config() -> ImportConfig {
        ImportConfig::new("city-of-toronto", "https://portal.example/api")
    }

    fn driver(mapper: Arc<dyn FieldMapper>) -> ImportDriver {
        ImportDriver::new(config(), Arc::new(FixedSource(packages())), mapper).unwrap()
    }

    #[test]
    fn test_default_target_skeleton() {
        let d = driver(Arc::new(SimpleMapper::new("city-toronto")));
        let target = d.default_target();
        assert_eq!(target.owner_org, "city-of-toronto");
        assert_eq!(target.package_type, "catalogue");
        assert_eq!(target.license_id, "notspecified");
    }

    #[test]
    fn test_bad_record_is_reported_not_skipped() {
        let d = driver(Arc::new(SimpleMapper::new("city-toronto")));
        let results: Vec<_> = d.run().unwrap().collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().err().and_then(|e| e.record_id()), Some("2"));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_fail_fast_ends_after_first_error() {
        let d = driver(Arc::new(SimpleMapper::new("city-toronto")))
            .with_error_policy(ErrorPolicy::FailFast);
        let results: Vec<_> = d.run().unwrap().collect();

        assert_eq!(results.len(), 2);
        assert!(results[1].is_err());
    }

    #[test]
    fn test_mapper_leaving_name_unset_is_mapping_error() {
        let d = ImportDriver::new(
            config(),
            Arc::new(FixedSource(vec![json!({"id": "9", "name": "n", "title": "T"})])),
            Arc::new(NamelessMapper),
        )
        .unwrap();

        let err = d.run().unwrap().next().unwrap().unwrap_err();
        assert!(matches!(err, ImportError::Mapping { ref id, .. } if id == "9"));
    }

    #[test]
    fn test_missing_base_api_fails_before_listing() {
        let mut cfg = config();
        cfg.other_config.clear();
        let result = ImportDriver::new(
            cfg,
            Arc::new(FixedSource(packages())),
            Arc::new(SimpleMapper::new("city-toronto")),
        );
        assert!(matches!(result, Err(ImportError::Configuration(_))));
    }

    #[test]
    fn test_reference_conflict_is_mapping_error_for_that_record() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let resolver = Arc::new(ReferenceResolver::new(catalog.clone()));
        let refs = ReferenceHandle::new(resolver, Arc::new(AnonymousContext));
        let packages = vec![
            json!({"id": "lic", "name": "licensed", "title": "L", "license_id": "city-of-toronto-license"}),
            json!({"id": "plain", "name": "plain", "title": "P"}),
        ];
        let d = ImportDriver::new(
            config(),
            Arc::new(FixedSource(packages)),
            Arc::new(LicenseMapper::new("city-toronto", refs)),
        )
        .unwrap();

        let results: Vec<_> = d.run().unwrap().collect();

        match &results[0] {
            Err(ImportError::Mapping { id, cause }) => {
                assert_eq!(id, "lic");
                assert!(matches!(
                    **cause,
                    ImportError::ReferenceConflict { kind: ReferenceKind::License, .. }
                ));
            }
            other => panic!("expected mapping error, got {other:?}"),
        }
        assert!(results[1].is_ok());
        assert_eq!(catalog.license_count(), 0);
    }
}
