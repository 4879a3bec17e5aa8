use crate::app::ports::HttpClientPort;
use crate::error::{ImportError, Result};
use crate::metrics::ImportMetrics;
use crate::types::{ActionEnvelope, QualityRecord, SourceRecord};
use std::sync::Arc;
use tracing::{debug, warn};

/// Enrichment concerns a mapper can ask the driver to run before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentKind {
    Quality,
}

/// One enrichment concern applied to each source record before mapping
pub trait EnrichmentStage: Send + Sync {
    fn name(&self) -> &str;

    /// Augment `record` in place. Returns whether anything was attached;
    /// finding nothing to attach is not an error.
    fn enrich(&self, record: &mut SourceRecord) -> Result<bool>;
}

/// Build the stage for `kind` against the portal at `base_api`
pub fn build_stage(
    kind: EnrichmentKind,
    http: Arc<dyn HttpClientPort>,
    base_api: &str,
) -> Box<dyn EnrichmentStage> {
    match kind {
        EnrichmentKind::Quality => Box::new(QualityEnricher::new(http, base_api)),
    }
}

/// Attaches the first data-quality record the portal reports for a package
pub struct QualityEnricher {
    http: Arc<dyn HttpClientPort>,
    base_api: String,
}

impl QualityEnricher {
    pub fn new(http: Arc<dyn HttpClientPort>, base_api: &str) -> Self {
        Self {
            http,
            base_api: base_api.trim_end_matches('/').to_string(),
        }
    }

    fn lookup_url(&self, package_id: &str) -> std::result::Result<String, String> {
        let endpoint = format!("{}/3/action/quality_show", self.base_api);
        reqwest::Url::parse_with_params(&endpoint, &[("package_id", package_id)])
            .map(String::from)
            .map_err(|e| format!("invalid quality endpoint '{endpoint}': {e}"))
    }

    fn fetch(&self, package_id: &str) -> std::result::Result<Vec<QualityRecord>, String> {
        let url = self.lookup_url(package_id)?;
        let resp = self.http.get(&url)?;
        if !resp.is_success() {
            return Err(format!("quality_show returned HTTP {}", resp.status));
        }
        let envelope: ActionEnvelope<Vec<QualityRecord>> = serde_json::from_slice(&resp.bytes)
            .map_err(|e| format!("malformed quality_show response: {e}"))?;
        envelope.into_result()
    }
}

impl EnrichmentStage for QualityEnricher {
    fn name(&self) -> &str {
        "quality"
    }

    fn enrich(&self, record: &mut SourceRecord) -> Result<bool> {
        let found = self
            .fetch(&record.id)
            .map_err(|reason| ImportError::Enrichment {
                id: record.id.clone(),
                reason,
            })?;

        match found.into_iter().next() {
            Some(quality) => {
                debug!("Attached quality {} ({}) to {}", quality.score, quality.grade, record.id);
                record.quality = Some(quality);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Lazily applies enrichment stages to a record sequence, one record at a
/// time. Upstream errors pass through untouched; a failing stage yields an
/// enrichment error for that record and the sequence carries on.
pub struct EnrichedRecords<'a, I> {
    inner: I,
    stages: &'a [Box<dyn EnrichmentStage>],
}

pub fn enrich<'a, I>(records: I, stages: &'a [Box<dyn EnrichmentStage>]) -> EnrichedRecords<'a, I::IntoIter>
where
    I: IntoIterator<Item = Result<SourceRecord>>,
{
    EnrichedRecords {
        inner: records.into_iter(),
        stages,
    }
}

impl<I> Iterator for EnrichedRecords<'_, I>
where
    I: Iterator<Item = Result<SourceRecord>>,
{
    type Item = Result<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = match self.inner.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };

        for stage in self.stages {
            match stage.enrich(&mut record) {
                Ok(attached) => ImportMetrics::record_enriched(stage.name(), attached),
                Err(e) => {
                    ImportMetrics::record_enrichment_error(stage.name());
                    warn!("Enrichment stage '{}' failed for {}: {}", stage.name(), record.id, e);
                    let err = match e {
                        ImportError::Enrichment { .. } => e,
                        other => ImportError::Enrichment {
                            id: record.id.clone(),
                            reason: other.to_string(),
                        },
                    };
                    return Some(Err(err));
                }
            }
        }

        Some(Ok(record))
    }
}
