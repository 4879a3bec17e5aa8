//! Import pipeline metrics
//!
//! Counters are recorded through the `metrics` facade so they are free when
//! no recorder is installed (tests, library use). The CLI installs a
//! Prometheus recorder via [`init_metrics`] and can render a snapshot at the
//! end of a run.

use metrics::counter;
use std::sync::{Once, OnceLock};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = HANDLE.set(handle);
                ImportMetrics::register_metrics();
                info!("Metrics recorder installed");
            }
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
            }
        }
    });
}

/// Render the current metrics in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Metrics emitted by the import driver and its stages
pub struct ImportMetrics;

impl ImportMetrics {
    /// A raw package was received from the source listing
    pub fn record_listed() {
        counter!("catalog_import_packages_listed_total").increment(1);
    }

    pub fn record_enriched(stage: &str, attached: bool) {
        let outcome = if attached { "attached" } else { "absent" };
        counter!(
            "catalog_import_enrichments_total",
            "stage" => stage.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    pub fn record_enrichment_error(stage: &str) {
        counter!("catalog_import_enrichment_errors_total", "stage" => stage.to_string())
            .increment(1);
    }

    pub fn record_mapped(mapper: &str) {
        counter!("catalog_import_packages_mapped_total", "mapper" => mapper.to_string())
            .increment(1);
    }

    pub fn record_mapping_error(mapper: &str) {
        counter!("catalog_import_mapping_errors_total", "mapper" => mapper.to_string())
            .increment(1);
    }

    pub fn record_reference(kind: &str, created: bool) {
        let outcome = if created { "created" } else { "present" };
        counter!(
            "catalog_import_references_ensured_total",
            "kind" => kind.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    pub fn record_submitted(success: bool) {
        let outcome = if success { "success" } else { "error" };
        counter!("catalog_import_packages_submitted_total", "outcome" => outcome).increment(1);
    }

    fn register_metrics() {
        // Pre-register so the snapshot lists them even before first use
        let _ = counter!("catalog_import_packages_listed_total");
        let _ = counter!("catalog_import_enrichment_errors_total");
        let _ = counter!("catalog_import_mapping_errors_total");
    }
}
