use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use catalog_importer::app::ports::{ContextProvider, DestinationCatalog, HttpClientPort};
use catalog_importer::config::Settings;
use catalog_importer::infra::ckan_source::CkanPackageLister;
use catalog_importer::infra::context::SiteUserContext;
use catalog_importer::infra::http_client::ReqwestHttp;
use catalog_importer::infra::in_memory_catalog::InMemoryCatalog;
use catalog_importer::pipeline::{
    ErrorPolicy, ImportDriver, MapperRegistry, ReferenceHandle, ReferenceResolver,
};
use catalog_importer::{logging, metrics};

#[derive(Parser)]
#[command(name = "catalog_importer")]
#[command(about = "Import open-data catalogue entries from a CKAN portal")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map packages and print the resulting catalogue entries without submitting them
    Preview {
        /// Settings file (defaults to $CATALOG_IMPORT_CONFIG or import.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop after this many records
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Run the import into the destination catalog
    Import {
        /// Settings file (defaults to $CATALOG_IMPORT_CONFIG or import.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop at the first failed record
        #[arg(long)]
        fail_fast: bool,
        /// Print a Prometheus metrics snapshot when the run ends
        #[arg(long)]
        metrics: bool,
    },
    /// List the available importers
    Importers,
}

/// Everything a run needs, wired from the settings file
struct Wiring {
    settings: Settings,
    catalog: Arc<InMemoryCatalog>,
    contexts: Arc<dyn ContextProvider>,
    driver: ImportDriver,
}

fn wire(config: Option<PathBuf>, fail_fast: bool) -> anyhow::Result<Wiring> {
    let settings = Settings::load(config.as_deref())?;
    let import = settings.import.clone();

    let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(import.request_timeout()?)?);
    let source = Arc::new(CkanPackageLister::new(http.clone(), import.page_size()?));

    let catalog = Arc::new(InMemoryCatalog::new());
    let contexts: Arc<dyn ContextProvider> = Arc::new(SiteUserContext::new(&settings.site_user));
    let resolver = Arc::new(ReferenceResolver::new(catalog.clone()));
    let references = ReferenceHandle::new(resolver, contexts.clone());
    let registry = MapperRegistry::new(&import.name_prefix()?, references);

    let policy = if fail_fast || settings.fail_fast {
        ErrorPolicy::FailFast
    } else {
        ErrorPolicy::Continue
    };
    let driver = ImportDriver::from_config(import, &registry, &settings.importer, source, http)?
        .with_error_policy(policy);

    Ok(Wiring {
        settings,
        catalog,
        contexts,
        driver,
    })
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Importers => {
            let (references, _) = offline_references();
            let registry = MapperRegistry::new("", references);
            for key in registry.list_importers() {
                if let Some(mapper) = registry.get(key) {
                    println!("{:<24} {}", key, mapper.name());
                }
            }
        }
        Commands::Preview { config, limit } => {
            let wiring = wire(config, false)?;
            info!(
                "Previewing importer '{}' for {}",
                wiring.settings.importer, wiring.settings.import.owner_org
            );

            for item in wiring.driver.run()?.take(limit) {
                match item {
                    Ok(target) => println!("{}", serde_json::to_string_pretty(&target)?),
                    Err(e) => {
                        warn!("Record failed: {}", e);
                        println!("⚠️  {}", e);
                    }
                }
            }
        }
        Commands::Import {
            config,
            fail_fast,
            metrics: show_metrics,
        } => {
            if show_metrics {
                metrics::init_metrics();
            }

            let wiring = wire(config, fail_fast)?;
            let context = wiring.contexts.build_context();
            let catalog: &dyn DestinationCatalog = wiring.catalog.as_ref();

            println!("🔄 Running importer '{}'...", wiring.settings.importer);
            match wiring.driver.import_into(catalog, &context) {
                Ok(summary) => {
                    println!("\n📊 Import Results ({}):", summary.import_id);
                    println!("   Total records: {}", summary.total_records);
                    println!("   Created: {}", summary.created);
                    println!("   Updated: {}", summary.updated);
                    println!("   Failed: {}", summary.failed());
                    println!("   Licenses in catalog: {}", wiring.catalog.license_count());
                    println!(
                        "   Organizations in catalog: {}",
                        wiring.catalog.organization_count()
                    );

                    if !summary.errors.is_empty() {
                        println!("\n⚠️  Errors encountered:");
                        for e in &summary.errors {
                            println!("   - {}", e);
                        }
                    }
                }
                Err(e) => {
                    error!("Import failed: {}", e);
                    return Err(e.into());
                }
            }

            if show_metrics {
                if let Some(snapshot) = metrics::render() {
                    println!("\n{}", snapshot);
                }
            }
        }
    }

    Ok(())
}

/// References backed by a throwaway catalog, for commands that never map
fn offline_references() -> (ReferenceHandle, Arc<InMemoryCatalog>) {
    let catalog = Arc::new(InMemoryCatalog::new());
    let resolver = Arc::new(ReferenceResolver::new(catalog.clone()));
    let contexts: Arc<dyn ContextProvider> =
        Arc::new(catalog_importer::infra::context::AnonymousContext);
    (ReferenceHandle::new(resolver, contexts), catalog)
}
