// Import pipeline: enumeration -> enrichment -> field mapping -> destination

pub mod driver;
pub mod enrich;
pub mod mapping;
pub mod resolver;

// Re-export key types from each stage
pub use driver::{ErrorPolicy, ImportDriver, ImportRun, ImportSummary};
pub use enrich::{EnrichmentKind, EnrichmentStage, QualityEnricher};
pub use mapping::{FieldMapper, MapperRegistry, ReferenceHandle};
pub use resolver::{EnsureOutcome, ReferenceResolver};
