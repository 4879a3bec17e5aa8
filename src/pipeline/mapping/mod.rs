// Field mapping: importer strategies and the registry that selects them

pub mod mappers;
pub mod registry;

pub use mappers::{FieldMapper, ReferenceHandle};
pub use registry::MapperRegistry;
