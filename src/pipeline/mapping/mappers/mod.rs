// Base trait and utilities for importer strategies
pub mod base;

// Individual mapper implementations
pub mod license;
pub mod organization;
pub mod organization_frontend;
pub mod quality;
pub mod simple;
pub mod tags;

// Re-export the main components
pub use base::{FieldMapper, MapperUtils, MetricsMapper, ReferenceHandle};
pub use license::{LicenseMapper, LicenseRule};
pub use organization::{OrganizationMapper, OwnerOrgMatch, OwnerOrgRule};
pub use organization_frontend::OrganizationFrontendMapper;
pub use quality::QualityMapper;
pub use simple::SimpleMapper;
pub use tags::TagMapper;
