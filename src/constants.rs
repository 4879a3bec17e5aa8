/// Importer keys used to select a field mapper from the registry.
/// These are the values accepted by the `importer` setting and the CLI.
pub const SIMPLE_IMPORTER: &str = "simple";
pub const LICENSE_IMPORTER: &str = "license";
pub const ORGANIZATION_IMPORTER: &str = "organization";
pub const ORGANIZATION_FRONTEND_IMPORTER: &str = "organization-frontend";
pub const TAG_IMPORTER: &str = "tags";
pub const QUALITY_IMPORTER: &str = "quality";

// Defaults seeded into every target record before mapping
pub const DEFAULT_PACKAGE_TYPE: &str = "catalogue";
pub const DEFAULT_LICENSE_ID: &str = "notspecified";

/// Prefix added to every imported package name to avoid collisions with
/// packages created natively in the destination catalog
pub const DEFAULT_NAME_PREFIX: &str = "city-toronto";

// Keys recognised in `ImportConfig::other_config`
pub const BASE_API_KEY: &str = "base_api";
pub const NAME_PREFIX_KEY: &str = "name_prefix";
pub const PAGE_SIZE_KEY: &str = "page_size";
pub const TIMEOUT_SECONDS_KEY: &str = "timeout_seconds";

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

// Extension keys written by the quality mapper
pub const QUALITY_ANNOTATION_KEY: &str = "quality_annotation";
pub const QUALITY_METRIC_KEY: &str = "quality_dimension_metric";

/// Tags longer than this (after sanitizing) are dropped
pub const MAX_TAG_LENGTH: usize = 100;

/// Get all importer keys, in the order they are listed to users
pub fn get_supported_importers() -> Vec<&'static str> {
    vec![
        SIMPLE_IMPORTER,
        LICENSE_IMPORTER,
        ORGANIZATION_IMPORTER,
        ORGANIZATION_FRONTEND_IMPORTER,
        TAG_IMPORTER,
        QUALITY_IMPORTER,
    ]
}
