use crate::error::{CatalogError, Result};
use crate::types::{License, Organization, RawPackage, TargetRecord};

/// Lazy, single-pass sequence of raw packages from the source portal
pub type PackageStream<'a> = Box<dyn Iterator<Item = Result<RawPackage>> + 'a>;

// Source-side ports
pub trait HttpClientPort: Send + Sync {
    fn get(&self, url: &str) -> std::result::Result<HttpGetResult, String>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Produces every package published by a source portal, pagination hidden
pub trait SourceEnumerator: Send + Sync {
    fn list_all<'a>(&'a self, base_api: &str) -> Result<PackageStream<'a>>;
}

/// Opaque authorization token for destination catalog calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogContext {
    user: Option<String>,
}

impl CatalogContext {
    /// Context for read-only lookups
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// Context allowed to create entities on behalf of `user`
    pub fn privileged(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_privileged(&self) -> bool {
        self.user.is_some()
    }
}

pub trait ContextProvider: Send + Sync {
    fn build_context(&self) -> CatalogContext;
}

/// Whether an upsert created a new package or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

// Destination-side port
pub trait DestinationCatalog: Send + Sync {
    fn license_show(&self, id: &str) -> Result<Option<License>>;
    fn license_create(
        &self,
        context: &CatalogContext,
        license: &License,
    ) -> std::result::Result<(), CatalogError>;

    fn organization_show(&self, id: &str) -> Result<Option<Organization>>;
    fn organization_create(
        &self,
        context: &CatalogContext,
        organization: &Organization,
    ) -> std::result::Result<(), CatalogError>;

    fn package_upsert(
        &self,
        context: &CatalogContext,
        package: &TargetRecord,
    ) -> std::result::Result<UpsertOutcome, CatalogError>;
}
