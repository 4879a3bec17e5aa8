use crate::app::ports::{CatalogContext, ContextProvider};

/// Builds privileged contexts for a fixed site user
pub struct SiteUserContext {
    site_user: String,
}

impl SiteUserContext {
    pub fn new(site_user: impl Into<String>) -> Self {
        Self {
            site_user: site_user.into(),
        }
    }
}

impl ContextProvider for SiteUserContext {
    fn build_context(&self) -> CatalogContext {
        CatalogContext::privileged(self.site_user.clone())
    }
}

/// Provider that never grants privileges; creates through it are rejected
pub struct AnonymousContext;

impl ContextProvider for AnonymousContext {
    fn build_context(&self) -> CatalogContext {
        CatalogContext::anonymous()
    }
}
