use crate::constants::{
    BASE_API_KEY, DEFAULT_NAME_PREFIX, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECONDS,
    NAME_PREFIX_KEY, PAGE_SIZE_KEY, QUALITY_IMPORTER, TIMEOUT_SECONDS_KEY,
};
use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "import.toml";

/// Environment variable overriding the settings file location
pub const CONFIG_PATH_ENV: &str = "CATALOG_IMPORT_CONFIG";

/// Environment variable overriding `other_config.base_api`
pub const BASE_API_ENV: &str = "CATALOG_IMPORT_BASE_API";

/// Source portal platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ckan,
}

/// Configuration of one import run. Never mutated once the driver owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub owner_org: String,
    pub platform: Platform,
    #[serde(default)]
    pub other_config: BTreeMap<String, Value>,
}

impl ImportConfig {
    pub fn new(owner_org: impl Into<String>, base_api: impl Into<String>) -> Self {
        let mut other_config = BTreeMap::new();
        other_config.insert(BASE_API_KEY.to_string(), Value::String(base_api.into()));
        Self {
            id: Uuid::new_v4(),
            owner_org: owner_org.into(),
            platform: Platform::Ckan,
            other_config,
        }
    }

    /// Add an `other_config` entry
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.other_config.insert(key.to_string(), value.into());
        self
    }

    /// Root endpoint of the source portal, without a trailing slash
    pub fn base_api(&self) -> Result<&str> {
        match self.other_config.get(BASE_API_KEY) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().trim_end_matches('/')),
            Some(_) => Err(ImportError::Configuration(format!(
                "other_config.{BASE_API_KEY} must be a non-empty string"
            ))),
            None => Err(ImportError::Configuration(format!(
                "other_config.{BASE_API_KEY} is required"
            ))),
        }
    }

    pub fn name_prefix(&self) -> Result<String> {
        match self.other_config.get(NAME_PREFIX_KEY) {
            None => Ok(DEFAULT_NAME_PREFIX.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => {
                Ok(s.trim().trim_end_matches('-').to_string())
            }
            Some(_) => Err(ImportError::Configuration(format!(
                "other_config.{NAME_PREFIX_KEY} must be a non-empty string"
            ))),
        }
    }

    pub fn page_size(&self) -> Result<usize> {
        self.positive_int(PAGE_SIZE_KEY, DEFAULT_PAGE_SIZE as u64)
            .map(|n| n as usize)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        self.positive_int(TIMEOUT_SECONDS_KEY, DEFAULT_TIMEOUT_SECONDS)
            .map(Duration::from_secs)
    }

    /// Check every recognised option up front so misconfiguration is fatal
    /// before any package is fetched
    pub fn validate(&self) -> Result<()> {
        if self.owner_org.trim().is_empty() {
            return Err(ImportError::Configuration("owner_org is required".to_string()));
        }
        self.base_api()?;
        self.name_prefix()?;
        self.page_size()?;
        self.request_timeout()?;
        Ok(())
    }

    fn positive_int(&self, key: &str, default: u64) -> Result<u64> {
        match self.other_config.get(key) {
            None => Ok(default),
            Some(v) => v.as_u64().filter(|n| *n > 0).ok_or_else(|| {
                ImportError::Configuration(format!(
                    "other_config.{key} must be a positive integer, got {v}"
                ))
            }),
        }
    }
}

fn default_importer() -> String {
    QUALITY_IMPORTER.to_string()
}

fn default_site_user() -> String {
    "site-admin".to_string()
}

/// Contents of the settings file: which importer to run and its import config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_importer")]
    pub importer: String,
    #[serde(default)]
    pub fail_fast: bool,
    /// User the destination catalog context is built for
    #[serde(default = "default_site_user")]
    pub site_user: String,
    pub import: ImportConfig,
}

impl Settings {
    /// Load settings from `path`, or from `CATALOG_IMPORT_CONFIG` /
    /// `import.toml` when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let config_path = match (path, env_path.as_deref()) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(p)) => Path::new(p).to_path_buf(),
            (None, None) => Path::new(DEFAULT_CONFIG_PATH).to_path_buf(),
        };

        let content = fs::read_to_string(&config_path).map_err(|e| {
            ImportError::Configuration(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut settings = Self::from_toml(&content)?;
        if let Ok(base_api) = std::env::var(BASE_API_ENV) {
            settings
                .import
                .other_config
                .insert(BASE_API_KEY.to_string(), Value::String(base_api));
        }
        settings.import.validate()?;
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }
}
