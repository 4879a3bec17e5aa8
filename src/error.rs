use std::fmt;
use thiserror::Error;

/// Kind of shared entity the reference resolver manages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    License,
    Organization,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::License => write!(f, "license"),
            ReferenceKind::Organization => write!(f, "organization"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Enrichment failed for package {id}: {reason}")]
    Enrichment { id: String, reason: String },

    #[error("Mapping failed for package {id}: {cause}")]
    Mapping {
        id: String,
        #[source]
        cause: Box<ImportError>,
    },

    #[error("Destination rejected {kind} '{key}': {reason}")]
    ReferenceConflict {
        kind: ReferenceKind,
        key: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source listing failed: {0}")]
    Source(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Wrap an error raised while mapping the package `id`
    pub fn mapping(id: impl Into<String>, cause: ImportError) -> Self {
        match cause {
            // already carries the package id
            ImportError::Mapping { .. } => cause,
            other => ImportError::Mapping {
                id: id.into(),
                cause: Box::new(other),
            },
        }
    }

    /// Package id for per-record errors, `None` for run-level failures
    pub fn record_id(&self) -> Option<&str> {
        match self {
            ImportError::Enrichment { id, .. } | ImportError::Mapping { id, .. } => Some(id),
            _ => None,
        }
    }

    /// True for errors scoped to a single record, which a caller may skip
    pub fn is_per_record(&self) -> bool {
        self.record_id().is_some()
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Rejection reasons reported by a destination catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: String, key: String },

    #[error("operation requires a privileged context")]
    Unauthorized,

    #[error("{0}")]
    Rejected(String),
}
