use crate::constants::{DEFAULT_LICENSE_ID, DEFAULT_PACKAGE_TYPE};
use crate::error::{ImportError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Raw package data as returned by the source portal
pub type RawPackage = Value;

/// Placeholder id used when a raw package does not even carry an `id`
pub const UNKNOWN_PACKAGE_ID: &str = "<unknown>";

/// A single tag, shared by the source and destination shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Owning organization as reported by the source portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub name: String,
}

/// Data-quality score attached by the quality enrichment stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRecord {
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub score: f64,
    pub grade: String,
    pub recorded_at: String,
}

/// One upstream package. `id`, `name` and `title` are required; keys the
/// pipeline does not interpret are kept in `extras`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_retired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityRecord>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl SourceRecord {
    /// Decode a raw package. A missing or blank `id`/`name`, or a missing
    /// `title`, is reported as a mapping error for that package.
    pub fn from_raw(raw: RawPackage) -> Result<Self> {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        let Some(id) = id else {
            return Err(ImportError::mapping(
                UNKNOWN_PACKAGE_ID,
                ImportError::MissingField("id".to_string()),
            ));
        };

        let name_present = raw
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !name_present {
            return Err(ImportError::mapping(id, ImportError::MissingField("name".to_string())));
        }
        if raw.get("title").and_then(Value::as_str).is_none() {
            return Err(ImportError::mapping(id, ImportError::MissingField("title".to_string())));
        }

        serde_json::from_value(raw).map_err(|e| ImportError::mapping(id, e.into()))
    }

    /// Organization name, if the package has an owning organization
    pub fn organization_name(&self) -> Option<&str> {
        self.organization.as_ref().map(|o| o.name.as_str())
    }
}

/// One destination catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub owner_org: String,
    #[serde(rename = "type")]
    pub package_type: String,
    pub license_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    /// Variant-specific keys such as `quality_annotation`
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl TargetRecord {
    /// Default fields assigned to every catalogue entry before mapping
    pub fn skeleton(owner_org: &str) -> Self {
        Self {
            id: None,
            name: None,
            title: None,
            owner_org: owner_org.to_string(),
            package_type: DEFAULT_PACKAGE_TYPE.to_string(),
            license_id: DEFAULT_LICENSE_ID.to_string(),
            notes: None,
            tags: None,
            extras: BTreeMap::new(),
        }
    }

    pub fn set_extra(&mut self, key: &str, value: impl Into<Value>) {
        self.extras.insert(key.to_string(), value.into());
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get(key).and_then(Value::as_str)
    }

    /// Check that a mapper left the record addressable by `id` and `name`
    pub fn verify_identity(&self) -> Result<()> {
        if self.id.as_deref().map_or(true, str::is_empty) {
            return Err(ImportError::MissingField("id".to_string()));
        }
        if self.name.as_deref().map_or(true, str::is_empty) {
            return Err(ImportError::MissingField("name".to_string()));
        }
        Ok(())
    }
}

/// Response envelope of a CKAN action API call
#[derive(Debug, Clone, Deserialize)]
pub struct ActionEnvelope<T> {
    pub success: Option<bool>,
    pub result: Option<T>,
    pub error: Option<Value>,
}

impl<T> ActionEnvelope<T> {
    /// The `result` payload, or a description of why there is none
    pub fn into_result(self) -> std::result::Result<T, String> {
        if self.success == Some(false) {
            let detail = self.error.map(|e| e.to_string()).unwrap_or_default();
            return Err(format!("action reported failure {detail}").trim_end().to_string());
        }
        self.result.ok_or_else(|| "response has no result".to_string())
    }
}

/// License entity in the destination catalog, keyed by `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Organization entity in the destination catalog, keyed by `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(f64),
        Text(String),
    }

    match Score::deserialize(deserializer)? {
        Score::Number(n) => Ok(n),
        Score::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid score '{s}'"))),
    }
}

// CKAN extensions are inconsistent about booleans: accept true/false,
// "true"/"false", 0/1 and null.
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid boolean '{other}'"))),
        },
        Some(Value::Number(n)) => match n.as_u64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(serde::de::Error::custom(format!("invalid boolean {n}"))),
        },
        Some(other) => Err(serde::de::Error::custom(format!("invalid boolean {other}"))),
    }
}
