use std::collections::HashMap;
use std::sync::Arc;

use super::mappers::{
    FieldMapper, LicenseMapper, MetricsMapper, OrganizationFrontendMapper, OrganizationMapper,
    QualityMapper, ReferenceHandle, SimpleMapper, TagMapper,
};
use crate::constants::get_supported_importers;
use crate::error::{ImportError, Result};

/// Registry of importer strategies, keyed by importer name
pub struct MapperRegistry {
    mappers: HashMap<String, Arc<dyn FieldMapper>>,
}

impl MapperRegistry {
    /// Create a registry holding every built-in importer
    pub fn new(name_prefix: &str, references: ReferenceHandle) -> Self {
        let mut registry = Self::empty();

        registry.register(Arc::new(MetricsMapper::new(SimpleMapper::new(name_prefix))));
        registry.register(Arc::new(MetricsMapper::new(LicenseMapper::new(
            name_prefix,
            references.clone(),
        ))));
        registry.register(Arc::new(MetricsMapper::new(OrganizationMapper::new(
            name_prefix,
            references,
        ))));
        registry.register(Arc::new(MetricsMapper::new(OrganizationFrontendMapper::new(
            name_prefix,
        ))));
        registry.register(Arc::new(MetricsMapper::new(TagMapper::new(name_prefix))));
        registry.register(Arc::new(MetricsMapper::new(QualityMapper::new(name_prefix))));

        registry
    }

    pub fn empty() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// Register a mapper under its own key, replacing any previous one
    pub fn register(&mut self, mapper: Arc<dyn FieldMapper>) {
        self.mappers.insert(mapper.key().to_string(), mapper);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn FieldMapper>> {
        self.mappers.get(key).cloned()
    }

    /// Look up the configured importer; an unknown key is a configuration error
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn FieldMapper>> {
        self.get(key).ok_or_else(|| {
            ImportError::Configuration(format!(
                "Unknown importer '{}'. Available: {}",
                key,
                self.list_importers().join(", ")
            ))
        })
    }

    /// Registered keys, built-ins first in their documented order
    pub fn list_importers(&self) -> Vec<&str> {
        let builtin = get_supported_importers();
        let mut keys: Vec<&str> = builtin
            .iter()
            .copied()
            .filter(|k| self.mappers.contains_key(*k))
            .collect();
        let mut custom: Vec<&str> = self
            .mappers
            .keys()
            .map(String::as_str)
            .filter(|k| !builtin.iter().any(|b| b == k))
            .collect();
        custom.sort_unstable();
        keys.extend(custom);
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::super::mappers::base::test_support::{references, skeleton, source};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_has_built_in_mappers() {
        let (refs, _) = references();
        let registry = MapperRegistry::new("city-toronto", refs);

        assert_eq!(
            registry.list_importers(),
            vec!["simple", "license", "organization", "organization-frontend", "tags", "quality"]
        );
    }

    #[test]
    fn test_registry_returns_error_for_unknown_importer() {
        let (refs, _) = references();
        let registry = MapperRegistry::new("city-toronto", refs);

        let err = registry.resolve("socrata").err().unwrap();
        assert!(matches!(err, ImportError::Configuration(_)));
        assert!(err.to_string().contains("simple"));
    }

    #[test]
    fn test_every_mapper_sets_identity_triplet() {
        let (refs, _) = references();
        let registry = MapperRegistry::new("city-toronto", refs);
        let src = source(json!({
            "id": "7f1c", "name": "street-trees", "title": "Street Trees",
            "license_id": "city-of-toronto-license",
            "organization": {"name": "city-of-toronto"},
            "tags": [{"name": "trees"}],
            "quality": {"score": 0.5, "grade": "B", "recorded_at": "2024-02-02"}
        }));

        for key in registry.list_importers() {
            let mapper = registry.resolve(key).unwrap();
            let target = mapper.map(&src, skeleton()).unwrap();
            assert_eq!(target.name.as_deref(), Some("city-toronto-street-trees"), "{key}");
            assert_eq!(target.id.as_deref(), Some("7f1c"), "{key}");
            assert_eq!(target.title.as_deref(), Some("Street Trees"), "{key}");
        }
    }

    #[test]
    fn test_every_mapper_is_idempotent() {
        let (refs, _) = references();
        let registry = MapperRegistry::new("city-toronto", refs);
        let src = source(json!({
            "id": "7f1c", "name": "street-trees", "title": "Street Trees",
            "license_id": "city-of-toronto-license",
            "organization": {"name": "city-of-toronto"},
            "owner_division": "Transportation Services",
            "tags": [{"name": "Trees & Shrubs"}]
        }));

        for key in registry.list_importers() {
            let mapper = registry.resolve(key).unwrap();
            let first = mapper.map(&src, skeleton()).unwrap();
            let second = mapper.map(&src, skeleton()).unwrap();
            assert_eq!(first, second, "{key}");
        }
    }
}
