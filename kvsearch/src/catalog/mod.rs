// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Full-text catalog configuration
//!
//! A catalog names a full-text index and lists the `(store, keyPath)` sources
//! that feed it, each with a relevance weight. Catalogs are loaded once and
//! shared read-only afterwards.

use crate::text::errors::{TextSearchError, TextSearchResult};
use crate::text::types::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One store field feeding a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub store_name: String,
    /// Field name, dotted for nested fields (`meta.title`)
    pub key_path: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Source {
    pub fn new(store_name: impl Into<String>, key_path: impl Into<String>, weight: f64) -> Self {
        Self {
            store_name: store_name.into(),
            key_path: key_path.into(),
            weight,
        }
    }

    /// Resolve the key path inside a document
    pub fn extract<'a>(&self, document: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        self.key_path
            .split('.')
            .try_fold(document, |current, field| current.get(field))
    }
}

/// A named full-text index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub name: String,
    #[serde(alias = "language", default = "default_lang")]
    pub lang: String,
    pub sources: Vec<Source>,
    /// Restrict the language's normalizer chain to these names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizers: Option<Vec<String>>,
}

fn default_lang() -> String {
    "en".to_string()
}

impl Catalog {
    pub fn new(name: impl Into<String>, lang: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            sources,
            normalizers: None,
        }
    }

    pub fn with_normalizers(mut self, normalizers: Vec<String>) -> Self {
        self.normalizers = Some(normalizers);
        self
    }

    pub fn validate(&self) -> TextSearchResult<()> {
        if self.name.is_empty() {
            return Err(TextSearchError::InvalidConfig(
                "catalog name must not be empty".to_string(),
            ));
        }
        if self.sources.is_empty() {
            return Err(TextSearchError::InvalidConfig(format!(
                "catalog '{}' has no sources",
                self.name
            )));
        }
        for source in &self.sources {
            if source.store_name.is_empty() || source.key_path.is_empty() {
                return Err(TextSearchError::InvalidConfig(format!(
                    "catalog '{}' has a source without store name or key path",
                    self.name
                )));
            }
            if !(source.weight.is_finite() && source.weight > 0.0) {
                return Err(TextSearchError::InvalidConfig(format!(
                    "catalog '{}': weight of {}.{} must be positive, got {}",
                    self.name, source.store_name, source.key_path, source.weight
                )));
            }
        }
        Ok(())
    }

    pub fn source(&self, store_name: &str, key_path: &str) -> Option<&Source> {
        self.sources
            .iter()
            .find(|s| s.store_name == store_name && s.key_path == key_path)
    }

    /// Sources reading from the given store
    pub fn sources_for<'a>(&'a self, store_name: &'a str) -> impl Iterator<Item = &'a Source> + 'a {
        self.sources.iter().filter(move |s| s.store_name == store_name)
    }

    pub fn has_store(&self, store_name: &str) -> bool {
        self.sources.iter().any(|s| s.store_name == store_name)
    }

    /// Distinct store names, in source order
    pub fn store_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for source in &self.sources {
            if !names.contains(&source.store_name.as_str()) {
                names.push(&source.store_name);
            }
        }
        names
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(rename = "fullTextCatalogs", default)]
    pub catalogs: Vec<Catalog>,
    #[serde(default)]
    pub search: SearchConfig,
}

impl IndexConfig {
    pub fn from_json_str(json: &str) -> TextSearchResult<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> TextSearchResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> TextSearchResult<()> {
        for (i, catalog) in self.catalogs.iter().enumerate() {
            catalog.validate()?;
            if self.catalogs[..i].iter().any(|c| c.name == catalog.name) {
                return Err(TextSearchError::InvalidConfig(format!(
                    "duplicate catalog '{}'",
                    catalog.name
                )));
            }
        }
        Ok(())
    }

    pub fn catalog(&self, name: &str) -> Option<&Catalog> {
        self.catalogs.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CONFIG: &str = r#"{
        "fullTextCatalogs": [{
            "name": "test",
            "lang": "en",
            "sources": [
                {"storeName": "article", "keyPath": "title", "weight": 1.0},
                {"storeName": "article", "keyPath": "body", "weight": 0.5}
            ]
        }]
    }"#;

    #[test]
    fn test_load_from_json() {
        let config = IndexConfig::from_json_str(CONFIG).unwrap();
        let catalog = config.catalog("test").unwrap();
        assert_eq!(catalog.lang, "en");
        assert_eq!(catalog.sources.len(), 2);
        assert_eq!(catalog.source("article", "body").unwrap().weight, 0.5);
        assert!(catalog.source("article", "summary").is_none());
        assert_eq!(catalog.store_names(), vec!["article"]);
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_language_alias() {
        let catalog: Catalog = serde_json::from_value(json!({
            "name": "c",
            "language": "fr",
            "sources": [{"storeName": "s", "keyPath": "k"}]
        }))
        .unwrap();
        assert_eq!(catalog.lang, "fr");
        assert_eq!(catalog.sources[0].weight, 1.0);
    }

    #[test]
    fn test_invalid_catalogs() {
        let no_sources = Catalog::new("c", "en", vec![]);
        assert!(no_sources.validate().is_err());

        let bad_weight = Catalog::new("c", "en", vec![Source::new("s", "k", 0.0)]);
        assert!(bad_weight.validate().is_err());

        let nan_weight = Catalog::new("c", "en", vec![Source::new("s", "k", f64::NAN)]);
        assert!(nan_weight.validate().is_err());

        let duplicate = IndexConfig {
            catalogs: vec![
                Catalog::new("c", "en", vec![Source::new("s", "k", 1.0)]),
                Catalog::new("c", "en", vec![Source::new("s", "j", 1.0)]),
            ],
            search: SearchConfig::default(),
        };
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_nested_key_path() {
        let source = Source::new("s", "meta.title", 1.0);
        let doc = json!({"meta": {"title": "Tiger"}});
        assert_eq!(source.extract(&doc), Some(&json!("Tiger")));
        assert_eq!(source.extract(&json!({"meta": 1})), None);
    }
}
