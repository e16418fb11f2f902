// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Per-catalog query engine: document analysis and query classification

use crate::catalog::Catalog;
use crate::storage::Key;
use crate::text::entry::IndexEntry;
use crate::text::errors::TextSearchError;
use crate::text::key_codec::KeyCodec;
use crate::text::normalizer::NormalizerChain;
use crate::text::result_set::ResultSet;
use crate::text::token::{QueryToken, Scored};
use crate::text::tokenizer::tokenize;
use crate::text::types::{QueryType, SearchConfig};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Tokenizes and normalizes text for one catalog
pub struct QueryEngine {
    catalog: Arc<Catalog>,
    normalizers: NormalizerChain,
    config: SearchConfig,
    /// Number of documents in the catalog's stores, unknown until first counted
    total_doc: RwLock<Option<u64>>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("catalog", &self.catalog.name)
            .field("normalizers", &self.normalizers)
            .field("total_doc", &*self.total_doc.read())
            .finish()
    }
}

impl QueryEngine {
    pub fn new(catalog: Arc<Catalog>, config: SearchConfig) -> Result<Self, TextSearchError> {
        catalog.validate()?;
        let normalizers =
            NormalizerChain::for_language(&catalog.lang, catalog.normalizers.as_deref())?;
        Ok(Self {
            catalog,
            normalizers,
            config,
            total_doc: RwLock::new(None),
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn normalize(&self, word: &str) -> Option<String> {
        self.normalizers.normalize(word)
    }

    pub fn set_total_doc(&self, total: u64) {
        *self.total_doc.write() = Some(total);
    }

    /// Adjust the document count after writes; ignored until the count is known
    pub fn add_total_doc(&self, delta: i64) {
        let mut total = self.total_doc.write();
        if let Some(current) = total.as_mut() {
            *current = if delta >= 0 {
                current.saturating_add(delta as u64)
            } else {
                current.saturating_sub(delta.unsigned_abs())
            };
        }
    }

    /// Forget the document count so the next search counts again
    pub fn reset_total_doc(&self) {
        *self.total_doc.write() = None;
    }

    pub fn total_doc(&self) -> Option<u64> {
        *self.total_doc.read()
    }

    pub fn has_init(&self) -> bool {
        self.total_doc.read().is_some()
    }

    /// Index entries of one document: one per distinct raw token value per field.
    ///
    /// Fields that are missing or not strings are skipped. Words rejected by
    /// normalization are still indexed, without a keyword.
    pub fn analyze(&self, store_name: &str, primary_key: &Key, document: &Value) -> Vec<IndexEntry> {
        let mut entries = Vec::new();

        for source in self.catalog.sources_for(store_name) {
            let text = match source.extract(document) {
                Some(Value::String(text)) => text,
                _ => continue,
            };

            let mut field_entries: Vec<IndexEntry> = Vec::new();
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for segment in tokenize(text) {
                let idx = *seen.entry(segment.word).or_insert_with(|| {
                    field_entries.push(IndexEntry::new(
                        store_name,
                        source.key_path.as_str(),
                        primary_key.clone(),
                        segment.word,
                        self.normalize(segment.word),
                    ));
                    field_entries.len() - 1
                });
                field_entries[idx].encounter(segment.position);
            }
            entries.extend(field_entries);
        }

        entries
    }

    /// Split a query into classified, scored terms.
    ///
    /// A term followed by `*` is a prefix term, a term wrapped in quotes is
    /// exact, and a term (or its opening quote) preceded by `-` is negated.
    pub fn parse_query(&self, text: &str) -> Vec<QueryToken> {
        let mut tokens: Vec<QueryToken> = Vec::new();

        for (index, segment) in tokenize(text).into_iter().enumerate() {
            let end = segment.end();
            let next = text[end..].chars().next();
            let mut before = text[..segment.offset].chars().rev();
            let prev = before.next();

            let is_prefix = next == Some('*');
            let closing = if is_prefix {
                text[end + 1..].chars().next()
            } else {
                next
            };
            let is_quoted = prev == Some('"') && closing == Some('"');
            let minus = if is_quoted { before.next() } else { prev };
            let is_not = minus == Some('-');

            let keyword = self.normalize(segment.word);
            let query_type = if is_prefix {
                QueryType::Prefix
            } else if is_quoted {
                QueryType::Exact
            } else if is_not {
                QueryType::Not
            } else if keyword.as_deref().is_some_and(|k| k != segment.word) {
                QueryType::Phonetic
            } else {
                QueryType::None
            };

            tokens.push(QueryToken::new(
                segment.word,
                keyword,
                query_type,
                segment.offset,
                index,
            ));
        }

        let total: f64 = tokens.iter().map(|t| t.score()).sum();
        let factor = if total > 0.0 { 1.0 / total } else { 1.0 };
        for token in &mut tokens {
            token.set_averaging_factor(factor);
        }

        tokens
    }

    /// Start a search. Returns `None` when the query has no terms.
    pub fn query(
        &self,
        text: &str,
        limit: Option<usize>,
        threshold: Option<f64>,
        codec: Arc<dyn KeyCodec>,
    ) -> Option<ResultSet> {
        let tokens = self.parse_query(text);
        if tokens.is_empty() {
            return None;
        }
        Some(ResultSet::new(
            self.catalog.clone(),
            tokens,
            limit.unwrap_or(self.config.default_limit),
            threshold.unwrap_or(self.config.default_threshold),
            codec,
            self.config.tf_mode,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Source;
    use crate::text::key_codec::CompositeKeyCodec;
    use serde_json::json;

    fn engine() -> QueryEngine {
        let catalog = Catalog::new(
            "test",
            "en",
            vec![
                Source::new("article", "title", 1.0),
                Source::new("article", "body", 0.5),
            ],
        );
        QueryEngine::new(Arc::new(catalog), SearchConfig::default()).unwrap()
    }

    fn types(tokens: &[QueryToken]) -> Vec<QueryType> {
        tokens.iter().map(|t| t.query_type).collect()
    }

    #[test]
    fn test_analyze_one_entry_per_value_per_field() {
        let engine = engine();
        let doc = json!({"title": "Tiger", "body": "Tiger live in forest. tiger Tiger"});
        let entries = engine.analyze("article", &Key::from("Tiger"), &doc);

        let title: Vec<&IndexEntry> = entries.iter().filter(|e| e.key_path == "title").collect();
        assert_eq!(title.len(), 1);
        assert_eq!(title[0].positions, vec![0]);

        let body: Vec<&IndexEntry> = entries.iter().filter(|e| e.key_path == "body").collect();
        let values: Vec<&str> = body.iter().map(|e| e.value()).collect();
        assert_eq!(values, vec!["Tiger", "live", "in", "forest", "tiger"]);
        assert_eq!(body[0].positions, vec![0, 28]);
        assert_eq!(body[4].positions, vec![22]);
    }

    #[test]
    fn test_analyze_keeps_words_without_keyword() {
        let engine = engine();
        let entries = engine.analyze("article", &Key::Int(1), &json!({"body": "in"}));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].keyword(), None);
    }

    #[test]
    fn test_analyze_skips_other_stores_and_non_strings() {
        let engine = engine();
        assert!(engine.analyze("news", &Key::Int(1), &json!({"title": "Tiger"})).is_empty());
        assert!(engine.analyze("article", &Key::Int(1), &json!({"title": 42})).is_empty());
        assert!(engine.analyze("article", &Key::Int(1), &json!({})).is_empty());
    }

    #[test]
    fn test_query_classification() {
        let engine = engine();
        let tokens = engine.parse_query("tiger \"forest\" -lion tig* Tigers -\"cat\"");
        assert_eq!(
            types(&tokens),
            vec![
                QueryType::None,
                QueryType::Exact,
                QueryType::Not,
                QueryType::Prefix,
                QueryType::Phonetic,
                QueryType::Exact,
            ]
        );
        assert_eq!(tokens[1].position, 7);
        assert_eq!(tokens[4].keyword(), Some("tiger"));
    }

    #[test]
    fn test_quoted_negation_is_exact() {
        // quotes take precedence over the minus sign
        let engine = engine();
        let tokens = engine.parse_query("-\"cat\"");
        assert_eq!(types(&tokens), vec![QueryType::Exact]);
    }

    #[test]
    fn test_query_scores_sum_to_one() {
        let engine = engine();
        let tokens = engine.parse_query("tiger forest tig*");
        let total: f64 = tokens.iter().map(|t| t.score()).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(tokens[0].score() > tokens[1].score());
    }

    #[test]
    fn test_all_negated_query_keeps_unit_factor() {
        let engine = engine();
        let tokens = engine.parse_query("-tiger");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].averaging_factor, 1.0);
        assert_eq!(tokens[0].score(), 0.0);
    }

    #[test]
    fn test_noise_query_yields_no_result_set() {
        let engine = engine();
        assert!(engine.parse_query(" ,.! ").is_empty());
        assert!(engine.query(" ,.! ", None, None, Arc::new(CompositeKeyCodec)).is_none());
        assert!(engine.query("tiger", None, None, Arc::new(CompositeKeyCodec)).is_some());
    }

    #[test]
    fn test_total_doc_tracking() {
        let engine = engine();
        assert!(!engine.has_init());
        engine.add_total_doc(5);
        assert_eq!(engine.total_doc(), None);
        engine.set_total_doc(2);
        engine.add_total_doc(3);
        engine.add_total_doc(-10);
        assert_eq!(engine.total_doc(), Some(0));
        assert!(engine.has_init());
    }

    #[test]
    fn test_unsupported_language_has_no_keywords() {
        let catalog = Catalog::new("c", "my", vec![Source::new("s", "k", 1.0)]);
        let engine = QueryEngine::new(Arc::new(catalog), SearchConfig::default()).unwrap();
        let tokens = engine.parse_query("Tiger");
        assert_eq!(tokens[0].keyword(), None);
        assert_eq!(tokens[0].query_type, QueryType::None);
    }
}
