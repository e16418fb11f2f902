// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Index entries, query matches and per-document rank entries
//!
//! - [`IndexEntry`]: one token of one document field, as written to the index
//! - [`IndexRecord`]: the persisted form of an [`IndexEntry`]
//! - [`ResultEntry`]: a stored record matched by one [`QueryToken`]
//! - [`RankEntry`]: all matches of one document, consolidated

use crate::catalog::Catalog;
use crate::storage::{Key, RecordId};
use crate::text::errors::TextSearchResult;
use crate::text::key_codec::{EntryId, KeyCodec};
use crate::text::similarity::dice_coefficient;
use crate::text::token::{QueryToken, Scored, TokenCore};
use crate::text::types::{QueryType, TfMode};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// Occurrences of one token value in one document field
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub core: TokenCore,
    pub store_name: String,
    pub key_path: String,
    pub primary_key: Key,
    /// Character offsets of every occurrence within the field
    pub positions: Vec<usize>,
}

impl IndexEntry {
    pub fn new(
        store_name: impl Into<String>,
        key_path: impl Into<String>,
        primary_key: Key,
        value: impl Into<String>,
        keyword: Option<String>,
    ) -> Self {
        Self {
            core: TokenCore::new(value, keyword),
            store_name: store_name.into(),
            key_path: key_path.into(),
            primary_key,
            positions: Vec::new(),
        }
    }

    /// Record another occurrence
    pub fn encounter(&mut self, position: usize) {
        self.positions.push(position);
        self.core.score = None;
    }

    pub fn value(&self) -> &str {
        &self.core.value
    }

    pub fn keyword(&self) -> Option<&str> {
        self.core.keyword.as_deref()
    }

    pub fn frequency(&self) -> usize {
        self.positions.len()
    }

    pub fn term_frequency(&self, mode: TfMode) -> f64 {
        mode.term_frequency(self.frequency())
    }

    pub fn id(&self) -> EntryId {
        EntryId {
            store_name: self.store_name.clone(),
            primary_key: self.primary_key.clone(),
            key_path: self.key_path.clone(),
            value: self.core.value.clone(),
        }
    }

    /// Storage score from the position distribution: early and repeated
    /// occurrences score higher.
    fn storage_score(&self) -> f64 {
        let occurrence_boost: f64 = self
            .positions
            .iter()
            .map(|&p| (PI - (1.0 + p as f64).ln()) / 10.0)
            .sum();
        let count_boost = (1.0 + self.frequency() as f64).ln().abs() / 10.0;
        1.0 + occurrence_boost * 1.5 + count_boost * 3.0
    }

    /// Persisted form. The stored value is case-folded; the id keeps the raw value.
    pub fn to_record(&self, codec: &dyn KeyCodec) -> IndexRecord {
        IndexRecord {
            keyword: self.core.keyword.clone(),
            value: self.core.value.to_lowercase(),
            key_path: self.key_path.clone(),
            primary_key: self.primary_key.clone(),
            store_name: self.store_name.clone(),
            score: self.score(),
            id: codec.encode(&self.id()),
            positions: self.positions.clone(),
        }
    }
}

impl Scored for IndexEntry {
    fn score(&self) -> f64 {
        self.core.score.unwrap_or_else(|| self.storage_score())
    }
}

/// One inverted-index record as persisted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub keyword: Option<String>,
    pub value: String,
    pub key_path: String,
    pub primary_key: Key,
    pub store_name: String,
    pub score: f64,
    pub id: RecordId,
    #[serde(default)]
    pub positions: Vec<usize>,
}

/// A stored entry matched by one query token
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub entry: IndexEntry,
    pub query: Arc<QueryToken>,
}

impl ResultEntry {
    /// Rebuild the matched entry from a stored record.
    ///
    /// Returns `Ok(None)` when an exact query meets a different raw value.
    pub fn from_record(
        query: Arc<QueryToken>,
        record: &IndexRecord,
        codec: &dyn KeyCodec,
        tf_mode: TfMode,
    ) -> TextSearchResult<Option<Self>> {
        let id = codec.decode(&record.id)?;
        if query.query_type == QueryType::Exact && id.value != query.value() {
            return Ok(None);
        }

        let mut entry = IndexEntry::new(
            id.store_name,
            id.key_path,
            id.primary_key,
            id.value,
            record.keyword.clone(),
        );
        entry.positions = record.positions.clone();

        let similarity = dice_coefficient(query.value(), entry.value());
        entry.core.score =
            Some(entry.term_frequency(tf_mode) * similarity * query.score());

        Ok(Some(Self { entry, query }))
    }

    pub fn store_name(&self) -> &str {
        &self.entry.store_name
    }

    pub fn primary_key(&self) -> &Key {
        &self.entry.primary_key
    }

    pub fn key_path(&self) -> &str {
        &self.entry.key_path
    }

    pub fn value(&self) -> &str {
        self.entry.value()
    }

    pub fn query_type(&self) -> QueryType {
        self.query.query_type
    }

    /// `ln(total_docs / (1 + frequency))`, or 1 before the corpus size is known
    pub fn inverse_document_frequency(&self, total_docs: u64) -> f64 {
        if total_docs == 0 {
            return 1.0;
        }
        (total_docs as f64 / (1.0 + self.entry.frequency() as f64)).ln()
    }

    pub fn to_json(&self) -> ResultEntryJson {
        ResultEntryJson {
            key_path: self.entry.key_path.clone(),
            value: self.entry.core.value.clone(),
            positions: self.entry.positions.clone(),
            score: self.score(),
        }
    }
}

impl Scored for ResultEntry {
    fn score(&self) -> f64 {
        self.entry.score()
    }
}

/// All matches of one document
#[derive(Debug, Clone)]
pub struct RankEntry<'a> {
    catalog: &'a Catalog,
    results: Vec<&'a ResultEntry>,
}

impl<'a> RankEntry<'a> {
    pub fn new(catalog: &'a Catalog, result: &'a ResultEntry) -> Self {
        Self {
            catalog,
            results: vec![result],
        }
    }

    pub fn store_name(&self) -> &str {
        self.first().store_name()
    }

    pub fn primary_key(&self) -> &Key {
        self.first().primary_key()
    }

    pub fn value(&self) -> &str {
        self.first().value()
    }

    pub fn results(&self) -> &[&'a ResultEntry] {
        &self.results
    }

    pub fn is_same_document(&self, result: &ResultEntry) -> bool {
        self.store_name() == result.store_name() && self.primary_key() == result.primary_key()
    }

    /// Add a match of the same document. A `(keyPath, value)` pair already
    /// present is not counted twice; returns whether the entry was added.
    pub fn merge(&mut self, result: &'a ResultEntry) -> bool {
        debug_assert!(self.is_same_document(result));
        let duplicate = self
            .results
            .iter()
            .any(|r| r.key_path() == result.key_path() && r.value() == result.value());
        if duplicate {
            return false;
        }
        self.results.push(result);
        true
    }

    pub fn to_json(&self) -> RankEntryJson {
        RankEntryJson {
            value: self.value().to_string(),
            primary_key: self.primary_key().clone(),
            store_name: self.store_name().to_string(),
            score: self.score(),
            tokens: self.results.iter().map(|r| r.to_json()).collect(),
        }
    }

    fn first(&self) -> &'a ResultEntry {
        // never empty: created with one result and only grows
        self.results[0]
    }
}

impl Scored for RankEntry<'_> {
    fn score(&self) -> f64 {
        self.results
            .iter()
            .map(|r| {
                let weight = self
                    .catalog
                    .source(r.store_name(), r.key_path())
                    .map(|s| s.weight)
                    .unwrap_or(0.0);
                r.score() * weight
            })
            .sum()
    }
}

/// Search result for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntryJson {
    pub value: String,
    pub primary_key: Key,
    pub store_name: String,
    pub score: f64,
    pub tokens: Vec<ResultEntryJson>,
}

/// One matched field token of a search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntryJson {
    pub key_path: String,
    pub value: String,
    pub positions: Vec<usize>,
    pub score: f64,
}
