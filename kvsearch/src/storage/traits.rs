// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage interfaces the search core depends on
//!
//! The indexer only needs two narrow capabilities from its host:
//! - [`InvertedIndexStore`]: put, range removal and secondary-index range
//!   queries over inverted-index records
//! - [`DocumentStore`]: a write notification channel and a document count
//!
//! Concrete backends live in sibling modules.

use super::types::{Key, RecordId, StorageResult};
use crate::text::entry::IndexRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Secondary index of an inverted-index store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    /// Case-folded token value
    Value,
    /// Normalized keyword
    Keyword,
}

impl IndexName {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::Value => "value",
            IndexName::Keyword => "keyword",
        }
    }

    /// Indexed term of a record, `None` when the record is absent from this index
    pub fn term<'a>(&self, record: &'a IndexRecord) -> Option<&'a str> {
        match self {
            IndexName::Value => Some(record.value.as_str()),
            IndexName::Keyword => record.keyword.as_deref(),
        }
    }
}

impl std::fmt::Display for IndexName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Range over the terms of a secondary index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRange {
    /// Terms equal to the given one
    Only(String),
    /// Terms starting with the given prefix
    Prefix(String),
}

impl KeyRange {
    pub fn contains(&self, term: &str) -> bool {
        match self {
            KeyRange::Only(t) => term == t,
            KeyRange::Prefix(p) => term.starts_with(p.as_str()),
        }
    }

    pub fn start(&self) -> &str {
        match self {
            KeyRange::Only(t) | KeyRange::Prefix(t) => t,
        }
    }
}

/// Ordered key-value store holding inverted-index records.
///
/// Each catalog owns one index store, named after the catalog.
#[async_trait]
pub trait InvertedIndexStore: Send + Sync {
    /// Whether composite array keys are ordered natively
    fn supports_composite_keys(&self) -> bool;

    /// Insert or replace records by id
    async fn put(&self, index_store: &str, records: Vec<IndexRecord>) -> StorageResult<()>;

    /// Remove records with `lower <= id < upper`, returning how many were removed
    async fn remove_range(
        &self,
        index_store: &str,
        lower: &RecordId,
        upper: &RecordId,
    ) -> StorageResult<usize>;

    /// Records whose term in `index` falls in `range`, in term order, at most `limit`
    async fn range_query(
        &self,
        index_store: &str,
        index: IndexName,
        range: &KeyRange,
        limit: usize,
    ) -> StorageResult<Vec<IndexRecord>>;
}

/// Write method reported by a document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMethod {
    Put,
    Puts,
    Add,
    Adds,
    Remove,
    RemoveId,
    Clear,
}

impl WriteMethod {
    /// Writes that replace a document's previous content
    pub fn is_update(&self) -> bool {
        matches!(self, WriteMethod::Put | WriteMethod::Puts)
    }

    /// Writes that only add new documents
    pub fn is_insert(&self) -> bool {
        matches!(self, WriteMethod::Add | WriteMethod::Adds)
    }
}

impl std::fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WriteMethod::Put => "PUT",
            WriteMethod::Puts => "PUTS",
            WriteMethod::Add => "ADD",
            WriteMethod::Adds => "ADDS",
            WriteMethod::Remove => "REMOVE",
            WriteMethod::RemoveId => "REMOVE_ID",
            WriteMethod::Clear => "CLEAR",
        };
        write!(f, "{}", name)
    }
}

/// A completed document write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteEvent {
    pub method: WriteMethod,
    pub store_name: String,
    /// Keys of written documents, parallel to `documents`. `None` marks a
    /// document whose key could not be resolved.
    pub keys: Vec<Option<Key>>,
    pub documents: Vec<Value>,
    /// Inclusive primary key range of a `REMOVE`
    pub key_range: Option<(Key, Key)>,
}

impl WriteEvent {
    pub fn new(method: WriteMethod, store_name: impl Into<String>) -> Self {
        Self {
            method,
            store_name: store_name.into(),
            keys: Vec::new(),
            documents: Vec::new(),
            key_range: None,
        }
    }

    pub fn with_documents(mut self, keys: Vec<Option<Key>>, documents: Vec<Value>) -> Self {
        self.keys = keys;
        self.documents = documents;
        self
    }

    pub fn with_keys(mut self, keys: Vec<Option<Key>>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_key_range(mut self, lower: Key, upper: Key) -> Self {
        self.key_range = Some((lower, upper));
        self
    }
}

/// Callback run after every document write
#[async_trait]
pub trait WriteHook: Send + Sync {
    async fn on_write(&self, event: &WriteEvent) -> crate::text::errors::TextSearchResult<()>;
}

/// Document store the indexer is attached to
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Register a hook that runs after each write
    fn on_write(&self, hook: Arc<dyn WriteHook>);

    /// Number of documents in a store
    async fn count(&self, store_name: &str) -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_range_contains() {
        assert!(KeyRange::Only("tiger".into()).contains("tiger"));
        assert!(!KeyRange::Only("tiger".into()).contains("tigers"));
        assert!(KeyRange::Prefix("tig".into()).contains("tigers"));
        assert!(!KeyRange::Prefix("tig".into()).contains("ti"));
    }

    #[test]
    fn test_write_method_kinds() {
        assert!(WriteMethod::Puts.is_update());
        assert!(!WriteMethod::Add.is_update());
        assert!(WriteMethod::Adds.is_insert());
        assert_eq!(WriteMethod::RemoveId.to_string(), "REMOVE_ID");
    }
}
