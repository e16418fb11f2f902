// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! KVSearch - embeddable full-text search over ordered key-value stores
//!
//! Documents written to a [`storage::DocumentStore`] are analyzed into
//! inverted-index records kept in a [`storage::InvertedIndexStore`]. Free-text
//! queries are classified term by term, looked up in up to three laps and
//! consolidated into one ranked result per document.
//!
//! ```ignore
//! let manager = Arc::new(TextIndexManager::new(catalogs, Arc::new(MemoryIndexStore::new()), SearchConfig::default())?);
//! manager.attach(&documents);
//! documents.put("article", json!({"title": "Tiger"})).await?;
//! let hits = manager.search("test", "tiger", None, None).await?;
//! ```

pub mod catalog;
pub mod manager;
pub mod storage;
pub mod text;

pub use catalog::{Catalog, IndexConfig, Source};
pub use manager::TextIndexManager;
pub use storage::{
    open_index_store, DocumentStore, InvertedIndexStore, Key, MemoryDocumentStore,
    MemoryIndexStore, StorageType, WriteEvent, WriteHook, WriteMethod,
};
pub use text::{RankEntryJson, ResultEntryJson, SearchConfig, TextSearchError, TextSearchResult};
