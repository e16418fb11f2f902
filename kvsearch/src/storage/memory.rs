// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory stores
//!
//! [`MemoryIndexStore`] keeps inverted-index records in ordered maps and orders
//! composite keys natively. [`MemoryDocumentStore`] is a small document store
//! that reports every write to its registered hooks, which is enough to embed
//! the indexer without an external database.

use super::traits::{DocumentStore, IndexName, InvertedIndexStore, KeyRange, WriteEvent, WriteHook, WriteMethod};
use super::types::{Key, RecordId, StorageDriverError, StorageResult};
use crate::text::entry::IndexRecord;
use crate::text::errors::TextSearchResult;
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Debug, Default)]
struct IndexTable {
    records: BTreeMap<RecordId, IndexRecord>,
    by_value: BTreeSet<(String, RecordId)>,
    by_keyword: BTreeSet<(String, RecordId)>,
}

impl IndexTable {
    fn secondary(&self, index: IndexName) -> &BTreeSet<(String, RecordId)> {
        match index {
            IndexName::Value => &self.by_value,
            IndexName::Keyword => &self.by_keyword,
        }
    }

    fn unlink(&mut self, record: &IndexRecord) {
        self.by_value.remove(&(record.value.clone(), record.id.clone()));
        if let Some(keyword) = &record.keyword {
            self.by_keyword.remove(&(keyword.clone(), record.id.clone()));
        }
    }

    fn insert(&mut self, record: IndexRecord) {
        if let Some(old) = self.records.remove(&record.id) {
            self.unlink(&old);
        }
        self.by_value.insert((record.value.clone(), record.id.clone()));
        if let Some(keyword) = &record.keyword {
            self.by_keyword.insert((keyword.clone(), record.id.clone()));
        }
        self.records.insert(record.id.clone(), record);
    }
}

/// Inverted-index store held in memory
#[derive(Debug)]
pub struct MemoryIndexStore {
    tables: RwLock<HashMap<String, IndexTable>>,
    composite_keys: bool,
}

impl MemoryIndexStore {
    /// Store with native composite keys
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            composite_keys: true,
        }
    }

    /// Store that asks for string-encoded keys, like a byte-ordered backend
    pub fn with_encoded_keys() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            composite_keys: false,
        }
    }

    /// Number of records in an index store
    pub fn len(&self, index_store: &str) -> usize {
        self.tables
            .read()
            .get(index_store)
            .map(|t| t.records.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, index_store: &str) -> bool {
        self.len(index_store) == 0
    }

    /// Copy of every record, in id order
    pub fn records(&self, index_store: &str) -> Vec<IndexRecord> {
        self.tables
            .read()
            .get(index_store)
            .map(|t| t.records.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest record id in the id order
fn min_record_id() -> RecordId {
    RecordId::Composite(Vec::new())
}

#[async_trait]
impl InvertedIndexStore for MemoryIndexStore {
    fn supports_composite_keys(&self) -> bool {
        self.composite_keys
    }

    async fn put(&self, index_store: &str, records: Vec<IndexRecord>) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let table = tables.entry(index_store.to_string()).or_default();
        for record in records {
            match (&record.id, self.composite_keys) {
                (RecordId::Composite(_), true) | (RecordId::Encoded(_), false) => {}
                _ => {
                    return Err(StorageDriverError::InvalidKey(format!(
                        "record id {} does not match the store key mode",
                        record.id
                    )))
                }
            }
            table.insert(record);
        }
        Ok(())
    }

    async fn remove_range(
        &self,
        index_store: &str,
        lower: &RecordId,
        upper: &RecordId,
    ) -> StorageResult<usize> {
        if lower >= upper {
            return Ok(0);
        }
        let mut tables = self.tables.write();
        let table = match tables.get_mut(index_store) {
            Some(table) => table,
            None => return Ok(0),
        };

        let ids: Vec<RecordId> = table
            .records
            .range(lower.clone()..upper.clone())
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            if let Some(record) = table.records.remove(id) {
                table.unlink(&record);
            }
        }
        debug!("Removed {} records from '{}'", ids.len(), index_store);
        Ok(ids.len())
    }

    async fn range_query(
        &self,
        index_store: &str,
        index: IndexName,
        range: &KeyRange,
        limit: usize,
    ) -> StorageResult<Vec<IndexRecord>> {
        let tables = self.tables.read();
        let table = match tables.get(index_store) {
            Some(table) => table,
            None => return Ok(Vec::new()),
        };

        let start = (range.start().to_string(), min_record_id());
        let records = table
            .secondary(index)
            .range(start..)
            .take_while(|(term, _)| range.contains(term))
            .filter_map(|(_, id)| table.records.get(id).cloned())
            .take(limit)
            .collect();
        Ok(records)
    }
}

#[derive(Debug, Default)]
struct DocumentTable {
    key_path: Option<String>,
    documents: BTreeMap<Key, Value>,
}

impl DocumentTable {
    fn key_of(&self, document: &Value) -> Option<Key> {
        let key_path = self.key_path.as_ref()?;
        let value = key_path
            .split('.')
            .try_fold(document, |current, field| current.get(field))?;
        Key::from_json(value)
    }
}

/// Document store held in memory that notifies write hooks
#[derive(Default)]
pub struct MemoryDocumentStore {
    stores: RwLock<HashMap<String, DocumentTable>>,
    hooks: RwLock<Vec<Arc<dyn WriteHook>>>,
}

impl std::fmt::Debug for MemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocumentStore")
            .field("stores", &self.stores.read().keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.read().len())
            .finish()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store. With a key path, documents carry their own primary key.
    pub fn create_store(&self, name: &str, key_path: Option<&str>) {
        self.stores.write().insert(
            name.to_string(),
            DocumentTable {
                key_path: key_path.map(str::to_string),
                documents: BTreeMap::new(),
            },
        );
    }

    pub fn get(&self, store_name: &str, key: &Key) -> Option<Value> {
        self.stores
            .read()
            .get(store_name)
            .and_then(|t| t.documents.get(key).cloned())
    }

    /// Insert or replace a document keyed by its key path
    pub async fn put(&self, store_name: &str, document: Value) -> TextSearchResult<Key> {
        let keys = self.write_documents(store_name, vec![document.clone()], None, true)?;
        let key = single_key(store_name, &keys)?;
        self.notify(WriteEvent::new(WriteMethod::Put, store_name).with_documents(keys, vec![document]))
            .await?;
        Ok(key)
    }

    /// Insert or replace a document under an explicit key
    pub async fn put_keyed(&self, store_name: &str, key: Key, document: Value) -> TextSearchResult<()> {
        let keys = self.write_documents(store_name, vec![document.clone()], Some(vec![key]), true)?;
        self.notify(WriteEvent::new(WriteMethod::Put, store_name).with_documents(keys, vec![document]))
            .await
    }

    /// Insert or replace many documents. Documents without a valid key are
    /// not stored and reported with a `None` key.
    pub async fn puts(&self, store_name: &str, documents: Vec<Value>) -> TextSearchResult<Vec<Option<Key>>> {
        let keys = self.write_documents(store_name, documents.clone(), None, true)?;
        self.notify(WriteEvent::new(WriteMethod::Puts, store_name).with_documents(keys.clone(), documents))
            .await?;
        Ok(keys)
    }

    /// Insert a new document; fails when the key already exists
    pub async fn add(&self, store_name: &str, document: Value) -> TextSearchResult<Key> {
        let keys = self.write_documents(store_name, vec![document.clone()], None, false)?;
        let key = single_key(store_name, &keys)?;
        self.notify(WriteEvent::new(WriteMethod::Add, store_name).with_documents(keys, vec![document]))
            .await?;
        Ok(key)
    }

    /// Insert many new documents
    pub async fn adds(&self, store_name: &str, documents: Vec<Value>) -> TextSearchResult<Vec<Option<Key>>> {
        let keys = self.write_documents(store_name, documents.clone(), None, false)?;
        self.notify(WriteEvent::new(WriteMethod::Adds, store_name).with_documents(keys.clone(), documents))
            .await?;
        Ok(keys)
    }

    /// Delete one document
    pub async fn remove(&self, store_name: &str, key: &Key) -> TextSearchResult<bool> {
        let removed = {
            let mut stores = self.stores.write();
            let table = stores
                .get_mut(store_name)
                .ok_or_else(|| unknown_store(store_name))?;
            table.documents.remove(key).is_some()
        };
        if removed {
            self.notify(WriteEvent::new(WriteMethod::RemoveId, store_name).with_keys(vec![Some(key.clone())]))
                .await?;
        }
        Ok(removed)
    }

    /// Delete every document with `lower <= key <= upper`
    pub async fn remove_range(&self, store_name: &str, lower: Key, upper: Key) -> TextSearchResult<usize> {
        let removed = {
            let mut stores = self.stores.write();
            let table = stores
                .get_mut(store_name)
                .ok_or_else(|| unknown_store(store_name))?;
            let keys: Vec<Key> = if lower <= upper {
                table
                    .documents
                    .range(lower.clone()..=upper.clone())
                    .map(|(k, _)| k.clone())
                    .collect()
            } else {
                Vec::new()
            };
            for key in &keys {
                table.documents.remove(key);
            }
            keys.len()
        };
        self.notify(WriteEvent::new(WriteMethod::Remove, store_name).with_key_range(lower, upper))
            .await?;
        Ok(removed)
    }

    /// Delete every document of a store
    pub async fn clear(&self, store_name: &str) -> TextSearchResult<usize> {
        let removed = {
            let mut stores = self.stores.write();
            let table = stores
                .get_mut(store_name)
                .ok_or_else(|| unknown_store(store_name))?;
            let n = table.documents.len();
            table.documents.clear();
            n
        };
        self.notify(WriteEvent::new(WriteMethod::Clear, store_name)).await?;
        Ok(removed)
    }

    fn write_documents(
        &self,
        store_name: &str,
        documents: Vec<Value>,
        explicit_keys: Option<Vec<Key>>,
        overwrite: bool,
    ) -> StorageResult<Vec<Option<Key>>> {
        let mut stores = self.stores.write();
        let table = stores
            .get_mut(store_name)
            .ok_or_else(|| unknown_store(store_name))?;

        let mut keys = Vec::with_capacity(documents.len());
        for (i, document) in documents.into_iter().enumerate() {
            let key = match &explicit_keys {
                Some(explicit) => explicit.get(i).cloned(),
                None => table.key_of(&document),
            };
            if let Some(key) = &key {
                if !overwrite && table.documents.contains_key(key) {
                    return Err(StorageDriverError::InvalidKey(format!(
                        "key {} already exists in '{}'",
                        key, store_name
                    )));
                }
                table.documents.insert(key.clone(), document);
            }
            keys.push(key);
        }
        Ok(keys)
    }

    async fn notify(&self, event: WriteEvent) -> TextSearchResult<()> {
        let hooks: Vec<Arc<dyn WriteHook>> = self.hooks.read().clone();
        for hook in hooks {
            hook.on_write(&event).await?;
        }
        Ok(())
    }
}

fn unknown_store(store_name: &str) -> StorageDriverError {
    StorageDriverError::BackendSpecific(format!("store '{}' does not exist", store_name))
}

fn single_key(store_name: &str, keys: &[Option<Key>]) -> StorageResult<Key> {
    keys.first().cloned().flatten().ok_or_else(|| {
        StorageDriverError::InvalidKey(format!("document for '{}' has no valid primary key", store_name))
    })
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn on_write(&self, hook: Arc<dyn WriteHook>) {
        self.hooks.write().push(hook);
    }

    async fn count(&self, store_name: &str) -> StorageResult<u64> {
        Ok(self
            .stores
            .read()
            .get(store_name)
            .map(|t| t.documents.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: RecordId, value: &str, keyword: Option<&str>) -> IndexRecord {
        IndexRecord {
            keyword: keyword.map(str::to_string),
            value: value.to_string(),
            key_path: "title".to_string(),
            primary_key: Key::Int(1),
            store_name: "article".to_string(),
            score: 1.0,
            id,
            positions: vec![0],
        }
    }

    fn id(parts: &[&str]) -> RecordId {
        RecordId::Composite(parts.iter().map(|p| Key::from(*p)).collect())
    }

    #[tokio::test]
    async fn test_put_and_range_query() {
        let store = MemoryIndexStore::new();
        store
            .put(
                "test",
                vec![
                    record(id(&["a", "1", "t", "tiger"]), "tiger", Some("tiger")),
                    record(id(&["a", "2", "t", "tigers"]), "tigers", Some("tiger")),
                    record(id(&["a", "3", "t", "in"]), "in", None),
                ],
            )
            .await
            .unwrap();

        let exact = store
            .range_query("test", IndexName::Value, &KeyRange::Only("tiger".into()), 100)
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let prefix = store
            .range_query("test", IndexName::Value, &KeyRange::Prefix("tig".into()), 100)
            .await
            .unwrap();
        assert_eq!(prefix.len(), 2);

        let keyword = store
            .range_query("test", IndexName::Keyword, &KeyRange::Only("tiger".into()), 1)
            .await
            .unwrap();
        assert_eq!(keyword.len(), 1);

        let missing = store
            .range_query("other", IndexName::Value, &KeyRange::Only("tiger".into()), 100)
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_put_replaces_and_unlinks() {
        let store = MemoryIndexStore::new();
        let rid = id(&["a", "1", "t", "x"]);
        store.put("test", vec![record(rid.clone(), "old", Some("old"))]).await.unwrap();
        store.put("test", vec![record(rid, "new", None)]).await.unwrap();
        assert_eq!(store.len("test"), 1);
        let old = store
            .range_query("test", IndexName::Keyword, &KeyRange::Only("old".into()), 100)
            .await
            .unwrap();
        assert!(old.is_empty());
    }

    #[tokio::test]
    async fn test_remove_range() {
        let store = MemoryIndexStore::new();
        store
            .put(
                "test",
                vec![
                    record(id(&["a", "1", "t", "x"]), "x", None),
                    record(id(&["a", "1", "b", "y"]), "y", None),
                    record(id(&["a", "2", "t", "x"]), "x", None),
                ],
            )
            .await
            .unwrap();
        let removed = store
            .remove_range("test", &id(&["a", "1"]), &id(&["a", "1\0"]))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len("test"), 1);
        assert_eq!(store.remove_range("test", &id(&["b"]), &id(&["a"])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_key_mode_is_enforced() {
        let store = MemoryIndexStore::with_encoded_keys();
        let err = store.put("test", vec![record(id(&["a"]), "x", None)]).await;
        assert!(matches!(err, Err(StorageDriverError::InvalidKey(_))));
    }

    struct Recorder(parking_lot::Mutex<Vec<WriteEvent>>);

    #[async_trait]
    impl WriteHook for Recorder {
        async fn on_write(&self, event: &WriteEvent) -> TextSearchResult<()> {
            self.0.lock().push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_document_store_events() {
        let docs = MemoryDocumentStore::new();
        docs.create_store("article", Some("title"));
        let recorder = Arc::new(Recorder(parking_lot::Mutex::new(Vec::new())));
        docs.on_write(recorder.clone());

        let key = docs.put("article", json!({"title": "Tiger"})).await.unwrap();
        assert_eq!(key, Key::from("Tiger"));
        let keys = docs
            .adds("article", vec![json!({"title": "Lion"}), json!({"body": "no key"})])
            .await
            .unwrap();
        assert_eq!(keys, vec![Some(Key::from("Lion")), None]);
        assert!(docs.add("article", json!({"title": "Lion"})).await.is_err());
        assert_eq!(docs.count("article").await.unwrap(), 2);

        docs.remove("article", &Key::from("Lion")).await.unwrap();
        docs.clear("article").await.unwrap();

        let methods: Vec<WriteMethod> = recorder.0.lock().iter().map(|e| e.method).collect();
        assert_eq!(
            methods,
            vec![WriteMethod::Put, WriteMethod::Adds, WriteMethod::RemoveId, WriteMethod::Clear]
        );
        assert_eq!(docs.count("article").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_silent() {
        let docs = MemoryDocumentStore::new();
        docs.create_store("n", Some("id"));
        let recorder = Arc::new(Recorder(parking_lot::Mutex::new(Vec::new())));
        docs.on_write(recorder.clone());

        docs.put("n", json!({ "id": 1 })).await.unwrap();
        assert!(!docs.remove("n", &Key::Int(99)).await.unwrap());
        let methods: Vec<WriteMethod> = recorder.0.lock().iter().map(|e| e.method).collect();
        assert_eq!(methods, vec![WriteMethod::Put]);
    }

    #[tokio::test]
    async fn test_document_remove_range() {
        let docs = MemoryDocumentStore::new();
        docs.create_store("n", Some("id"));
        for i in 0..5 {
            docs.put("n", json!({ "id": i })).await.unwrap();
        }
        let removed = docs.remove_range("n", Key::Int(1), Key::Int(3)).await.unwrap();
        assert_eq!(removed, 3);
        assert!(docs.get("n", &Key::Int(0)).is_some());
        assert!(docs.get("n", &Key::Int(2)).is_none());
    }
}
