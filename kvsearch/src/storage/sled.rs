// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled inverted-index store
//!
//! Each index store maps to three sled trees: the records keyed by encoded id,
//! and one tree per secondary index keyed by `term \0 id`.

use super::layout::{encoded_id, secondary_key, secondary_prefix, tree_name};
use super::traits::{IndexName, InvertedIndexStore, KeyRange};
use super::types::{RecordId, StorageDriverError, StorageResult};
use crate::text::entry::IndexRecord;
use async_trait::async_trait;
use log::debug;
use std::path::Path;

/// Inverted-index store backed by a sled database
pub struct SledIndexStore {
    db: sled::Db,
}

impl std::fmt::Debug for SledIndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledIndexStore").finish()
    }
}

impl SledIndexStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path).map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
        Ok(Self { db })
    }

    fn tree(&self, index_store: &str, index: Option<IndexName>) -> StorageResult<sled::Tree> {
        self.db
            .open_tree(tree_name(index_store, index))
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))
    }

    fn unlink(
        value_tree: &sled::Tree,
        keyword_tree: &sled::Tree,
        record: &IndexRecord,
        id: &[u8],
    ) -> StorageResult<()> {
        value_tree
            .remove(secondary_key(&record.value, id))
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
        if let Some(keyword) = &record.keyword {
            keyword_tree
                .remove(secondary_key(keyword, id))
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
        }
        Ok(())
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.db
            .flush()
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl InvertedIndexStore for SledIndexStore {
    fn supports_composite_keys(&self) -> bool {
        false
    }

    async fn put(&self, index_store: &str, records: Vec<IndexRecord>) -> StorageResult<()> {
        let main = self.tree(index_store, None)?;
        let value_tree = self.tree(index_store, Some(IndexName::Value))?;
        let keyword_tree = self.tree(index_store, Some(IndexName::Keyword))?;

        for record in records {
            let id = encoded_id(&record.id)?.as_bytes().to_vec();
            let bytes = serde_json::to_vec(&record)?;

            let previous = main
                .insert(id.as_slice(), bytes)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            if let Some(previous) = previous {
                let old: IndexRecord = serde_json::from_slice(&previous)?;
                Self::unlink(&value_tree, &keyword_tree, &old, &id)?;
            }

            value_tree
                .insert(secondary_key(&record.value, &id), id.as_slice())
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            if let Some(keyword) = &record.keyword {
                keyword_tree
                    .insert(secondary_key(keyword, &id), id.as_slice())
                    .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn remove_range(
        &self,
        index_store: &str,
        lower: &RecordId,
        upper: &RecordId,
    ) -> StorageResult<usize> {
        let lower = encoded_id(lower)?.as_bytes();
        let upper = encoded_id(upper)?.as_bytes();
        if lower >= upper {
            return Ok(0);
        }

        let main = self.tree(index_store, None)?;
        let value_tree = self.tree(index_store, Some(IndexName::Value))?;
        let keyword_tree = self.tree(index_store, Some(IndexName::Keyword))?;

        let mut removed = 0;
        for item in main.range(lower..upper) {
            let (id, bytes) = item.map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            let record: IndexRecord = serde_json::from_slice(&bytes)?;
            Self::unlink(&value_tree, &keyword_tree, &record, &id)?;
            main.remove(&id)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            removed += 1;
        }
        debug!("Removed {} records from sled tree '{}'", removed, index_store);
        Ok(removed)
    }

    async fn range_query(
        &self,
        index_store: &str,
        index: IndexName,
        range: &KeyRange,
        limit: usize,
    ) -> StorageResult<Vec<IndexRecord>> {
        let main = self.tree(index_store, None)?;
        let secondary = self.tree(index_store, Some(index))?;

        let mut records = Vec::new();
        for item in secondary.scan_prefix(secondary_prefix(range)) {
            if records.len() >= limit {
                break;
            }
            let (_, id) = item.map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            let bytes = main
                .get(&id)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            if let Some(bytes) = bytes {
                records.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(records)
    }
}
