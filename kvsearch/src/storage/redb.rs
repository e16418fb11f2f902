// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! REDB inverted-index store
//!
//! Same layout as the sled store: one table of records keyed by encoded id
//! and one table per secondary index keyed by `term \0 id`. Every put and
//! range removal runs in a single write transaction.

use super::layout::{encoded_id, secondary_key, secondary_prefix, tree_name};
use super::traits::{IndexName, InvertedIndexStore, KeyRange};
use super::types::{RecordId, StorageDriverError, StorageResult};
use crate::text::entry::IndexRecord;
use async_trait::async_trait;
use log::debug;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use std::path::Path;
use std::sync::Arc;

/// Inverted-index store backed by a REDB database file
pub struct RedbIndexStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbIndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbIndexStore").finish()
    }
}

impl RedbIndexStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        // REDB requires a file path, not a directory
        let db_path = if path.as_ref().is_dir() {
            path.as_ref().join("kvsearch.redb")
        } else {
            path.as_ref().to_path_buf()
        };

        let db = Database::create(&db_path)
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

        Ok(RedbIndexStore { db: Arc::new(db) })
    }
}

fn unlink(
    value_table: &mut redb::Table<'_, &'static [u8], &'static [u8]>,
    keyword_table: &mut redb::Table<'_, &'static [u8], &'static [u8]>,
    record: &IndexRecord,
    id: &[u8],
) -> StorageResult<()> {
    value_table
        .remove(secondary_key(&record.value, id).as_slice())
        .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
    if let Some(keyword) = &record.keyword {
        keyword_table
            .remove(secondary_key(keyword, id).as_slice())
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
    }
    Ok(())
}

#[async_trait]
impl InvertedIndexStore for RedbIndexStore {
    fn supports_composite_keys(&self) -> bool {
        false
    }

    async fn put(&self, index_store: &str, records: Vec<IndexRecord>) -> StorageResult<()> {
        let main_name = tree_name(index_store, None);
        let value_name = tree_name(index_store, Some(IndexName::Value));
        let keyword_name = tree_name(index_store, Some(IndexName::Keyword));

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

        {
            let main_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&main_name);
            let value_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&value_name);
            let keyword_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&keyword_name);
            let mut main = write_txn
                .open_table(main_def)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            let mut value_table = write_txn
                .open_table(value_def)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            let mut keyword_table = write_txn
                .open_table(keyword_def)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

            for record in records {
                let id = encoded_id(&record.id)?.as_bytes().to_vec();
                let bytes = serde_json::to_vec(&record)?;

                let previous: Option<Vec<u8>> = main
                    .insert(id.as_slice(), bytes.as_slice())
                    .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?
                    .map(|guard| guard.value().to_vec());
                if let Some(previous) = previous {
                    let old: IndexRecord = serde_json::from_slice(&previous)?;
                    unlink(&mut value_table, &mut keyword_table, &old, &id)?;
                }

                value_table
                    .insert(secondary_key(&record.value, &id).as_slice(), id.as_slice())
                    .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
                if let Some(keyword) = &record.keyword {
                    keyword_table
                        .insert(secondary_key(keyword, &id).as_slice(), id.as_slice())
                        .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
                }
            }
        }

        write_txn
            .commit()
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

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

        let main_name = tree_name(index_store, None);
        let value_name = tree_name(index_store, Some(IndexName::Value));
        let keyword_name = tree_name(index_store, Some(IndexName::Keyword));

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

        let removed = {
            let main_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&main_name);
            let value_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&value_name);
            let keyword_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&keyword_name);
            let mut main = write_txn
                .open_table(main_def)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            let mut value_table = write_txn
                .open_table(value_def)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            let mut keyword_table = write_txn
                .open_table(keyword_def)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

            // Collect first, the range borrows the table
            let doomed: Vec<(Vec<u8>, Vec<u8>)> = main
                .range(lower..upper)
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?
                .map(|result| {
                    result
                        .map(|(k, v)| (k.value().to_vec(), v.value().to_vec()))
                        .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))
                })
                .collect::<StorageResult<_>>()?;

            for (id, bytes) in &doomed {
                let record: IndexRecord = serde_json::from_slice(bytes)?;
                unlink(&mut value_table, &mut keyword_table, &record, id)?;
                main.remove(id.as_slice())
                    .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            }
            doomed.len()
        };

        write_txn
            .commit()
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

        debug!("Removed {} records from redb table '{}'", removed, index_store);
        Ok(removed)
    }

    async fn range_query(
        &self,
        index_store: &str,
        index: IndexName,
        range: &KeyRange,
        limit: usize,
    ) -> StorageResult<Vec<IndexRecord>> {
        let main_name = tree_name(index_store, None);
        let secondary_name = tree_name(index_store, Some(index));

        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;

        let main_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&main_name);
        let secondary_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&secondary_name);
        let main = match read_txn.open_table(main_def) {
            Ok(table) => table,
            // nothing was ever written to this index store
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(StorageDriverError::BackendSpecific(e.to_string())),
        };
        let secondary = match read_txn.open_table(secondary_def) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(StorageDriverError::BackendSpecific(e.to_string())),
        };

        let prefix = secondary_prefix(range);
        let mut records = Vec::new();
        for item in secondary
            .range(prefix.as_slice()..)
            .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?
        {
            if records.len() >= limit {
                break;
            }
            let (key, id) = item.map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            if !key.value().starts_with(&prefix) {
                break;
            }
            let bytes = main
                .get(id.value())
                .map_err(|e| StorageDriverError::BackendSpecific(e.to_string()))?;
            if let Some(bytes) = bytes {
                records.push(serde_json::from_slice(bytes.value())?);
            }
        }
        Ok(records)
    }
}
