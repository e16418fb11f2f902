// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage layer for inverted-index records
//!
//! This module provides:
//! - Key and record id types shared by every backend
//! - The store interfaces the search core depends on
//! - In-memory stores (index and documents)
//! - Sled and REDB inverted-index stores behind cargo features

pub mod memory;
pub mod traits;
pub mod types;

#[cfg(any(feature = "sled-backend", feature = "redb-backend"))]
mod layout;
#[cfg(feature = "redb-backend")]
pub mod redb;
#[cfg(feature = "sled-backend")]
pub mod sled;

pub use memory::{MemoryDocumentStore, MemoryIndexStore};
pub use traits::{
    DocumentStore, IndexName, InvertedIndexStore, KeyRange, WriteEvent, WriteHook, WriteMethod,
};
pub use types::{Key, RecordId, StorageDriverError, StorageResult, StorageType};

use std::path::Path;
use std::sync::Arc;

/// Open an inverted-index store of the given type.
///
/// `path` is ignored for the memory store. Disk backends compiled out by
/// cargo features are reported as errors.
pub fn open_index_store<P: AsRef<Path>>(
    storage_type: StorageType,
    path: P,
) -> StorageResult<Arc<dyn InvertedIndexStore>> {
    match storage_type {
        StorageType::Memory => Ok(Arc::new(MemoryIndexStore::new())),
        #[cfg(feature = "sled-backend")]
        StorageType::Sled => Ok(Arc::new(sled::SledIndexStore::open(path)?)),
        #[cfg(feature = "redb-backend")]
        StorageType::Redb => Ok(Arc::new(redb::RedbIndexStore::open(path)?)),
        #[allow(unreachable_patterns)]
        other => {
            let _ = path;
            Err(StorageDriverError::BackendSpecific(format!(
                "storage type '{}' is not enabled in this build",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory_store() {
        let store = open_index_store(StorageType::Memory, "unused").unwrap();
        assert!(store.supports_composite_keys());
    }

    #[cfg(not(feature = "redb-backend"))]
    #[test]
    fn test_disabled_backend_is_an_error() {
        assert!(open_index_store(StorageType::Redb, "unused").is_err());
    }
}
