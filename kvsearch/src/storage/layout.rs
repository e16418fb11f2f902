// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Key layout shared by the byte-ordered backends

use super::traits::{IndexName, KeyRange};
use super::types::{RecordId, StorageDriverError, StorageResult};

/// Tree or table holding an index store's records, or one of its secondary indexes
pub(crate) fn tree_name(index_store: &str, index: Option<IndexName>) -> String {
    match index {
        Some(index) => format!("{}/{}", index_store, index.as_str()),
        None => index_store.to_string(),
    }
}

/// Byte-ordered backends only take string-encoded ids
pub(crate) fn encoded_id(id: &RecordId) -> StorageResult<&str> {
    match id {
        RecordId::Encoded(s) => Ok(s),
        RecordId::Composite(_) => Err(StorageDriverError::InvalidKey(format!(
            "composite id {} given to a byte-ordered store",
            id
        ))),
    }
}

/// `term \0 id`. Terms come out of word segmentation and never contain `\0`.
pub(crate) fn secondary_key(term: &str, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(term.len() + 1 + id.len());
    key.extend_from_slice(term.as_bytes());
    key.push(0);
    key.extend_from_slice(id);
    key
}

/// Prefix of every secondary key whose term falls in the range
pub(crate) fn secondary_prefix(range: &KeyRange) -> Vec<u8> {
    match range {
        KeyRange::Only(term) => {
            let mut prefix = term.as_bytes().to_vec();
            prefix.push(0);
            prefix
        }
        KeyRange::Prefix(prefix) => prefix.as_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secondary_prefix_matches_only_exact_term() {
        let tiger = secondary_key("tiger", b"id1");
        let tigers = secondary_key("tigers", b"id2");
        let only = secondary_prefix(&KeyRange::Only("tiger".into()));
        assert!(tiger.starts_with(&only));
        assert!(!tigers.starts_with(&only));

        let prefix = secondary_prefix(&KeyRange::Prefix("tig".into()));
        assert!(tiger.starts_with(&prefix) && tigers.starts_with(&prefix));
    }

    #[test]
    fn test_tree_names() {
        assert_eq!(tree_name("test", None), "test");
        assert_eq!(tree_name("test", Some(IndexName::Keyword)), "test/keyword");
    }
}
