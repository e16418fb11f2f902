// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Record id encoding for inverted-index entries
//!
//! An index entry is identified by `(storeName, primaryKey, keyPath, value)`.
//! Stores that order array keys natively keep the tuple as a composite key;
//! byte-ordered stores get an order-preserving string encoding instead. Both
//! strategies keep every entry of one document under a common prefix so a
//! single range removal drops the whole document.

use crate::storage::{Key, RecordId};
use crate::text::errors::{TextSearchError, TextSearchResult};

/// Identity of one inverted-index entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryId {
    pub store_name: String,
    pub primary_key: Key,
    pub key_path: String,
    pub value: String,
}

/// Half-open `[lower, upper)` record id range
pub type IdRange = (RecordId, RecordId);

/// Strategy mapping entry identities to store keys
pub trait KeyCodec: Send + Sync + std::fmt::Debug {
    fn encode(&self, id: &EntryId) -> RecordId;

    fn decode(&self, id: &RecordId) -> TextSearchResult<EntryId>;

    /// Range covering every entry of one document
    fn document_range(&self, store_name: &str, primary_key: &Key) -> IdRange;

    /// Range covering a store's entries, optionally limited to an inclusive
    /// primary key range
    fn store_range(&self, store_name: &str, keys: Option<(&Key, &Key)>) -> IdRange;
}

/// Keeps the identity tuple as a composite array key
#[derive(Debug, Default, Clone, Copy)]
pub struct CompositeKeyCodec;

impl KeyCodec for CompositeKeyCodec {
    fn encode(&self, id: &EntryId) -> RecordId {
        RecordId::Composite(vec![
            Key::Text(id.store_name.clone()),
            id.primary_key.clone(),
            Key::Text(id.key_path.clone()),
            Key::Text(id.value.clone()),
        ])
    }

    fn decode(&self, id: &RecordId) -> TextSearchResult<EntryId> {
        match id {
            RecordId::Composite(parts) => match parts.as_slice() {
                [Key::Text(store_name), primary_key, Key::Text(key_path), Key::Text(value)] => {
                    Ok(EntryId {
                        store_name: store_name.clone(),
                        primary_key: primary_key.clone(),
                        key_path: key_path.clone(),
                        value: value.clone(),
                    })
                }
                _ => Err(TextSearchError::CorruptRecord(format!(
                    "composite id {} does not have the shape [store, key, keyPath, value]",
                    id
                ))),
            },
            RecordId::Encoded(_) => Err(TextSearchError::CorruptRecord(format!(
                "expected composite id, found {}",
                id
            ))),
        }
    }

    fn document_range(&self, store_name: &str, primary_key: &Key) -> IdRange {
        let store = Key::Text(store_name.to_string());
        (
            RecordId::Composite(vec![store.clone(), primary_key.clone()]),
            RecordId::Composite(vec![store, primary_key.successor()]),
        )
    }

    fn store_range(&self, store_name: &str, keys: Option<(&Key, &Key)>) -> IdRange {
        let store = Key::Text(store_name.to_string());
        match keys {
            Some((lower, upper)) => (
                RecordId::Composite(vec![store.clone(), lower.clone()]),
                RecordId::Composite(vec![store, upper.successor()]),
            ),
            None => (
                RecordId::Composite(vec![store]),
                RecordId::Composite(vec![Key::Text(format!("{}\0", store_name))]),
            ),
        }
    }
}

/// Flattens the identity tuple into one order-preserving string.
///
/// Text parts are `s` + escaped text + `\0`, integers are `n` + 16 hex digits
/// of the sign-flipped value + `\0`. Inside text `\0` becomes `\1\1` and `\1`
/// becomes `\1\2`, so a part's terminator sorts below any content and the
/// encoding of a prefix tuple is a string prefix of the full encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct EncodedKeyCodec;

const RANGE_END: char = '\u{10FFFF}';

impl EncodedKeyCodec {
    fn push_key(out: &mut String, key: &Key) {
        match key {
            Key::Int(i) => {
                out.push('n');
                out.push_str(&format!("{:016x}", (*i as u64) ^ (1u64 << 63)));
            }
            Key::Text(text) => {
                out.push('s');
                for c in text.chars() {
                    match c {
                        '\0' => out.push_str("\u{1}\u{1}"),
                        '\u{1}' => out.push_str("\u{1}\u{2}"),
                        c => out.push(c),
                    }
                }
            }
        }
        out.push('\0');
    }

    fn prefix(parts: &[&Key]) -> String {
        let mut out = String::new();
        for part in parts {
            Self::push_key(&mut out, part);
        }
        out
    }

    fn parse(encoded: &str) -> TextSearchResult<Vec<Key>> {
        let corrupt = || TextSearchError::CorruptRecord(format!("bad encoded id {:?}", encoded));
        let mut keys = Vec::new();
        let mut chars = encoded.chars();

        while let Some(tag) = chars.next() {
            match tag {
                'n' => {
                    let digits: String = chars.by_ref().take(16).collect();
                    if digits.len() != 16 || chars.next() != Some('\0') {
                        return Err(corrupt());
                    }
                    let raw = u64::from_str_radix(&digits, 16).map_err(|_| corrupt())?;
                    keys.push(Key::Int((raw ^ (1u64 << 63)) as i64));
                }
                's' => {
                    let mut text = String::new();
                    loop {
                        match chars.next() {
                            Some('\0') => break,
                            Some('\u{1}') => match chars.next() {
                                Some('\u{1}') => text.push('\0'),
                                Some('\u{2}') => text.push('\u{1}'),
                                _ => return Err(corrupt()),
                            },
                            Some(c) => text.push(c),
                            None => return Err(corrupt()),
                        }
                    }
                    keys.push(Key::Text(text));
                }
                _ => return Err(corrupt()),
            }
        }

        Ok(keys)
    }
}

impl KeyCodec for EncodedKeyCodec {
    fn encode(&self, id: &EntryId) -> RecordId {
        let store = Key::Text(id.store_name.clone());
        let key_path = Key::Text(id.key_path.clone());
        let value = Key::Text(id.value.clone());
        RecordId::Encoded(Self::prefix(&[&store, &id.primary_key, &key_path, &value]))
    }

    fn decode(&self, id: &RecordId) -> TextSearchResult<EntryId> {
        let encoded = match id {
            RecordId::Encoded(s) => s,
            RecordId::Composite(_) => {
                return Err(TextSearchError::CorruptRecord(format!(
                    "expected encoded id, found {}",
                    id
                )))
            }
        };
        // The decoded parts have the composite shape, so reuse its validation.
        CompositeKeyCodec.decode(&RecordId::Composite(Self::parse(encoded)?))
    }

    fn document_range(&self, store_name: &str, primary_key: &Key) -> IdRange {
        let lower = Self::prefix(&[&Key::Text(store_name.to_string()), primary_key]);
        let mut upper = lower.clone();
        upper.push(RANGE_END);
        (RecordId::Encoded(lower), RecordId::Encoded(upper))
    }

    fn store_range(&self, store_name: &str, keys: Option<(&Key, &Key)>) -> IdRange {
        let store = Key::Text(store_name.to_string());
        let (lower, mut upper) = match keys {
            Some((lo, hi)) => (Self::prefix(&[&store, lo]), Self::prefix(&[&store, hi])),
            None => {
                let prefix = Self::prefix(&[&store]);
                (prefix.clone(), prefix)
            }
        };
        upper.push(RANGE_END);
        (RecordId::Encoded(lower), RecordId::Encoded(upper))
    }
}

/// Pick the codec for a store once, from its composite key support
pub fn codec_for(supports_composite_keys: bool) -> Box<dyn KeyCodec> {
    if supports_composite_keys {
        Box::new(CompositeKeyCodec)
    } else {
        Box::new(EncodedKeyCodec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(store: &str, pk: Key, key_path: &str, value: &str) -> EntryId {
        EntryId {
            store_name: store.to_string(),
            primary_key: pk,
            key_path: key_path.to_string(),
            value: value.to_string(),
        }
    }

    fn in_range(id: &RecordId, range: &IdRange) -> bool {
        &range.0 <= id && id < &range.1
    }

    #[test]
    fn test_decode_inverts_encode() {
        let ids = vec![
            entry("article", Key::from("Tiger"), "title", "Tiger"),
            entry("article", Key::Int(-42), "body", "forest"),
            entry("a\0b", Key::from("x\u{1}y"), "meta.title", "\0"),
        ];
        for codec in [codec_for(true), codec_for(false)] {
            for id in &ids {
                assert_eq!(&codec.decode(&codec.encode(id)).unwrap(), id);
            }
        }
    }

    #[test]
    fn test_document_range_is_exact() {
        for codec in [codec_for(true), codec_for(false)] {
            let range = codec.document_range("article", &Key::from("ab"));
            assert!(in_range(&codec.encode(&entry("article", Key::from("ab"), "title", "x")), &range));
            assert!(in_range(&codec.encode(&entry("article", Key::from("ab"), "body", "zzz")), &range));
            assert!(!in_range(&codec.encode(&entry("article", Key::from("abc"), "title", "x")), &range));
            assert!(!in_range(&codec.encode(&entry("article", Key::from("a"), "title", "x")), &range));
            assert!(!in_range(&codec.encode(&entry("articles", Key::from("ab"), "title", "x")), &range));

            let range = codec.document_range("article", &Key::Int(5));
            assert!(in_range(&codec.encode(&entry("article", Key::Int(5), "title", "x")), &range));
            assert!(!in_range(&codec.encode(&entry("article", Key::Int(6), "title", "x")), &range));
            assert!(!in_range(&codec.encode(&entry("article", Key::Int(4), "title", "x")), &range));
        }
    }

    #[test]
    fn test_store_range() {
        for codec in [codec_for(true), codec_for(false)] {
            let all = codec.store_range("article", None);
            assert!(in_range(&codec.encode(&entry("article", Key::Int(1), "title", "x")), &all));
            assert!(in_range(&codec.encode(&entry("article", Key::from("z"), "title", "x")), &all));
            assert!(!in_range(&codec.encode(&entry("articles", Key::from("z"), "title", "x")), &all));
            assert!(!in_range(&codec.encode(&entry("artic", Key::from("z"), "title", "x")), &all));

            let lo = Key::Int(2);
            let hi = Key::Int(4);
            let some = codec.store_range("article", Some((&lo, &hi)));
            assert!(in_range(&codec.encode(&entry("article", Key::Int(2), "title", "x")), &some));
            assert!(in_range(&codec.encode(&entry("article", Key::Int(4), "title", "x")), &some));
            assert!(!in_range(&codec.encode(&entry("article", Key::Int(5), "title", "x")), &some));
            assert!(!in_range(&codec.encode(&entry("article", Key::Int(1), "title", "x")), &some));
        }
    }

    #[test]
    fn test_encoded_preserves_integer_order() {
        let codec = EncodedKeyCodec;
        let a = codec.encode(&entry("s", Key::Int(-1), "k", "v"));
        let b = codec.encode(&entry("s", Key::Int(0), "k", "v"));
        let c = codec.encode(&entry("s", Key::Int(300), "k", "v"));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(EncodedKeyCodec.decode(&RecordId::Encoded("x".to_string())).is_err());
        assert!(EncodedKeyCodec.decode(&RecordId::Encoded("sabc".to_string())).is_err());
        assert!(CompositeKeyCodec
            .decode(&RecordId::Composite(vec![Key::from("article")]))
            .is_err());
    }
}
