// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage types and error handling
//!
//! This module defines the key types, the backend selector, and the error
//! type shared by every inverted-index store adapter.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;
use thiserror::Error;

/// Storage backend type configuration
///
/// Specifies which ordered key-value store holds the inverted index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Sled - Pure Rust embedded database
    /// Best for: Production, development, testing
    #[default]
    Sled,

    /// Redb - Pure Rust ACID-compliant embedded database
    /// Best for: ACID guarantees, crash-safety
    Redb,

    /// Memory - In-memory storage with native composite keys
    /// Best for: Unit testing, embedding without persistence
    Memory,
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageType::Sled),
            "redb" => Ok(StorageType::Redb),
            "memory" => Ok(StorageType::Memory),
            _ => Err(format!(
                "Unknown storage type: {}. Valid options: sled, redb, memory",
                s
            )),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageType::Sled => "sled",
            StorageType::Redb => "redb",
            StorageType::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// Error type for storage driver operations
#[derive(Error, Debug)]
pub enum StorageDriverError {
    /// I/O related errors (file system, etc.)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Record (de)serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid key format or content
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Backend-specific error (Sled, Redb)
    #[error("Storage driver error: {0}")]
    BackendSpecific(String),
}

impl From<serde_json::Error> for StorageDriverError {
    fn from(e: serde_json::Error) -> Self {
        StorageDriverError::SerializationError(e.to_string())
    }
}

/// Result type for storage driver operations
pub type StorageResult<T> = Result<T, StorageDriverError>;

/// A document primary key, or one component of a composite record id.
///
/// Integers sort before strings, matching the ordering of the encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl Key {
    /// Convert a JSON value into a key. Only integers and strings are valid keys.
    pub fn from_json(value: &serde_json::Value) -> Option<Key> {
        match value {
            serde_json::Value::String(s) => Some(Key::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(Key::Int),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Key::Int(i) => serde_json::Value::from(*i),
            Key::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Smallest key strictly greater than `self` in key order.
    pub fn successor(&self) -> Key {
        match self {
            Key::Int(i) if *i == i64::MAX => Key::Text(String::new()),
            Key::Int(i) => Key::Int(i + 1),
            Key::Text(s) => {
                let mut next = s.clone();
                next.push('\0');
                Key::Text(next)
            }
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Int(a), Key::Int(b)) => a.cmp(b),
            (Key::Int(_), Key::Text(_)) => Ordering::Less,
            (Key::Text(_), Key::Int(_)) => Ordering::Greater,
            (Key::Text(a), Key::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

/// Storage key of one inverted-index record.
///
/// `Composite` is used by stores that order array keys natively, `Encoded`
/// by byte-ordered stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Composite(Vec<Key>),
    Encoded(String),
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RecordId::Composite(a), RecordId::Composite(b)) => a.cmp(b),
            (RecordId::Composite(_), RecordId::Encoded(_)) => Ordering::Less,
            (RecordId::Encoded(_), RecordId::Composite(_)) => Ordering::Greater,
            (RecordId::Encoded(a), RecordId::Encoded(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Composite(parts) => {
                let parts: Vec<String> = parts.iter().map(|k| k.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            RecordId::Encoded(s) => write!(f, "{:?}", s),
        }
    }
}
