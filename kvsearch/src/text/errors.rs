// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Error types for text search operations

use crate::storage::StorageDriverError;
use thiserror::Error;

/// Errors that can occur in text search operations
#[derive(Error, Debug)]
pub enum TextSearchError {
    /// Search or write against a catalog that was never configured
    #[error("Unknown full-text catalog: {0}")]
    UnknownCatalog(String),

    /// Catalog language lacks a selected normalizer
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Invalid catalog or analyzer configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Stored inverted-index record could not be mapped back to a document
    #[error("Corrupt index record: {0}")]
    CorruptRecord(String),

    /// The lookup protocol was driven out of order or past its last lap
    #[error("Lookup protocol violation: {0}")]
    LookupProtocol(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageDriverError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TextSearchResult<T> = Result<T, TextSearchError>;
