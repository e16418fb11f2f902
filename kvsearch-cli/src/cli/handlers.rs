// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for KVSearch

use colored::Colorize;
use kvsearch::{open_index_store, IndexConfig, Key, StorageType, TextIndexManager};
use log::{debug, info};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::commands::OutputFormat;
use super::output::ResultFormatter;

/// Errors raised by the CLI itself
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration file not found at {0:?}")]
    MissingConfig(std::path::PathBuf),

    #[error("Store '{0}' is not a source of any catalog")]
    UnindexedStore(String),

    #[error("Expected a JSON object or array of objects in {0:?}")]
    InvalidDocuments(std::path::PathBuf),
}

/// Load the catalog configuration and open the index store
pub fn open_manager(
    config: &Path,
    storage: StorageType,
    path: &Path,
) -> Result<Arc<TextIndexManager>, Box<dyn std::error::Error>> {
    if !config.exists() {
        return Err(CliError::MissingConfig(config.to_path_buf()).into());
    }
    let config = IndexConfig::load(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if storage != StorageType::Memory {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = open_index_store(storage, path)?;
    info!("Opened {} index store at {:?}", storage, path);
    Ok(Arc::new(TextIndexManager::from_config(config, store)?))
}

/// Handle the index command
pub async fn handle_index(
    manager: &TextIndexManager,
    file: &Path,
    store: &str,
    key_path: &str,
    replace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !has_store(manager, store) {
        return Err(CliError::UnindexedStore(store.to_string()).into());
    }

    let contents = std::fs::read_to_string(file)?;
    let documents = match serde_json::from_str::<Value>(&contents)? {
        Value::Array(documents) => documents,
        document @ Value::Object(_) => vec![document],
        _ => return Err(CliError::InvalidDocuments(file.to_path_buf()).into()),
    };

    let keys: Vec<Option<Key>> = documents.iter().map(|d| key_of(d, key_path)).collect();
    debug!("Read {} documents from {:?}", documents.len(), file);

    let indexed = manager
        .index_documents(store, &keys, &documents, replace)
        .await?;
    let skipped = documents.len() - indexed;

    println!(
        "{}",
        format!("Indexed {} document(s) of '{}'", indexed, store).green()
    );
    if skipped > 0 {
        println!(
            "{}",
            format!(
                "Skipped {} document(s) without a '{}' key or with a repeated one",
                skipped, key_path
            )
            .yellow()
        );
    }
    Ok(())
}

/// Handle the search command
pub async fn handle_search(
    manager: &TextIndexManager,
    catalog: &str,
    query: &str,
    limit: Option<usize>,
    threshold: Option<f64>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let results = manager.search(catalog, query, limit, threshold).await?;
    println!("{}", ResultFormatter::format(&results, format));
    Ok(())
}

/// Handle the remove command
pub async fn handle_remove(
    manager: &TextIndexManager,
    store: &str,
    keys: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    if !has_store(manager, store) {
        return Err(CliError::UnindexedStore(store.to_string()).into());
    }

    let removed = if keys.is_empty() {
        manager.remove_store(store, None).await?
    } else {
        let keys: Vec<Option<Key>> = keys.iter().map(|k| Some(parse_key(k))).collect();
        manager.remove_documents(store, &keys).await?
    };

    println!(
        "{}",
        format!("Removed {} index record(s) of '{}'", removed, store).green()
    );
    Ok(())
}

/// Handle the version command
pub fn handle_version() {
    println!("{}", "KVSearch".bold().green());
    println!("  version:  {}", env!("CARGO_PKG_VERSION"));
    println!("  backends: {}", backends().join(", "));
}

fn backends() -> Vec<&'static str> {
    let mut backends = vec!["memory", "sled"];
    if cfg!(feature = "redb-backend") {
        backends.push("redb");
    }
    backends
}

fn has_store(manager: &TextIndexManager, store: &str) -> bool {
    manager
        .catalog_names()
        .iter()
        .filter_map(|name| manager.engine(name).ok())
        .any(|engine| engine.catalog().has_store(store))
}

/// Primary key at a dotted path
fn key_of(document: &Value, key_path: &str) -> Option<Key> {
    let value = key_path
        .split('.')
        .try_fold(document, |current, field| current.get(field))?;
    Key::from_json(value)
}

/// Command-line keys are integers when they parse as one
pub fn parse_key(raw: &str) -> Key {
    raw.parse::<i64>()
        .map(Key::Int)
        .unwrap_or_else(|_| Key::from(raw))
}
