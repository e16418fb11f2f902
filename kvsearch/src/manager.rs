// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Full-text index manager
//!
//! Owns one [`QueryEngine`] per catalog and the inverted-index store they
//! share. On the write path it turns document writes into record puts and
//! range removals; on the read path it drives a [`ResultSet`] through its
//! lookup laps against the store.

use crate::catalog::{Catalog, IndexConfig};
use crate::storage::{DocumentStore, InvertedIndexStore, Key, WriteEvent, WriteHook, WriteMethod};
use crate::text::analyzer::QueryEngine;
use crate::text::entry::{IndexEntry, IndexRecord, RankEntryJson};
use crate::text::errors::{TextSearchError, TextSearchResult};
use crate::text::key_codec::{codec_for, KeyCodec};
use crate::text::result_set::NextAction;
use crate::text::types::SearchConfig;
use async_trait::async_trait;
use futures::future::try_join_all;
use log::{debug, info, warn};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Manager for all full-text catalogs
pub struct TextIndexManager {
    engines: HashMap<String, Arc<QueryEngine>>,
    /// Catalog names in configuration order
    order: Vec<String>,
    store: Arc<dyn InvertedIndexStore>,
    codec: Arc<dyn KeyCodec>,
    documents: RwLock<Option<Weak<dyn DocumentStore>>>,
    config: SearchConfig,
}

impl std::fmt::Debug for TextIndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextIndexManager")
            .field("catalogs", &self.order)
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish()
    }
}

impl TextIndexManager {
    pub fn new(
        catalogs: Vec<Catalog>,
        store: Arc<dyn InvertedIndexStore>,
        config: SearchConfig,
    ) -> TextSearchResult<Self> {
        let codec: Arc<dyn KeyCodec> = Arc::from(codec_for(store.supports_composite_keys()));
        let mut engines = HashMap::new();
        let mut order = Vec::new();

        for catalog in catalogs {
            let name = catalog.name.clone();
            if engines.contains_key(&name) {
                return Err(TextSearchError::InvalidConfig(format!(
                    "duplicate catalog '{}'",
                    name
                )));
            }
            let engine = QueryEngine::new(Arc::new(catalog), config.clone())?;
            info!("Registered full-text catalog '{}'", name);
            engines.insert(name.clone(), Arc::new(engine));
            order.push(name);
        }

        Ok(Self {
            engines,
            order,
            store,
            codec,
            documents: RwLock::new(None),
            config,
        })
    }

    pub fn from_config(config: IndexConfig, store: Arc<dyn InvertedIndexStore>) -> TextSearchResult<Self> {
        config.validate()?;
        Self::new(config.catalogs, store, config.search)
    }

    /// Index every write of a document store from now on
    pub fn attach<D: DocumentStore + 'static>(self: &Arc<Self>, documents: &Arc<D>) {
        let documents: Arc<dyn DocumentStore> = documents.clone();
        *self.documents.write() = Some(Arc::downgrade(&documents));
        documents.on_write(self.clone());
    }

    pub fn engine(&self, catalog_name: &str) -> TextSearchResult<&Arc<QueryEngine>> {
        self.engines
            .get(catalog_name)
            .ok_or_else(|| TextSearchError::UnknownCatalog(catalog_name.to_string()))
    }

    pub fn catalog_names(&self) -> &[String] {
        &self.order
    }

    pub fn codec(&self) -> &Arc<dyn KeyCodec> {
        &self.codec
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Engines of catalogs with a source on the store
    fn engines_for_store(&self, store_name: &str) -> Vec<&Arc<QueryEngine>> {
        self.order
            .iter()
            .filter_map(|name| self.engines.get(name))
            .filter(|engine| engine.catalog().has_store(store_name))
            .collect()
    }

    /// Count the catalog's documents the first time it is searched.
    ///
    /// The count is kept for inverse document frequency only; ranking itself
    /// does not weigh terms by IDF, so results are the same without it.
    async fn ensure_total_doc(&self, engine: &QueryEngine) -> TextSearchResult<()> {
        if engine.has_init() {
            return Ok(());
        }
        let documents = self.documents.read().as_ref().and_then(Weak::upgrade);
        if let Some(documents) = documents {
            let mut total = 0;
            for store_name in engine.catalog().store_names() {
                total += documents.count(store_name).await?;
            }
            debug!("Catalog '{}' covers {} documents", engine.catalog().name, total);
            engine.set_total_doc(total);
        }
        Ok(())
    }

    /// Ranked documents matching a free-text query.
    ///
    /// A query without any term returns no results. `threshold` lets the
    /// search stop after an early lap once `limit` documents reach it.
    pub async fn search(
        &self,
        catalog_name: &str,
        query: &str,
        limit: Option<usize>,
        threshold: Option<f64>,
    ) -> TextSearchResult<Vec<RankEntryJson>> {
        let engine = self.engine(catalog_name)?;
        self.ensure_total_doc(engine).await?;

        let mut result_set = match engine.query(query, limit, threshold, self.codec.clone()) {
            Some(result_set) => result_set,
            None => {
                debug!("Query '{}' contains only noise, ignoring search", query);
                return Ok(Vec::new());
            }
        };

        loop {
            let lookups = result_set.next_lookup()?;
            if lookups.is_empty() {
                break;
            }

            let batches = try_join_all(lookups.iter().map(|lookup| {
                self.store.range_query(
                    &lookup.store_name,
                    lookup.index,
                    &lookup.range,
                    self.config.lookup_limit,
                )
            }))
            .await?;

            let mut action = NextAction::Wait;
            for (lookup, records) in lookups.iter().zip(batches) {
                action = result_set.add_result(lookup.token, records)?;
            }
            match action {
                NextAction::Lookup => continue,
                NextAction::Collect => break,
                NextAction::Wait => {
                    return Err(TextSearchError::LookupProtocol(
                        "lap finished with lookups still pending".to_string(),
                    ))
                }
            }
        }

        let mut results = result_set.collect();
        results.truncate(result_set.limit());
        debug!(
            "Search '{}' in '{}' matched {} documents",
            query,
            catalog_name,
            results.len()
        );
        Ok(results)
    }

    /// Analyze and store documents of a store.
    ///
    /// With `replace`, a document's previous entries are removed first.
    /// Documents without a key are skipped. Returns the number indexed.
    pub async fn index_documents(
        &self,
        store_name: &str,
        keys: &[Option<Key>],
        documents: &[Value],
        replace: bool,
    ) -> TextSearchResult<usize> {
        if keys.len() != documents.len() {
            return Err(TextSearchError::InvalidConfig(format!(
                "{} keys given for {} documents of '{}'",
                keys.len(),
                documents.len(),
                store_name
            )));
        }
        let engines = self.engines_for_store(store_name);
        if engines.is_empty() {
            return Ok(0);
        }

        for (i, key) in keys.iter().enumerate() {
            if key.is_none() {
                warn!(
                    "Skipping document {} of '{}': missing or invalid primary key",
                    i, store_name
                );
            }
        }

        // a key written twice in one batch keeps its last document
        let mut latest: HashMap<&Key, usize> = HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            if let Some(key) = key {
                latest.insert(key, i);
            }
        }
        let batch: Vec<(&Key, &Value)> = keys
            .iter()
            .zip(documents)
            .enumerate()
            .filter_map(|(i, (key, document))| {
                key.as_ref()
                    .filter(|key| latest.get(key) == Some(&i))
                    .map(|key| (key, document))
            })
            .collect();

        let mut indexed = 0;
        for engine in engines {
            let analyzed: Vec<(&Key, Vec<IndexEntry>)> = batch
                .par_iter()
                .map(|(key, document)| (*key, engine.analyze(store_name, key, document)))
                .collect();

            let index_store = engine.catalog().name.as_str();
            if replace {
                for (key, _) in &analyzed {
                    let (lower, upper) = self.codec.document_range(store_name, key);
                    self.store.remove_range(index_store, &lower, &upper).await?;
                }
            }

            let records: Vec<IndexRecord> = analyzed
                .iter()
                .flat_map(|(_, entries)| entries.iter().map(|e| e.to_record(self.codec.as_ref())))
                .collect();
            debug!(
                "Indexing {} documents of '{}' into '{}' ({} records)",
                analyzed.len(),
                store_name,
                index_store,
                records.len()
            );
            self.store.put(index_store, records).await?;
            indexed = analyzed.len();
        }

        Ok(indexed)
    }

    /// Remove every entry of the given documents. Returns the records removed.
    pub async fn remove_documents(&self, store_name: &str, keys: &[Option<Key>]) -> TextSearchResult<usize> {
        let mut removed = 0;
        for engine in self.engines_for_store(store_name) {
            for key in keys.iter().flatten() {
                let (lower, upper) = self.codec.document_range(store_name, key);
                removed += self
                    .store
                    .remove_range(&engine.catalog().name, &lower, &upper)
                    .await?;
            }
        }
        Ok(removed)
    }

    /// Remove a store's entries, optionally only for an inclusive key range
    pub async fn remove_store(&self, store_name: &str, key_range: Option<(&Key, &Key)>) -> TextSearchResult<usize> {
        let mut removed = 0;
        for engine in self.engines_for_store(store_name) {
            let (lower, upper) = self.codec.store_range(store_name, key_range);
            removed += self
                .store
                .remove_range(&engine.catalog().name, &lower, &upper)
                .await?;
        }
        Ok(removed)
    }

    /// Apply one document write to the inverted index
    pub async fn handle_write(&self, event: &WriteEvent) -> TextSearchResult<()> {
        let store_name = event.store_name.as_str();
        match event.method {
            method if method.is_update() => {
                self.index_documents(store_name, &event.keys, &event.documents, true)
                    .await?;
            }
            method if method.is_insert() => {
                let added = self
                    .index_documents(store_name, &event.keys, &event.documents, false)
                    .await?;
                for engine in self.engines_for_store(store_name) {
                    engine.add_total_doc(added as i64);
                }
            }
            WriteMethod::RemoveId => {
                self.remove_documents(store_name, &event.keys).await?;
                let removed = event.keys.iter().flatten().count();
                for engine in self.engines_for_store(store_name) {
                    engine.add_total_doc(-(removed as i64));
                }
            }
            _ => {
                let range = match (&event.method, &event.key_range) {
                    (WriteMethod::Remove, Some((lower, upper))) => Some((lower, upper)),
                    _ => None,
                };
                let removed = self.remove_store(store_name, range).await?;
                debug!("{} on '{}' removed {} index records", event.method, store_name, removed);
                for engine in self.engines_for_store(store_name) {
                    engine.reset_total_doc();
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl WriteHook for TextIndexManager {
    async fn on_write(&self, event: &WriteEvent) -> TextSearchResult<()> {
        self.handle_write(event).await
    }
}
