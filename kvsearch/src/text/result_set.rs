// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Multi-pass lookup protocol and result consolidation
//!
//! A [`ResultSet`] does not talk to storage. The caller pulls the lookups of
//! the current lap with [`ResultSet::next_lookup`], runs them against the
//! inverted-index store, and reports each token's records back with
//! [`ResultSet::add_result`]. Once every lookup of a lap is reported, the
//! returned [`NextAction`] tells the caller to run the next lap or to
//! [`ResultSet::collect`].
//!
//! Laps, in order:
//! 1. exact match on the case-folded value
//! 2. exact match on the normalized keyword (tokens without keyword skip it)
//! 3. prefix match on the case-folded value

use crate::catalog::Catalog;
use crate::storage::{IndexName, Key, KeyRange};
use crate::text::entry::{IndexRecord, RankEntry, RankEntryJson, ResultEntry};
use crate::text::errors::{TextSearchError, TextSearchResult};
use crate::text::key_codec::KeyCodec;
use crate::text::token::{QueryToken, Scored};
use crate::text::types::{QueryType, TfMode};
use std::sync::Arc;

/// One round of lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lap {
    Value,
    Keyword,
    Prefix,
}

impl Lap {
    pub const ALL: [Lap; 3] = [Lap::Value, Lap::Keyword, Lap::Prefix];

    fn lookup_for(&self, token: &QueryToken) -> Option<(IndexName, KeyRange)> {
        match self {
            Lap::Value => Some((IndexName::Value, KeyRange::Only(token.value().to_lowercase()))),
            Lap::Keyword => token
                .keyword()
                .map(|k| (IndexName::Keyword, KeyRange::Only(k.to_string()))),
            // negated terms only exclude exact matches
            Lap::Prefix if token.is_not() => None,
            Lap::Prefix => Some((IndexName::Value, KeyRange::Prefix(token.value().to_lowercase()))),
        }
    }
}

/// A range query the caller runs against the inverted-index store
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// Inverted-index store, named after the catalog
    pub store_name: String,
    pub index: IndexName,
    pub range: KeyRange,
    /// Index of the query token the results belong to
    pub token: usize,
}

/// What the caller does after reporting a lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Other lookups of this lap are still outstanding
    Wait,
    /// The lap is complete, run the next one
    Lookup,
    /// No further lookups needed
    Collect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Next lap to hand out
    Ready(usize),
    Awaiting { lap: usize, pending: usize },
    Done,
}

/// Accumulated matches of one search
pub struct ResultSet {
    catalog: Arc<Catalog>,
    tokens: Vec<Arc<QueryToken>>,
    limit: usize,
    threshold: f64,
    codec: Arc<dyn KeyCodec>,
    tf_mode: TfMode,
    state: State,
    results: Vec<ResultEntry>,
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("catalog", &self.catalog.name)
            .field("tokens", &self.tokens.len())
            .field("state", &self.state)
            .field("results", &self.results.len())
            .finish()
    }
}

impl ResultSet {
    pub fn new(
        catalog: Arc<Catalog>,
        tokens: Vec<QueryToken>,
        limit: usize,
        threshold: f64,
        codec: Arc<dyn KeyCodec>,
        tf_mode: TfMode,
    ) -> Self {
        Self {
            catalog,
            tokens: tokens.into_iter().map(Arc::new).collect(),
            limit,
            threshold,
            codec,
            tf_mode,
            state: State::Ready(0),
            results: Vec::new(),
        }
    }

    pub fn tokens(&self) -> &[Arc<QueryToken>] {
        &self.tokens
    }

    pub fn results(&self) -> &[ResultEntry] {
        &self.results
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Lap whose lookups are outstanding, if any
    pub fn current_lap(&self) -> Option<Lap> {
        match self.state {
            State::Awaiting { lap, .. } => Some(Lap::ALL[lap]),
            _ => None,
        }
    }

    /// Lookups of the next lap. Laps without any lookup are skipped; an empty
    /// list means the protocol finished.
    pub fn next_lookup(&mut self) -> TextSearchResult<Vec<Lookup>> {
        let mut lap = match self.state {
            State::Ready(lap) => lap,
            State::Awaiting { lap, pending } => {
                return Err(TextSearchError::LookupProtocol(format!(
                    "lap {} still has {} pending lookups",
                    lap, pending
                )))
            }
            State::Done => {
                return Err(TextSearchError::LookupProtocol(format!(
                    "all {} laps already ran",
                    Lap::ALL.len()
                )))
            }
        };

        while lap < Lap::ALL.len() {
            let lookups: Vec<Lookup> = self
                .tokens
                .iter()
                .enumerate()
                .filter_map(|(token, query)| {
                    Lap::ALL[lap].lookup_for(query).map(|(index, range)| Lookup {
                        store_name: self.catalog.name.clone(),
                        index,
                        range,
                        token,
                    })
                })
                .collect();
            if !lookups.is_empty() {
                self.state = State::Awaiting {
                    lap,
                    pending: lookups.len(),
                };
                return Ok(lookups);
            }
            lap += 1;
        }

        self.state = State::Done;
        Ok(Vec::new())
    }

    /// Like [`ResultSet::next_lookup`], handing each lookup to a visitor
    pub fn next_lookup_with<F>(&mut self, mut visit: F) -> TextSearchResult<usize>
    where
        F: FnMut(&Lookup, &QueryToken),
    {
        let lookups = self.next_lookup()?;
        for lookup in &lookups {
            visit(lookup, &self.tokens[lookup.token]);
        }
        Ok(lookups.len())
    }

    /// Report the records found by one lookup of the current lap
    pub fn add_result(&mut self, token: usize, records: Vec<IndexRecord>) -> TextSearchResult<NextAction> {
        let (lap, pending) = match self.state {
            State::Awaiting { lap, pending } => (lap, pending),
            _ => {
                return Err(TextSearchError::LookupProtocol(
                    "result reported while no lookup is outstanding".to_string(),
                ))
            }
        };
        let query = self.tokens.get(token).cloned().ok_or_else(|| {
            TextSearchError::LookupProtocol(format!("unknown query token {}", token))
        })?;

        for record in &records {
            if let Some(entry) =
                ResultEntry::from_record(query.clone(), record, self.codec.as_ref(), self.tf_mode)?
            {
                self.results.push(entry);
            }
        }

        if pending > 1 {
            self.state = State::Awaiting {
                lap,
                pending: pending - 1,
            };
            return Ok(NextAction::Wait);
        }

        if lap + 1 >= Lap::ALL.len() || self.has_enough() {
            self.state = State::Done;
            Ok(NextAction::Collect)
        } else {
            self.state = State::Ready(lap + 1);
            Ok(NextAction::Lookup)
        }
    }

    /// At least `limit` documents already reach the threshold
    fn has_enough(&self) -> bool {
        self.rank()
            .iter()
            .filter(|r| r.score() >= self.threshold)
            .count()
            >= self.limit
    }

    /// Consolidate matches into one entry per document, best first.
    ///
    /// Negated terms contribute no score; documents they match are dropped.
    pub fn rank(&self) -> Vec<RankEntry<'_>> {
        let mut ranked: Vec<RankEntry<'_>> = Vec::new();
        let mut excluded: Vec<(&str, &Key)> = Vec::new();

        for result in &self.results {
            if result.query_type() == QueryType::Not {
                let doc = (result.store_name(), result.primary_key());
                if !excluded.contains(&doc) {
                    excluded.push(doc);
                }
                continue;
            }

            let entry = match ranked.iter().position(|r| r.is_same_document(result)) {
                Some(idx) => {
                    // score changes on merge, so take it out and re-insert
                    let mut existing = ranked.remove(idx);
                    existing.merge(result);
                    existing
                }
                None => RankEntry::new(&self.catalog, result),
            };
            let score = entry.score();
            let at = ranked.partition_point(|r| r.score() >= score);
            ranked.insert(at, entry);
        }

        ranked.retain(|r| {
            !excluded
                .iter()
                .any(|(store, key)| r.store_name() == *store && r.primary_key() == *key)
        });
        ranked
    }

    /// Ranked results in output form
    pub fn collect(&self) -> Vec<RankEntryJson> {
        self.rank().iter().map(|r| r.to_json()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Source;
    use crate::text::analyzer::QueryEngine;
    use crate::text::key_codec::CompositeKeyCodec;
    use crate::text::types::SearchConfig;
    use serde_json::json;

    fn engine() -> QueryEngine {
        let catalog = Catalog::new(
            "test",
            "en",
            vec![
                Source::new("article", "title", 1.0),
                Source::new("article", "body", 0.5),
            ],
        );
        QueryEngine::new(Arc::new(catalog), SearchConfig::default()).unwrap()
    }

    fn records(engine: &QueryEngine, pk: &str, doc: serde_json::Value) -> Vec<IndexRecord> {
        engine
            .analyze("article", &Key::from(pk), &doc)
            .iter()
            .map(|e| e.to_record(&CompositeKeyCodec))
            .collect()
    }

    /// Answer a lookup by scanning the records, like a store would
    fn answer(lookup: &Lookup, all: &[IndexRecord]) -> Vec<IndexRecord> {
        all.iter()
            .filter(|r| lookup.index.term(r).is_some_and(|t| lookup.range.contains(t)))
            .cloned()
            .collect()
    }

    fn run(engine: &QueryEngine, query: &str, all: &[IndexRecord]) -> Vec<RankEntryJson> {
        let mut rs = engine
            .query(query, None, None, Arc::new(CompositeKeyCodec))
            .unwrap();
        loop {
            let lookups = rs.next_lookup().unwrap();
            if lookups.is_empty() {
                break;
            }
            let mut action = NextAction::Wait;
            for lookup in &lookups {
                action = rs.add_result(lookup.token, answer(lookup, all)).unwrap();
            }
            if action == NextAction::Collect {
                break;
            }
            assert_eq!(action, NextAction::Lookup);
        }
        rs.collect()
    }

    #[test]
    fn test_lap_sequence() {
        let engine = engine();
        let mut rs = engine
            .query("tiger lion", None, None, Arc::new(CompositeKeyCodec))
            .unwrap();

        let lap0 = rs.next_lookup().unwrap();
        assert_eq!(lap0.len(), 2);
        assert_eq!(lap0[0].store_name, "test");
        assert_eq!(lap0[0].index, IndexName::Value);
        assert_eq!(lap0[0].range, KeyRange::Only("tiger".to_string()));
        assert_eq!(rs.current_lap(), Some(Lap::Value));

        // a lap cannot start before the previous one finished
        assert!(matches!(rs.next_lookup(), Err(TextSearchError::LookupProtocol(_))));

        assert_eq!(rs.add_result(0, vec![]).unwrap(), NextAction::Wait);
        assert_eq!(rs.add_result(1, vec![]).unwrap(), NextAction::Lookup);

        let lap1 = rs.next_lookup().unwrap();
        assert!(lap1.iter().all(|l| l.index == IndexName::Keyword));
        for l in &lap1 {
            rs.add_result(l.token, vec![]).unwrap();
        }

        let lap2 = rs.next_lookup().unwrap();
        assert_eq!(lap2[1].range, KeyRange::Prefix("lion".to_string()));
        assert_eq!(rs.add_result(0, vec![]).unwrap(), NextAction::Wait);
        assert_eq!(rs.add_result(1, vec![]).unwrap(), NextAction::Collect);
        assert!(rs.is_done());

        // exhausted
        assert!(matches!(rs.next_lookup(), Err(TextSearchError::LookupProtocol(_))));
        assert!(matches!(rs.add_result(0, vec![]), Err(TextSearchError::LookupProtocol(_))));
    }

    #[test]
    fn test_keyword_lap_skipped_without_keywords() {
        let engine = engine();
        // "the" is a stop word, so it has no keyword
        let mut rs = engine
            .query("the", None, None, Arc::new(CompositeKeyCodec))
            .unwrap();
        let lap0 = rs.next_lookup().unwrap();
        assert_eq!(rs.add_result(lap0[0].token, vec![]).unwrap(), NextAction::Lookup);
        let next = rs.next_lookup().unwrap();
        assert_eq!(next[0].range, KeyRange::Prefix("the".to_string()));
        assert_eq!(rs.current_lap(), Some(Lap::Prefix));
    }

    #[test]
    fn test_visitor_form() {
        let engine = engine();
        let mut rs = engine
            .query("tiger", None, None, Arc::new(CompositeKeyCodec))
            .unwrap();
        let mut seen = Vec::new();
        let n = rs
            .next_lookup_with(|lookup, token| seen.push((lookup.index, token.value().to_string())))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(seen, vec![(IndexName::Value, "tiger".to_string())]);
    }

    #[test]
    fn test_not_excludes_document() {
        let engine = engine();
        let all = records(&engine, "Tiger", json!({"title": "tiger", "body": "tiger in forest"}));
        assert_eq!(run(&engine, "tiger", &all).len(), 1);
        assert!(run(&engine, "tiger -forest", &all).is_empty());
    }

    #[test]
    fn test_not_ignores_longer_words() {
        let engine = engine();
        let all = records(&engine, "a", json!({"title": "tiger category"}));
        let results = run(&engine, "tiger -cat", &all);
        assert_eq!(results.len(), 1);

        let mut rs = engine
            .query("-cat", None, None, Arc::new(CompositeKeyCodec))
            .unwrap();
        let lookups = rs.next_lookup().unwrap();
        assert_eq!(lookups[0].range, KeyRange::Only("cat".to_string()));
        for lookup in &lookups {
            rs.add_result(lookup.token, vec![]).unwrap();
        }
        let rest = rs.next_lookup().unwrap();
        assert!(rest.iter().all(|l| !matches!(l.range, KeyRange::Prefix(_))));
    }

    #[test]
    fn test_prefix_and_exact() {
        let engine = engine();
        let all = records(&engine, "a", json!({"title": "tiger"}));
        assert_eq!(run(&engine, "tig*", &all).len(), 1);

        let all = records(&engine, "b", json!({"title": "tigers"}));
        assert!(run(&engine, "\"tiger\"", &all).is_empty());
        assert_eq!(run(&engine, "\"tigers\"", &all).len(), 1);
    }

    #[test]
    fn test_ranking_order() {
        let engine = engine();
        let mut all = records(&engine, "in-body", json!({"body": "tiger"}));
        all.extend(records(&engine, "in-title", json!({"title": "tiger"})));

        let results = run(&engine, "tiger", &all);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].primary_key, Key::from("in-title"));
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_merge_counts_field_value_once() {
        let engine = engine();
        let all = records(&engine, "a", json!({"title": "tiger"}));

        let single = run(&engine, "tiger", &all);
        let double = run(&engine, "tiger tiger", &all);
        assert_eq!(double.len(), 1);
        assert_eq!(double[0].tokens.len(), 1);
        assert_eq!(single[0].tokens.len(), 1);
    }

    #[test]
    fn test_early_collect_when_enough_results() {
        let engine = engine();
        let all = records(&engine, "a", json!({"title": "tiger"}));
        let mut rs = engine
            .query("tiger", Some(1), Some(0.0), Arc::new(CompositeKeyCodec))
            .unwrap();
        let lap0 = rs.next_lookup().unwrap();
        let action = rs.add_result(lap0[0].token, answer(&lap0[0], &all)).unwrap();
        assert_eq!(action, NextAction::Collect);
        assert_eq!(rs.collect().len(), 1);
    }
}
