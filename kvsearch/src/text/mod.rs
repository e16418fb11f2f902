// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Full-text analysis, scoring and lookup protocol

pub mod analyzer;
pub mod entry;
pub mod errors;
pub mod key_codec;
pub mod normalizer;
pub mod result_set;
pub mod similarity;
pub mod token;
pub mod tokenizer;
pub mod types;

pub use analyzer::QueryEngine;
pub use entry::{IndexEntry, IndexRecord, RankEntry, RankEntryJson, ResultEntry, ResultEntryJson};
pub use errors::{TextSearchError, TextSearchResult};
pub use key_codec::{codec_for, CompositeKeyCodec, EncodedKeyCodec, EntryId, KeyCodec};
pub use normalizer::{Normalizer, NormalizerChain};
pub use result_set::{Lap, Lookup, NextAction, ResultSet};
pub use token::{QueryToken, Scored, TokenCore};
pub use types::{QueryType, SearchConfig, TfMode};
