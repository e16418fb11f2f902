// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Type definitions for text search components

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How raw occurrence counts turn into a term frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TfMode {
    /// `ln(frequency + 1)`
    #[default]
    Log,
    /// Raw occurrence count
    Frequency,
    /// 1 when the token occurs at all
    Boolean,
}

impl TfMode {
    pub fn term_frequency(&self, frequency: usize) -> f64 {
        match self {
            TfMode::Log => ((frequency + 1) as f64).ln(),
            TfMode::Frequency => frequency as f64,
            TfMode::Boolean => {
                if frequency > 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Classification of one query term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    /// Quoted term, raw value must match exactly
    Exact,
    /// Plain term
    None,
    /// Term whose normalized keyword differs from its surface form
    Phonetic,
    /// Term followed by `*`
    Prefix,
    /// Term preceded by `-`, excludes matching documents
    Not,
}

impl QueryType {
    /// Relative importance of the term type
    pub fn weight(&self) -> f64 {
        match self {
            QueryType::Exact => 1.0,
            QueryType::None => 0.8,
            QueryType::Phonetic => 0.6,
            QueryType::Prefix => 0.4,
            QueryType::Not => 0.0,
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueryType::Exact => "EXACT",
            QueryType::None => "NONE",
            QueryType::Phonetic => "PHONETIC",
            QueryType::Prefix => "PREFIX",
            QueryType::Not => "NOT",
        };
        write!(f, "{}", name)
    }
}

/// Search tuning shared by every catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Term frequency mode used when scoring matches
    pub tf_mode: TfMode,
    /// Maximum records returned by a single range lookup
    pub lookup_limit: usize,
    /// Result limit when the caller does not give one
    pub default_limit: usize,
    /// Score a document needs to count towards stopping the lookup laps early
    pub default_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tf_mode: TfMode::Log,
            lookup_limit: 100,
            default_limit: 10,
            default_threshold: 1.0,
        }
    }
}

/// Set of common English stop words
pub static ENGLISH_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
        "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "can't", "cannot", "could", "couldn't", "did",
        "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "few",
        "for", "from", "further", "had", "hadn't", "has", "hasn't", "have", "haven't", "having",
        "he", "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him",
        "himself", "his", "how", "how's", "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into",
        "is", "isn't", "it", "it's", "its", "itself", "just", "k", "let's", "m", "me", "more",
        "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only",
        "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
        "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such",
        "t", "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then",
        "there", "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this",
        "those", "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we",
        "we'd", "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's",
        "where", "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with",
        "won't", "would", "wouldn't", "y", "you", "you'd", "you'll", "you're", "you've", "your",
        "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_weights() {
        assert_eq!(QueryType::Exact.weight(), 1.0);
        assert_eq!(QueryType::None.weight(), 0.8);
        assert_eq!(QueryType::Phonetic.weight(), 0.6);
        assert_eq!(QueryType::Prefix.weight(), 0.4);
        assert_eq!(QueryType::Not.weight(), 0.0);
    }

    #[test]
    fn test_term_frequency_modes() {
        assert!((TfMode::Log.term_frequency(1) - 2f64.ln()).abs() < 1e-12);
        assert_eq!(TfMode::Frequency.term_frequency(3), 3.0);
        assert_eq!(TfMode::Boolean.term_frequency(3), 1.0);
        assert_eq!(TfMode::Boolean.term_frequency(0), 0.0);
    }

    #[test]
    fn test_search_config_partial_json() {
        let config: SearchConfig = serde_json::from_str(r#"{"tfMode":"boolean"}"#).unwrap();
        assert_eq!(config.tf_mode, TfMode::Boolean);
        assert_eq!(config.lookup_limit, 100);
        assert_eq!(config.default_limit, 10);
    }

    #[test]
    fn test_stopwords() {
        assert!(ENGLISH_STOPWORDS.contains("the"));
        assert!(!ENGLISH_STOPWORDS.contains("tiger"));
    }
}
