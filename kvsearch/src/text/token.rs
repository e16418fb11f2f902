// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Token model shared by indexing and querying

use crate::text::types::QueryType;
use serde::{Deserialize, Serialize};

/// Fields common to every token kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCore {
    /// Surface form as it appears in the text
    pub value: String,
    /// Normalized form, `None` when normalization rejected the word
    pub keyword: Option<String>,
    /// Cached score, `None` until computed
    #[serde(skip)]
    pub score: Option<f64>,
}

impl TokenCore {
    pub fn new(value: impl Into<String>, keyword: Option<String>) -> Self {
        Self {
            value: value.into(),
            keyword,
            score: None,
        }
    }
}

/// Anything that carries a relevance score
pub trait Scored {
    fn score(&self) -> f64;
}

/// One classified term of a search query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryToken {
    pub core: TokenCore,
    pub query_type: QueryType,
    /// Byte offset of the term in the query string
    pub position: usize,
    /// `1 / (index + 2)` where index is the term's rank in the query
    pub position_weight: f64,
    /// Scales all term scores of a query so they sum to 1
    pub averaging_factor: f64,
}

impl QueryToken {
    pub fn new(
        value: impl Into<String>,
        keyword: Option<String>,
        query_type: QueryType,
        position: usize,
        index: usize,
    ) -> Self {
        Self {
            core: TokenCore::new(value, keyword),
            query_type,
            position,
            position_weight: 1.0 / (index as f64 + 2.0),
            averaging_factor: 1.0,
        }
    }

    pub fn value(&self) -> &str {
        &self.core.value
    }

    pub fn keyword(&self) -> Option<&str> {
        self.core.keyword.as_deref()
    }

    pub fn is_not(&self) -> bool {
        self.query_type == QueryType::Not
    }

    /// Set the averaging factor and refresh the cached score
    pub fn set_averaging_factor(&mut self, factor: f64) {
        self.averaging_factor = factor;
        self.core.score = Some(self.compute_score());
    }

    fn compute_score(&self) -> f64 {
        self.position_weight * self.query_type.weight() * self.averaging_factor
    }
}

impl Scored for QueryToken {
    fn score(&self) -> f64 {
        self.core.score.unwrap_or_else(|| self.compute_score())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_weight() {
        let first = QueryToken::new("tiger", None, QueryType::None, 0, 0);
        let second = QueryToken::new("forest", None, QueryType::None, 6, 1);
        assert_eq!(first.position_weight, 0.5);
        assert!((second.position_weight - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_uses_type_weight() {
        let token = QueryToken::new("tiger", None, QueryType::None, 0, 0);
        assert!((token.score() - 0.4).abs() < 1e-12);

        let negated = QueryToken::new("tiger", None, QueryType::Not, 0, 0);
        assert_eq!(negated.score(), 0.0);
    }

    #[test]
    fn test_averaging_factor_updates_cached_score() {
        let mut token = QueryToken::new("tiger", None, QueryType::Exact, 0, 0);
        assert!(token.core.score.is_none());
        token.set_averaging_factor(2.0);
        assert_eq!(token.core.score, Some(1.0));
        assert_eq!(token.score(), 1.0);
    }
}
