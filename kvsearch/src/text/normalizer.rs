// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Word normalizers and per-language normalizer chains

use crate::text::errors::TextSearchError;
use crate::text::types::ENGLISH_STOPWORDS;
use rust_stemmers::{Algorithm, Stemmer};

/// Maps a word to its normalized form, or `None` to reject it.
pub trait Normalizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn normalize(&self, word: &str) -> Option<String>;
}

/// Lowercases the word
#[derive(Debug, Default)]
pub struct LowercaseNormalizer;

impl Normalizer for LowercaseNormalizer {
    fn name(&self) -> &'static str {
        "lowercase"
    }

    fn normalize(&self, word: &str) -> Option<String> {
        Some(word.to_lowercase())
    }
}

/// Rejects English stop words
#[derive(Debug, Default)]
pub struct StopWordFilter;

impl Normalizer for StopWordFilter {
    fn name(&self) -> &'static str {
        "stopword"
    }

    fn normalize(&self, word: &str) -> Option<String> {
        if ENGLISH_STOPWORDS.contains(word.to_lowercase().as_str()) {
            None
        } else {
            Some(word.to_string())
        }
    }
}

/// Snowball stemmer
pub struct StemNormalizer {
    stemmer: Stemmer,
}

impl StemNormalizer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            stemmer: Stemmer::create(algorithm),
        }
    }
}

impl std::fmt::Debug for StemNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemNormalizer").finish()
    }
}

impl Normalizer for StemNormalizer {
    fn name(&self) -> &'static str {
        "stemmer"
    }

    fn normalize(&self, word: &str) -> Option<String> {
        let stem = self.stemmer.stem(word);
        if stem.is_empty() {
            None
        } else {
            Some(stem.into_owned())
        }
    }
}

/// Normalizers applied in sequence
#[derive(Default)]
pub struct NormalizerChain {
    normalizers: Vec<Box<dyn Normalizer>>,
}

impl std::fmt::Debug for NormalizerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.normalizers.iter().map(|n| n.name()).collect();
        f.debug_struct("NormalizerChain")
            .field("normalizers", &names)
            .finish()
    }
}

impl NormalizerChain {
    pub fn new(normalizers: Vec<Box<dyn Normalizer>>) -> Self {
        Self { normalizers }
    }

    /// Build the chain for a catalog language.
    ///
    /// `selected` restricts the chain to the named normalizers, keeping the
    /// language's order. Languages without normalizers get an empty chain.
    pub fn for_language(
        lang: &str,
        selected: Option<&[String]>,
    ) -> Result<Self, TextSearchError> {
        let lang = lang.to_lowercase();
        let mut normalizers: Vec<Box<dyn Normalizer>> = Vec::new();

        match lang.as_str() {
            "en" | "english" => {
                normalizers.push(Box::new(LowercaseNormalizer));
                normalizers.push(Box::new(StopWordFilter));
                normalizers.push(Box::new(StemNormalizer::new(Algorithm::English)));
            }
            other => {
                if let Some(algorithm) = stemmer_algorithm(other) {
                    normalizers.push(Box::new(LowercaseNormalizer));
                    normalizers.push(Box::new(StemNormalizer::new(algorithm)));
                }
            }
        }

        if let Some(names) = selected {
            for name in names {
                if !matches!(name.as_str(), "lowercase" | "stopword" | "stemmer") {
                    return Err(TextSearchError::InvalidConfig(format!(
                        "unknown normalizer '{}'",
                        name
                    )));
                }
            }
            if let Some(missing) = names
                .iter()
                .find(|name| !normalizers.iter().any(|n| n.name() == name.as_str()))
            {
                return Err(TextSearchError::UnsupportedLanguage(format!(
                    "'{}' has no {} normalizer",
                    lang, missing
                )));
            }
            normalizers.retain(|n| names.iter().any(|name| name == n.name()));
        }

        Ok(Self { normalizers })
    }

    pub fn is_empty(&self) -> bool {
        self.normalizers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.normalizers.len()
    }

    /// Apply every normalizer in order. An empty chain never yields a keyword.
    pub fn normalize(&self, word: &str) -> Option<String> {
        if self.normalizers.is_empty() {
            return None;
        }
        let mut current = word.to_string();
        for normalizer in &self.normalizers {
            current = normalizer.normalize(&current)?;
        }
        Some(current)
    }
}

fn stemmer_algorithm(lang: &str) -> Option<Algorithm> {
    let algorithm = match lang {
        "fr" | "french" => Algorithm::French,
        "es" | "spanish" => Algorithm::Spanish,
        "de" | "german" => Algorithm::German,
        "it" | "italian" => Algorithm::Italian,
        "pt" | "portuguese" => Algorithm::Portuguese,
        "ru" | "russian" => Algorithm::Russian,
        "sv" | "swedish" => Algorithm::Swedish,
        "no" | "norwegian" => Algorithm::Norwegian,
        _ => return None,
    };
    Some(algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_chain() {
        let chain = NormalizerChain::for_language("en", None).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.normalize("Tiger"), Some("tiger".to_string()));
        assert_eq!(chain.normalize("running"), Some("run".to_string()));
        assert_eq!(chain.normalize("Tigers"), Some("tiger".to_string()));
    }

    #[test]
    fn test_stopword_rejected() {
        let chain = NormalizerChain::for_language("english", None).unwrap();
        assert_eq!(chain.normalize("The"), None);
        assert_eq!(chain.normalize("in"), None);
    }

    #[test]
    fn test_unsupported_language_is_empty() {
        let chain = NormalizerChain::for_language("my", None).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.normalize("tiger"), None);
    }

    #[test]
    fn test_other_stemmer_languages() {
        let chain = NormalizerChain::for_language("fr", None).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.normalize("Chanter").is_some());
    }

    #[test]
    fn test_selected_normalizers() {
        let names = vec!["lowercase".to_string()];
        let chain = NormalizerChain::for_language("en", Some(&names)).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.normalize("The"), Some("the".to_string()));

        let bad = vec!["soundex".to_string()];
        assert!(matches!(
            NormalizerChain::for_language("en", Some(&bad)),
            Err(TextSearchError::InvalidConfig(_))
        ));

        // French has no stop-word list
        let stopword = vec!["stopword".to_string()];
        assert!(matches!(
            NormalizerChain::for_language("fr", Some(&stopword)),
            Err(TextSearchError::UnsupportedLanguage(_))
        ));
    }
}
