// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Unicode word segmentation

use unicode_segmentation::UnicodeSegmentation;

/// One word cut out of a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// The word as it appears in the text
    pub word: &'a str,
    /// Byte offset of the word start
    pub offset: usize,
    /// Character offset of the word start
    pub position: usize,
}

impl<'a> Segment<'a> {
    /// Byte offset just past the word
    pub fn end(&self) -> usize {
        self.offset + self.word.len()
    }
}

/// Split text on UAX #29 word boundaries, dropping punctuation and whitespace.
///
/// Pure and synchronous; calling it twice on the same text gives the same segments.
pub fn tokenize(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut chars_seen = 0;
    let mut bytes_seen = 0;

    for (offset, word) in text.unicode_word_indices() {
        chars_seen += text[bytes_seen..offset].chars().count();
        bytes_seen = offset;
        segments.push(Segment {
            word,
            offset,
            position: chars_seen,
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        let segments = tokenize("Tiger live in forest.");
        let words: Vec<&str> = segments.iter().map(|s| s.word).collect();
        assert_eq!(words, vec!["Tiger", "live", "in", "forest"]);
        assert_eq!(segments[1].offset, 6);
        assert_eq!(segments[3].position, 14);
    }

    #[test]
    fn test_query_syntax_is_not_part_of_words() {
        let segments = tokenize("\"tiger\" -forest tig*");
        let words: Vec<&str> = segments.iter().map(|s| s.word).collect();
        assert_eq!(words, vec!["tiger", "forest", "tig"]);
        assert_eq!(segments[0].offset, 1);
        assert_eq!(segments[1].offset, 9);
        assert_eq!(segments[2].end(), 19);
    }

    #[test]
    fn test_character_positions_with_multibyte_text() {
        let segments = tokenize("café au lait");
        assert_eq!(segments[1].word, "au");
        assert_eq!(segments[1].offset, 6);
        assert_eq!(segments[1].position, 5);
    }

    #[test]
    fn test_non_latin_script() {
        let segments = tokenize("привет мир");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].word, "мир");
        assert_eq!(segments[1].position, 7);
    }

    #[test]
    fn test_empty_and_noise() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ,.;!  ").is_empty());
    }
}
