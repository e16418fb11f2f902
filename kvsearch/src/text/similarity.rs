// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// String similarity used to weigh approximate matches

/// Dice coefficient over character bigrams, case-insensitive, in `[0, 1]`.
///
/// Equal strings score 1. Strings too short to have a bigram score 0 unless equal.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }

    let a_bigrams = bigrams(&a);
    let mut b_bigrams = bigrams(&b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return 0.0;
    }
    let total = a_bigrams.len() + b_bigrams.len();

    let mut shared = 0;
    for bigram in &a_bigrams {
        if let Some(idx) = b_bigrams.iter().position(|other| other == bigram) {
            b_bigrams.swap_remove(idx);
            shared += 1;
        }
    }

    (2 * shared) as f64 / total as f64
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}
