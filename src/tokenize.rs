// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Text normalization and stemming.
//!
//! Documents and queries run through the same pipeline: NFD-decompose, drop
//! every codepoint that is not an ASCII letter or whitespace, lowercase,
//! split on whitespace runs, and Snowball-stem each piece. The pipeline is a
//! pure function of its input, so a document indexed twice or a query
//! re-parsed for lookup always produces the same tokens.

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// Strip a text blob down to lowercase ASCII letters and whitespace.
///
/// NFD decomposition runs first so accented letters contribute their base
/// letter ("café" → "cafe") instead of disappearing with the whole grapheme.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Stems of `text` in reading order.
///
/// Empty segments are never produced; the n-th element of the returned list
/// is the token at 1-based position n in the document.
pub fn stems(text: &str) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    normalize(text)
        .split_whitespace()
        .map(|word| stemmer.stem(word).into_owned())
        .filter(|stem| !stem.is_empty())
        .collect()
}

/// Sorted, deduplicated stems of a query line.
pub fn unique_stems(text: &str) -> BTreeSet<String> {
    stems(text).into_iter().collect()
}

/// Joins sorted stems into the canonical query key.
///
/// Two query lines with the same words in any order produce the same key,
/// which is what makes the query-results map deduplicate semantically
/// identical queries.
pub fn canonical_query(words: &BTreeSet<String>) -> String {
    words
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
