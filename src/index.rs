// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The inverted index and its ranking queries.
//!
//! # INVARIANTS (DO NOT VIOLATE)
//!
//! 1. **UNIQUE_POSITIONS**: a position appears at most once per
//!    `(word, location)` pair.
//! 2. **COUNT_IS_LENGTH**: `counts[location]` equals the number of
//!    `(word, position)` insertions that actually added a new position for
//!    that location, i.e. the token length of the document.
//! 3. **COUNTS_COVER_INDEX**: every location referenced from the index has
//!    an entry in `counts`; scores divide by it without checking.
//! 4. **ORDERED_VIEWS**: iteration is word-ascending, then
//!    location-ascending, then position-ascending, always.
//!
//! Invariant 4 and the partial-search seek both come from the ordered-map
//! representation; no separate sorting step exists anywhere.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::ops::Bound;

use crate::json;

/// One ranked hit: where a query matched, how often, and how relevant.
///
/// `score` is `count / counts[location]`, the fraction of the document the
/// matching tokens make up. It is in `(0, 1]` for any non-empty match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub location: String,
    pub count: usize,
    pub score: f64,
}

impl SearchResult {
    /// Ranking order: score descending, then count descending, then
    /// location ascending ignoring case.
    pub fn cmp_ranked(&self, other: &SearchResult) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| cmp_ignore_case(&self.location, &other.location))
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Anything the query engine can rank against: the plain index or its
/// lock-guarded wrapper.
pub trait Searchable {
    fn search(&self, words: &BTreeSet<String>, partial: bool) -> Vec<SearchResult>;
}

/// Maps each stemmed word to the locations it occurs in and the 1-based
/// positions within each location, plus a per-location token count used as
/// the relevance denominator.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    entries: BTreeMap<String, BTreeMap<String, BTreeSet<usize>>>,
    counts: BTreeMap<String, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex::default()
    }

    /// Insert one `(word, location, position)` triple.
    ///
    /// The location's count only moves when the position is new, which is
    /// what keeps invariant 2 intact across re-adds.
    pub fn add(&mut self, word: &str, location: &str, position: usize) {
        let positions = self
            .entries
            .entry(word.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default();
        if positions.insert(position) {
            *self.counts.entry(location.to_string()).or_insert(0) += 1;
        }
    }

    /// Insert `words` at consecutive positions starting from `start`.
    pub fn add_all(&mut self, words: &[String], location: &str, start: usize) {
        for (offset, word) in words.iter().enumerate() {
            self.add(word, location, start + offset);
        }
    }

    /// Fold another index into this one.
    ///
    /// Positions union per `(word, location)`; word counts take the larger
    /// value per location. For the disjoint per-document indexes the
    /// builders produce, the incoming count already equals the document's
    /// true length, so `max` is exact; for a re-indexed location it is a
    /// conservative upper bound.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (word, incoming) in other.entries {
            match self.entries.entry(word) {
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                std::collections::btree_map::Entry::Occupied(mut slot) => {
                    let current = slot.get_mut();
                    for (location, positions) in incoming {
                        current.entry(location).or_default().extend(positions);
                    }
                }
            }
        }
        for (location, count) in other.counts {
            let current = self.counts.entry(location).or_insert(0);
            if count > *current {
                *current = count;
            }
        }
    }

    /// Dispatch to [`exact_search`](Self::exact_search) or
    /// [`partial_search`](Self::partial_search).
    pub fn search(&self, words: &BTreeSet<String>, partial: bool) -> Vec<SearchResult> {
        if partial {
            self.partial_search(words)
        } else {
            self.exact_search(words)
        }
    }

    /// Union of the posting lists of every query word present as a key.
    pub fn exact_search(&self, words: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut matched: BTreeMap<&str, usize> = BTreeMap::new();
        for word in words {
            if let Some(postings) = self.entries.get(word) {
                fold_postings(&mut matched, postings);
            }
        }
        self.collect_results(matched)
    }

    /// Union of the posting lists of every index key that has a query word
    /// as a prefix.
    ///
    /// Seeks to the first key `>=` the query word and walks forward while
    /// the prefix holds, so cost per query word is logarithmic in the
    /// dictionary size plus the number of matching keys.
    pub fn partial_search(&self, words: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut matched: BTreeMap<&str, usize> = BTreeMap::new();
        for word in words {
            let from = (Bound::Included(word.as_str()), Bound::Unbounded);
            for (key, postings) in self.entries.range::<str, _>(from) {
                if !key.starts_with(word.as_str()) {
                    break;
                }
                fold_postings(&mut matched, postings);
            }
        }
        self.collect_results(matched)
    }

    fn collect_results(&self, matched: BTreeMap<&str, usize>) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = matched
            .into_iter()
            .map(|(location, count)| SearchResult {
                location: location.to_string(),
                count,
                // Invariant 3: every indexed location has a count, so a
                // missing entry here is a bug worth a loud panic.
                score: count as f64 / self.counts[location] as f64,
            })
            .collect();
        results.sort_by(SearchResult::cmp_ranked);
        results
    }

    // ------------------------------------------------------------------
    // Read views. All of them return owned data in the orders of
    // invariant 4, so the locked wrapper can expose the same signatures
    // without leaking guards.
    // ------------------------------------------------------------------

    /// All indexed words, ascending.
    pub fn words(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Locations a word occurs in, ascending; empty for unknown words.
    pub fn locations(&self, word: &str) -> Vec<String> {
        self.entries
            .get(word)
            .map(|postings| postings.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Positions of a word at a location, ascending; empty if absent.
    pub fn positions(&self, word: &str, location: &str) -> Vec<usize> {
        self.entries
            .get(word)
            .and_then(|postings| postings.get(location))
            .map(|positions| positions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The token count of a location; zero if the location is unknown.
    pub fn word_count(&self, location: &str) -> usize {
        self.counts.get(location).copied().unwrap_or(0)
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn has_location(&self, word: &str, location: &str) -> bool {
        self.entries
            .get(word)
            .is_some_and(|postings| postings.contains_key(location))
    }

    pub fn has_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.entries
            .get(word)
            .and_then(|postings| postings.get(location))
            .is_some_and(|positions| positions.contains(&position))
    }

    pub fn has_count(&self, location: &str) -> bool {
        self.counts.contains_key(location)
    }

    pub fn num_words(&self) -> usize {
        self.entries.len()
    }

    pub fn num_locations(&self, word: &str) -> usize {
        self.entries.get(word).map_or(0, BTreeMap::len)
    }

    pub fn num_positions(&self, word: &str, location: &str) -> usize {
        self.entries
            .get(word)
            .and_then(|postings| postings.get(location))
            .map_or(0, BTreeSet::len)
    }

    pub fn num_counts(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emit the index as pretty JSON in the documented nested format.
    pub fn write_index_json<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        json::write_index(&self.entries, writer)
    }

    /// Emit the word counts as a pretty JSON object.
    pub fn write_counts_json<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        json::write_counts(&self.counts, writer)
    }
}

fn fold_postings<'a>(
    matched: &mut BTreeMap<&'a str, usize>,
    postings: &'a BTreeMap<String, BTreeSet<usize>>,
) {
    for (location, positions) in postings {
        *matched.entry(location).or_insert(0) += positions.len();
    }
}

impl Searchable for InvertedIndex {
    fn search(&self, words: &BTreeSet<String>, partial: bool) -> Vec<SearchResult> {
        InvertedIndex::search(self, words, partial)
    }
}
