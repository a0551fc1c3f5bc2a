// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The lock-guarded index shared between builders, crawler, and queries.
//!
//! [`SharedIndex`] composes an [`InvertedIndex`] with a [`MultiReaderLock`]
//! rather than subclassing anything: every public method acquires the lock
//! once and delegates to the plain index's non-locking implementation, so
//! there is no reentrant acquisition anywhere. Mutators take the write
//! side, everything else the read side.
//!
//! Builders are expected to call [`merge`](SharedIndex::merge) with a
//! per-document private index instead of calling [`add`](SharedIndex::add)
//! per token; that turns `O(tokens)` write acquisitions per document into
//! one.

use std::collections::BTreeSet;
use std::io;

use crate::index::{InvertedIndex, SearchResult, Searchable};
use crate::rwlock::MultiReaderLock;

#[derive(Default)]
pub struct SharedIndex {
    inner: MultiReaderLock<InvertedIndex>,
}

impl SharedIndex {
    pub fn new() -> Self {
        SharedIndex {
            inner: MultiReaderLock::new(InvertedIndex::new()),
        }
    }

    /// Recover the plain index, e.g. after all builders have joined.
    pub fn into_inner(self) -> InvertedIndex {
        self.inner.into_inner()
    }

    pub fn add(&self, word: &str, location: &str, position: usize) {
        self.inner.write().add(word, location, position);
    }

    /// Add a whole document's stems under a single write acquisition.
    pub fn add_all(&self, words: &[String], location: &str, start: usize) {
        self.inner.write().add_all(words, location, start);
    }

    /// Fold a private per-document index into the shared one.
    pub fn merge(&self, other: InvertedIndex) {
        self.inner.write().merge(other);
    }

    pub fn search(&self, words: &BTreeSet<String>, partial: bool) -> Vec<SearchResult> {
        self.inner.read().search(words, partial)
    }

    pub fn exact_search(&self, words: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().exact_search(words)
    }

    pub fn partial_search(&self, words: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().partial_search(words)
    }

    pub fn words(&self) -> Vec<String> {
        self.inner.read().words()
    }

    pub fn locations(&self, word: &str) -> Vec<String> {
        self.inner.read().locations(word)
    }

    pub fn positions(&self, word: &str, location: &str) -> Vec<usize> {
        self.inner.read().positions(word, location)
    }

    pub fn word_count(&self, location: &str) -> usize {
        self.inner.read().word_count(location)
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.inner.read().has_word(word)
    }

    pub fn has_location(&self, word: &str, location: &str) -> bool {
        self.inner.read().has_location(word, location)
    }

    pub fn has_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.inner.read().has_position(word, location, position)
    }

    pub fn has_count(&self, location: &str) -> bool {
        self.inner.read().has_count(location)
    }

    pub fn num_words(&self) -> usize {
        self.inner.read().num_words()
    }

    pub fn num_locations(&self, word: &str) -> usize {
        self.inner.read().num_locations(word)
    }

    pub fn num_positions(&self, word: &str, location: &str) -> usize {
        self.inner.read().num_positions(word, location)
    }

    pub fn num_counts(&self) -> usize {
        self.inner.read().num_counts()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Emit the index JSON under the read lock, so a concurrent merge can
    /// never interleave with the snapshot being written.
    pub fn write_index_json<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        self.inner.read().write_index_json(writer)
    }

    pub fn write_counts_json<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        self.inner.read().write_counts_json(writer)
    }
}

impl Searchable for SharedIndex {
    fn search(&self, words: &BTreeSet<String>, partial: bool) -> Vec<SearchResult> {
        SharedIndex::search(self, words, partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_merges_commute() {
        let shared = Arc::new(SharedIndex::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let mut private = InvertedIndex::new();
                    let location = format!("doc-{i}.txt");
                    private.add("alpha", &location, 1);
                    private.add("beta", &location, 2);
                    shared.merge(private);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.num_words(), 2);
        assert_eq!(shared.num_locations("alpha"), 8);
        assert_eq!(shared.num_counts(), 8);
        for i in 0..8 {
            assert_eq!(shared.word_count(&format!("doc-{i}.txt")), 2);
        }
    }

    #[test]
    fn readers_run_against_concurrent_writers() {
        let shared = Arc::new(SharedIndex::new());

        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..100 {
                    let mut private = InvertedIndex::new();
                    private.add("word", &format!("doc-{i}"), 1);
                    shared.merge(private);
                }
            })
        };
        let reader = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..100 {
                    // Counts map and posting lists must agree at every
                    // observation point.
                    let locations = shared.locations("word");
                    for location in locations {
                        assert!(shared.word_count(&location) > 0);
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(shared.num_locations("word"), 100);
    }

    #[test]
    fn into_inner_hands_back_the_plain_index() {
        let shared = SharedIndex::new();
        shared.add("word", "doc", 1);
        let plain = shared.into_inner();
        assert!(plain.has_word("word"));
    }
}
