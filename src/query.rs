// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query processing: canonical keys, deduplication, ranked results.
//!
//! A query line becomes a sorted set of distinct stems, and the set joined
//! with spaces is the *canonical key* under which its results are stored.
//! Reorderings and duplicate words collapse to one key, and a key already
//! present is never searched again. Empty lines are no-ops.
//!
//! Two flavors share the semantics: [`QueryEngine`] runs on the calling
//! thread against anything [`Searchable`]; [`ParallelQueryEngine`] submits
//! one task per line and keeps its results map behind a mutex. The index
//! search itself always runs outside that mutex, holding only the index's
//! read lock.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::index::{SearchResult, Searchable};
use crate::json;
use crate::pool::WorkQueue;
use crate::shared::SharedIndex;
use crate::tokenize::{canonical_query, unique_stems};

/// Single-threaded query processor over any searchable index.
pub struct QueryEngine<'a, I: Searchable> {
    index: &'a I,
    partial: bool,
    results: BTreeMap<String, Vec<SearchResult>>,
}

impl<'a, I: Searchable> QueryEngine<'a, I> {
    pub fn new(index: &'a I, partial: bool) -> Self {
        QueryEngine {
            index,
            partial,
            results: BTreeMap::new(),
        }
    }

    /// Process a query file line by line.
    pub fn process_file(&mut self, path: &Path) -> io::Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            self.process_line(&line?);
        }
        Ok(())
    }

    /// Normalize one line and search it unless its canonical form has been
    /// seen before.
    pub fn process_line(&mut self, line: &str) {
        let words = unique_stems(line);
        let query = canonical_query(&words);
        if query.is_empty() || self.results.contains_key(&query) {
            return;
        }
        let results = self.index.search(&words, self.partial);
        self.results.insert(query, results);
    }

    /// Ranked results for a raw query, re-normalized before lookup.
    pub fn view(&self, query: &str) -> Vec<SearchResult> {
        let key = canonical_query(&unique_stems(query));
        self.results.get(&key).cloned().unwrap_or_default()
    }

    /// All canonical queries processed so far, ascending.
    pub fn queries(&self) -> Vec<String> {
        self.results.keys().cloned().collect()
    }

    /// Emit the results map as pretty JSON.
    pub fn write_json<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        json::write_results(&self.results, writer)
    }
}

/// Pool-backed query processor over the shared index.
pub struct ParallelQueryEngine {
    index: Arc<SharedIndex>,
    queue: Arc<WorkQueue>,
    partial: bool,
    results: Arc<Mutex<BTreeMap<String, Vec<SearchResult>>>>,
}

impl ParallelQueryEngine {
    pub fn new(index: Arc<SharedIndex>, queue: Arc<WorkQueue>, partial: bool) -> Self {
        ParallelQueryEngine {
            index,
            queue,
            partial,
            results: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Submit one task per line, then wait for all of them.
    pub fn process_file(&self, path: &Path) -> io::Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            let index = Arc::clone(&self.index);
            let results = Arc::clone(&self.results);
            let partial = self.partial;
            self.queue.submit(move || {
                process_line_shared(&index, &results, partial, &line);
            });
        }
        self.queue.barrier();
        Ok(())
    }

    /// Same per-line semantics as the serial engine, usable directly.
    pub fn process_line(&self, line: &str) {
        process_line_shared(&self.index, &self.results, self.partial, line);
    }

    pub fn view(&self, query: &str) -> Vec<SearchResult> {
        let key = canonical_query(&unique_stems(query));
        self.results
            .lock()
            .expect("results map poisoned")
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn queries(&self) -> Vec<String> {
        self.results
            .lock()
            .expect("results map poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn write_json<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let results = self.results.lock().expect("results map poisoned");
        json::write_results(&results, writer)
    }
}

fn process_line_shared(
    index: &SharedIndex,
    results: &Mutex<BTreeMap<String, Vec<SearchResult>>>,
    partial: bool,
    line: &str,
) {
    let words = unique_stems(line);
    let query = canonical_query(&words);
    if query.is_empty() {
        return;
    }
    {
        let results = results.lock().expect("results map poisoned");
        if results.contains_key(&query) {
            return;
        }
    }

    // The search runs with no results-map lock held; only the index's read
    // lock is taken. Two tasks racing on the same canonical key compute the
    // same list, so last-insert-wins is harmless.
    let ranked = index.search(&words, partial);
    results
        .lock()
        .expect("results map poisoned")
        .insert(query, ranked);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InvertedIndex;

    fn sample_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        let words: Vec<String> = ["run", "run", "runner", "world"]
            .iter()
            .map(|w| w.to_string())
            .collect();
        index.add_all(&words, "a.txt", 1);
        index
    }

    #[test]
    fn reordered_queries_share_one_key() {
        let index = sample_index();
        let mut engine = QueryEngine::new(&index, false);
        engine.process_line("world run");
        engine.process_line("run world");
        assert_eq!(engine.queries(), vec!["run world"]);
    }

    #[test]
    fn empty_and_symbol_only_lines_are_noops() {
        let index = sample_index();
        let mut engine = QueryEngine::new(&index, false);
        engine.process_line("");
        engine.process_line("   ");
        engine.process_line("123 !!!");
        assert!(engine.queries().is_empty());
    }

    #[test]
    fn view_renormalizes_its_argument() {
        let index = sample_index();
        let mut engine = QueryEngine::new(&index, false);
        engine.process_line("running");
        let results = engine.view("RUNNING");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location, "a.txt");
    }

    #[test]
    fn view_of_unknown_query_is_empty() {
        let index = sample_index();
        let engine = QueryEngine::new(&index, false);
        assert!(engine.view("absent").is_empty());
    }

    #[test]
    fn partial_flag_switches_search_mode() {
        let index = sample_index();

        let mut exact = QueryEngine::new(&index, false);
        exact.process_line("run");
        assert_eq!(exact.view("run")[0].count, 2);

        let mut partial = QueryEngine::new(&index, true);
        partial.process_line("run");
        assert_eq!(partial.view("run")[0].count, 3);
    }

    #[test]
    fn parallel_engine_matches_serial_results() {
        let serial_index = sample_index();
        let mut serial = QueryEngine::new(&serial_index, true);
        serial.process_line("run");
        serial.process_line("world");

        let shared = Arc::new(SharedIndex::new());
        shared.merge(sample_index());
        let queue = Arc::new(WorkQueue::new(3));
        let parallel = ParallelQueryEngine::new(shared, Arc::clone(&queue), true);
        for _ in 0..4 {
            // Duplicate submissions collapse onto the same canonical keys.
            parallel.process_line("run");
            parallel.process_line("world");
        }
        queue.barrier();

        assert_eq!(serial.queries(), parallel.queries());
        assert_eq!(serial.view("run"), parallel.view("run"));
        assert_eq!(serial.view("world"), parallel.view("world"));
        queue.join();
    }
}
