// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios: build a corpus on disk, index it, query it, and
//! check the emitted JSON byte for byte.

use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use trawler::{
    build, InvertedIndex, ParallelQueryEngine, QueryEngine, SharedIndex, WorkQueue,
};

fn write_doc(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

fn index_json(index: &InvertedIndex) -> String {
    let mut buffer = Vec::new();
    index.write_index_json(&mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

fn counts_json(index: &InvertedIndex) -> String {
    let mut buffer = Vec::new();
    index.write_counts_json(&mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[test]
fn empty_corpus_emits_bare_object() {
    let index = InvertedIndex::new();
    assert_eq!(index_json(&index), "{\n}");
}

#[test]
fn minimal_document_index_and_counts() {
    let dir = TempDir::new().unwrap();
    let location = write_doc(dir.path(), "a.txt", "Hello HELLO world.");

    let mut index = InvertedIndex::new();
    build::build(dir.path(), &mut index).unwrap();

    assert_eq!(index.words(), vec!["hello", "world"]);
    assert_eq!(index.positions("hello", &location), vec![1, 2]);
    assert_eq!(index.positions("world", &location), vec![3]);
    assert_eq!(index.word_count(&location), 3);

    let expected_counts = format!("{{\n  \"{location}\": 3\n}}");
    assert_eq!(counts_json(&index), expected_counts);

    let expected_index = format!(
        concat!(
            "{{\n",
            "  \"hello\": {{\n",
            "    \"{loc}\": [\n",
            "      1,\n",
            "      2\n",
            "    ]\n",
            "  }},\n",
            "  \"world\": {{\n",
            "    \"{loc}\": [\n",
            "      3\n",
            "    ]\n",
            "  }}\n",
            "}}"
        ),
        loc = location
    );
    assert_eq!(index_json(&index), expected_index);
}

#[test]
fn exact_versus_partial_scores() {
    let dir = TempDir::new().unwrap();
    let location = write_doc(dir.path(), "a.txt", "run running runner");

    let mut index = InvertedIndex::new();
    build::build(dir.path(), &mut index).unwrap();

    let mut exact = QueryEngine::new(&index, false);
    exact.process_line("run");
    let mut buffer = Vec::new();
    exact.write_json(&mut buffer).unwrap();
    let expected_exact = format!(
        concat!(
            "{{\n",
            "  \"run\": [\n",
            "    {{\n",
            "      \"count\": 2,\n",
            "      \"score\": 0.66666667,\n",
            "      \"where\": \"{loc}\"\n",
            "    }}\n",
            "  ]\n",
            "}}\n"
        ),
        loc = location
    );
    assert_eq!(String::from_utf8(buffer).unwrap(), expected_exact);

    let mut partial = QueryEngine::new(&index, true);
    partial.process_line("run");
    let mut buffer = Vec::new();
    partial.write_json(&mut buffer).unwrap();
    let expected_partial = format!(
        concat!(
            "{{\n",
            "  \"run\": [\n",
            "    {{\n",
            "      \"count\": 3,\n",
            "      \"score\": 1.00000000,\n",
            "      \"where\": \"{loc}\"\n",
            "    }}\n",
            "  ]\n",
            "}}\n"
        ),
        loc = location
    );
    assert_eq!(String::from_utf8(buffer).unwrap(), expected_partial);
}

#[test]
fn short_documents_outrank_long_ones() {
    let dir = TempDir::new().unwrap();
    let short = write_doc(dir.path(), "short.txt", "cat");
    let long = write_doc(
        dir.path(),
        "long.txt",
        "cat one two three four five six seven eight nine",
    );

    let mut index = InvertedIndex::new();
    build::build(dir.path(), &mut index).unwrap();

    let mut engine = QueryEngine::new(&index, false);
    engine.process_line("cat");
    let results = engine.view("cat");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].location, short);
    assert!((results[0].score - 1.0).abs() < 1e-12);
    assert_eq!(results[1].location, long);
    assert!((results[1].score - 0.1).abs() < 1e-12);
}

#[test]
fn reordered_query_lines_collapse_to_one_key() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "doc.txt", "foo bar baz");
    let queries = dir.path().join("queries.txt");
    fs::write(&queries, "foo bar\nbar foo\n").unwrap();

    let mut index = InvertedIndex::new();
    build::build(dir.path(), &mut index).unwrap();

    // The query file itself is a .txt in the corpus directory, which is
    // fine: it only adds its own words to the index.
    let mut engine = QueryEngine::new(&index, false);
    engine.process_file(&queries).unwrap();

    assert_eq!(engine.queries(), vec!["bar foo"]);
    assert!(!engine.view("foo bar").is_empty());
}

#[test]
fn parallel_and_serial_builds_emit_identical_json() {
    let dir = TempDir::new().unwrap();
    for i in 0..20 {
        write_doc(
            dir.path(),
            &format!("doc{i:02}.txt"),
            &format!("alpha beta gamma{i} running delta alpha word{i}"),
        );
    }

    let mut serial = InvertedIndex::new();
    build::build(dir.path(), &mut serial).unwrap();

    let shared = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(6));
    build::build_parallel(dir.path(), &shared, &queue).unwrap();
    queue.join();
    let parallel = Arc::try_unwrap(shared)
        .ok()
        .expect("pool still holds the index")
        .into_inner();

    assert_eq!(index_json(&serial), index_json(&parallel));
    assert_eq!(counts_json(&serial), counts_json(&parallel));
}

#[test]
fn parallel_query_engine_writes_same_results_as_serial() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "a.txt", "apple banana cherry apple");
    write_doc(dir.path(), "b.txt", "banana date");
    let queries = dir.path().join("q.list");
    fs::write(&queries, "apple\nbanana\nAPPLE\n\ncherry date\n").unwrap();

    let mut serial_index = InvertedIndex::new();
    build::build(dir.path(), &mut serial_index).unwrap();
    let mut serial = QueryEngine::new(&serial_index, false);
    serial.process_file(&queries).unwrap();
    let mut expected = Vec::new();
    serial.write_json(&mut expected).unwrap();

    let shared = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(4));
    build::build_parallel(dir.path(), &shared, &queue).unwrap();
    let engine = ParallelQueryEngine::new(Arc::clone(&shared), Arc::clone(&queue), false);
    engine.process_file(&queries).unwrap();
    let mut actual = Vec::new();
    engine.write_json(&mut actual).unwrap();
    queue.join();

    assert_eq!(
        String::from_utf8(expected).unwrap(),
        String::from_utf8(actual).unwrap()
    );
}

#[test]
fn empty_results_map_emits_open_close_pair() {
    let index = InvertedIndex::new();
    let engine = QueryEngine::new(&index, false);
    let mut buffer = Vec::new();
    engine.write_json(&mut buffer).unwrap();
    assert_eq!(String::from_utf8(buffer).unwrap(), "{\n}\n");
}

#[test]
fn unreadable_document_skips_but_build_continues() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.txt"), [0xc3, 0x28]).unwrap();
    let good = write_doc(dir.path(), "good.txt", "intact words");

    let mut index = InvertedIndex::new();
    build::build(dir.path(), &mut index).unwrap();

    assert!(index.has_count(&good));
    assert_eq!(index.num_counts(), 1);
}
