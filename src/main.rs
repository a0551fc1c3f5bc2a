// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Trawler CLI: ingest text files or crawled web pages into an inverted
//! index and answer ranked queries.
//!
//! ```bash
//! # Index a directory, run exact queries, write everything
//! trawler --text ./corpus --query queries.txt --index --counts --results
//!
//! # Crawl ten pages with eight workers, prefix matching
//! trawler --html https://example.com --crawl 10 --threads 8 --query q.txt --results
//! ```
//!
//! The driver runs in one of two modes. Serial mode uses a plain
//! [`InvertedIndex`] on the main thread. Parallel mode (any run with
//! `--threads` or `--html`) shares a locked [`SharedIndex`] between a
//! worker pool that ingests documents and query tasks that read it.
//! Either way the phase order is: ingest, query, then the three JSON
//! outputs, and ingest failures degrade to skipped phases instead of
//! aborting the run.

use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use trawler::build;
use trawler::{InvertedIndex, ParallelQueryEngine, QueryEngine, SharedIndex, WebCrawler, WorkQueue};

mod cli;
use cli::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let started = Instant::now();
    let cli = Cli::parse();

    if cli.parallel() {
        run_parallel(&cli);
    } else {
        run_serial(&cli);
    }

    println!("Elapsed: {:.6} seconds", started.elapsed().as_secs_f64());
}

fn run_serial(cli: &Cli) {
    let mut index = InvertedIndex::new();

    if let Some(root) = &cli.text {
        if let Err(error) = build::build(root, &mut index) {
            warn!(root = %root.display(), %error, "text ingest failed; skipping phase");
        }
    }

    let mut engine = QueryEngine::new(&index, cli.partial);
    if let Some(path) = &cli.query {
        if let Err(error) = engine.process_file(path) {
            warn!(path = %path.display(), %error, "query file unreadable; skipping phase");
        }
    }

    if let Some(path) = &cli.results {
        write_output("results", path, |writer| engine.write_json(writer));
    }
    if let Some(path) = &cli.counts {
        write_output("counts", path, |writer| index.write_counts_json(writer));
    }
    if let Some(path) = &cli.index {
        write_output("index", path, |writer| index.write_index_json(writer));
    }
}

fn run_parallel(cli: &Cli) {
    let index = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(cli.thread_count()));

    if let Some(seed) = &cli.html {
        match WebCrawler::new(Arc::clone(&index), Arc::clone(&queue), cli.crawl) {
            Ok(crawler) => {
                if let Err(error) = crawler.crawl(seed) {
                    warn!(seed, %error, "invalid seed URL; skipping crawl");
                }
            }
            Err(error) => {
                warn!(%error, "could not build the HTTP client; skipping crawl");
            }
        }
    }

    if let Some(root) = &cli.text {
        if let Err(error) = build::build_parallel(root, &index, &queue) {
            warn!(root = %root.display(), %error, "text ingest failed; skipping phase");
        }
    }

    let engine = ParallelQueryEngine::new(Arc::clone(&index), Arc::clone(&queue), cli.partial);
    if let Some(path) = &cli.query {
        if let Err(error) = engine.process_file(path) {
            warn!(path = %path.display(), %error, "query file unreadable; skipping phase");
        }
    }

    if let Some(path) = &cli.results {
        write_output("results", path, |writer| engine.write_json(writer));
    }
    if let Some(path) = &cli.counts {
        write_output("counts", path, |writer| index.write_counts_json(writer));
    }
    if let Some(path) = &cli.index {
        write_output("index", path, |writer| index.write_index_json(writer));
    }

    queue.join();
}

/// Write one JSON output file. A failure here fails only this output, not
/// the run: the remaining outputs still get their chance.
fn write_output<F>(label: &str, path: &Path, emit: F)
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let written = File::create(path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        emit(&mut writer)?;
        writer.flush()
    });
    if let Err(error) = written {
        tracing::error!(output = label, path = %path.display(), %error, "failed to write output");
    }
}
