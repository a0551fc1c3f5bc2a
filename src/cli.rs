// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Command-line definitions for the trawler binary.
//!
//! Flag-driven rather than subcommand-driven: every phase of a run is
//! enabled by the presence of its flag, and an absent flag skips the phase.
//!
//! ```bash
//! # Index a directory and write the index JSON
//! trawler --text ./corpus --index out/index.json
//!
//! # Crawl five pages from a seed, answer queries with prefix matching
//! trawler --html https://example.com --crawl 5 --query queries.txt --partial --results
//! ```
//!
//! `--threads` and `--html` switch the run into parallel mode. Numeric
//! flags parse leniently: garbage or non-positive values fall back to their
//! defaults, because a bad configuration should skip or degrade a phase,
//! never kill the run.

use clap::Parser;
use std::convert::Infallible;
use std::path::PathBuf;

/// Worker count when `--threads` is absent or unusable.
pub const DEFAULT_THREADS: usize = 5;

/// Page budget when `--crawl` is absent or unusable.
pub const DEFAULT_CRAWL: usize = 1;

#[derive(Parser, Debug)]
#[command(
    name = "trawler",
    about = "Multithreaded inverted-index search engine over files and web pages",
    version
)]
pub struct Cli {
    /// Index a text file, or a directory of .txt/.text files
    #[arg(long, value_name = "PATH")]
    pub text: Option<PathBuf>,

    /// Crawl starting from this seed URL (implies parallel mode)
    #[arg(long, value_name = "URL")]
    pub html: Option<String>,

    /// Maximum pages to fetch for --html
    #[arg(long, value_name = "N", default_value = "1", value_parser = parse_crawl, allow_hyphen_values = true)]
    pub crawl: usize,

    /// Run queries from this file, one query per line
    #[arg(long, value_name = "PATH")]
    pub query: Option<PathBuf>,

    /// Match indexed words by prefix instead of exactly
    #[arg(long)]
    pub partial: bool,

    /// Worker pool size (implies parallel mode)
    #[arg(long, value_name = "N", value_parser = parse_threads, allow_hyphen_values = true)]
    pub threads: Option<usize>,

    /// Write the inverted index as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "index.json")]
    pub index: Option<PathBuf>,

    /// Write per-document word counts as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "counts.json")]
    pub counts: Option<PathBuf>,

    /// Write search results as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "results.json")]
    pub results: Option<PathBuf>,
}

impl Cli {
    /// Whether this run uses the worker pool and the locked index.
    pub fn parallel(&self) -> bool {
        self.threads.is_some() || self.html.is_some()
    }

    /// Effective worker count for parallel mode.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or(DEFAULT_THREADS)
    }
}

fn parse_threads(value: &str) -> Result<usize, Infallible> {
    Ok(value
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_THREADS))
}

fn parse_crawl(value: &str) -> Result<usize, Infallible> {
    Ok(value
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_CRAWL))
}
