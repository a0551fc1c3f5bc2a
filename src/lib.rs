// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Multithreaded inverted-index search engine.
//!
//! The crate ingests local text files and crawled web pages into one shared
//! inverted index (a map from stemmed word to location to 1-based token
//! positions) and ranks documents against multi-word queries by term
//! frequency over document length.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐   ┌──────────┐        ┌───────────────┐
//!  │ tokenize │   │   html   │        │     fetch     │
//!  │ (stems)  │   │ (scrub,  │        │ (HTTP, ≤3     │
//!  │          │   │  links)  │        │  redirects)   │
//!  └────┬─────┘   └────┬─────┘        └───────┬───────┘
//!       │              │                      │
//!  ┌────▼──────────────▼───┐          ┌───────▼───────┐
//!  │  build (file walker)  │          │ crawl (bounded│
//!  │  serial ∥ pooled      │          │  BFS frontier)│
//!  └────┬──────────────────┘          └───────┬───────┘
//!       │    private per-document indexes     │
//!       └───────────────┬─────────────────────┘
//!                 merge │ (one write acquisition each)
//!                ┌──────▼───────┐
//!                │ SharedIndex  │  = InvertedIndex + MultiReaderLock
//!                └──────┬───────┘
//!                 read  │
//!                ┌──────▼───────┐   ┌──────────────┐
//!                │ query engine │──▶│ json writers │
//!                └──────────────┘   └──────────────┘
//! ```
//!
//! The worker pool ([`pool::WorkQueue`]) carries both builders and the
//! crawler; its counter-based barrier is what lets crawl tasks enqueue
//! more crawl tasks and still terminate deterministically.
//!
//! # Usage
//!
//! ```no_run
//! use trawler::{InvertedIndex, build};
//! use std::path::Path;
//!
//! let mut index = InvertedIndex::new();
//! build::build(Path::new("corpus"), &mut index).unwrap();
//!
//! let words = trawler::tokenize::unique_stems("search words");
//! let hits = index.exact_search(&words);
//! ```

pub mod build;
pub mod crawl;
pub mod fetch;
pub mod html;
pub mod index;
mod json;
pub mod pool;
pub mod query;
pub mod rwlock;
pub mod shared;
pub mod tokenize;

// Re-exports for the common path: build or crawl into an index, query it.
pub use crawl::WebCrawler;
pub use index::{InvertedIndex, SearchResult, Searchable};
pub use pool::WorkQueue;
pub use query::{ParallelQueryEngine, QueryEngine};
pub use rwlock::{MultiReaderLock, ReadGuard, WriteGuard};
pub use shared::SharedIndex;
pub use tokenize::{canonical_query, normalize, stems, unique_stems};
