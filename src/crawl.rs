// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bounded breadth-first web crawling into the shared index.
//!
//! A crawl starts from one seed and fetches at most `cap` pages. The
//! frontier, the set of URIs already scheduled plus the remaining page
//! budget, lives behind a single mutex, and the budget is charged when a
//! link is *admitted*, not when its page finishes, so the crawl size is
//! decided deterministically no matter how workers interleave.
//!
//! Each admitted URI becomes one pool task: fetch, sanitize, index into a
//! private per-page index, merge, then admit outgoing links. Tasks enqueue
//! tasks, which is exactly why termination is the pool's counter-based
//! barrier rather than any queue-emptiness check.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use url::Url;

use crate::fetch::{self, MAX_REDIRECTS};
use crate::html;
use crate::index::InvertedIndex;
use crate::pool::WorkQueue;
use crate::shared::SharedIndex;
use crate::tokenize::stems;

/// Scheduled-URI set and page budget, guarded together.
struct Frontier {
    visited: HashSet<Url>,
    remaining: usize,
}

impl Frontier {
    /// Admit `link` if budget remains and it has not been scheduled.
    ///
    /// The check is `remaining > 1`, not `> 0`: the page currently being
    /// scraped owns one unit of the budget, so enqueueing stops one short
    /// of exhaustion.
    fn admit(&mut self, link: &Url) -> bool {
        if self.remaining <= 1 || self.visited.contains(link) {
            return false;
        }
        self.visited.insert(link.clone());
        self.remaining -= 1;
        true
    }
}

struct CrawlContext {
    index: Arc<SharedIndex>,
    queue: Arc<WorkQueue>,
    frontier: Mutex<Frontier>,
    client: reqwest::blocking::Client,
}

pub struct WebCrawler {
    context: Arc<CrawlContext>,
}

impl WebCrawler {
    /// A crawler feeding `index` through `queue`, fetching at most `cap`
    /// pages (clamped to at least one).
    pub fn new(
        index: Arc<SharedIndex>,
        queue: Arc<WorkQueue>,
        cap: usize,
    ) -> reqwest::Result<Self> {
        Ok(WebCrawler {
            context: Arc::new(CrawlContext {
                index,
                queue,
                frontier: Mutex::new(Frontier {
                    visited: HashSet::new(),
                    remaining: cap.max(1),
                }),
                client: fetch::client()?,
            }),
        })
    }

    /// Crawl from `seed` until the page budget is spent and every scheduled
    /// page has been processed.
    pub fn crawl(&self, seed: &str) -> Result<(), url::ParseError> {
        let seed = html::clean_uri(&Url::parse(seed)?);
        {
            let mut frontier = self
                .context
                .frontier
                .lock()
                .expect("crawl frontier poisoned");
            frontier.visited.insert(seed.clone());
        }

        let context = Arc::clone(&self.context);
        self.context
            .queue
            .submit(move || crawl_page(&context, seed));
        self.context.queue.barrier();
        Ok(())
    }

    /// The URIs scheduled so far; for inspection and tests.
    pub fn visited(&self) -> HashSet<Url> {
        self.context
            .frontier
            .lock()
            .expect("crawl frontier poisoned")
            .visited
            .clone()
    }
}

/// One page's lifecycle: fetch, index, then fan out to admitted links.
fn crawl_page(context: &Arc<CrawlContext>, uri: Url) {
    let Some(raw) = fetch::fetch_html(&context.client, &uri, MAX_REDIRECTS) else {
        warn!(%uri, "page yielded no indexable HTML");
        return;
    };

    // Block stripping happens once, before link extraction, so both the
    // frontier and the indexed text see the same content-bearing HTML.
    let content = html::strip_block_elements(&raw);

    let text = html::collapse_whitespace(&html::decode_entities(&html::strip_tags(&content)));
    let location = html::clean_uri(&uri);
    let mut private = InvertedIndex::new();
    private.add_all(&stems(&text), location.as_str(), 1);
    context.index.merge(private);
    debug!(%location, "indexed page");

    for link in html::extract_links(&uri, &content) {
        let admitted = {
            let mut frontier = context.frontier.lock().expect("crawl frontier poisoned");
            frontier.admit(&link)
        };
        if admitted {
            debug!(%link, "scheduling crawl");
            let next_context = Arc::clone(context);
            context
                .queue
                .submit(move || crawl_page(&next_context, link));
        }
    }
}
