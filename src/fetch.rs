// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! HTML fetching with explicit redirect handling.
//!
//! The client is built with redirects disabled so that the crawler's own
//! policy is the only one in play: follow up to [`MAX_REDIRECTS`] `3xx`
//! hops with a `Location` header, and accept a body only for a final `200`
//! whose content type starts with `text/html`. Anything else, including
//! transport errors, is "no page"; the crawler treats it as an empty page
//! with no links.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

/// Redirect hops to follow before giving up on a URI.
pub const MAX_REDIRECTS: usize = 3;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the blocking client the crawler uses for every request.
pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .redirect(Policy::none())
        .timeout(FETCH_TIMEOUT)
        .build()
}

/// Fetch `uri`, following up to `redirects` redirect hops.
///
/// Returns the body only for a `200` response that declares an HTML content
/// type; every failure mode is logged and collapses to `None`.
pub fn fetch_html(client: &Client, uri: &Url, redirects: usize) -> Option<String> {
    let mut uri = uri.clone();
    let mut remaining = redirects;

    loop {
        let response = match client.get(uri.clone()).send() {
            Ok(response) => response,
            Err(error) => {
                warn!(%uri, %error, "fetch failed");
                return None;
            }
        };

        let status = response.status();
        if status.is_redirection() {
            let target = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())?;
            if remaining == 0 {
                debug!(%uri, "redirect limit reached");
                return None;
            }
            uri = match uri.join(target) {
                Ok(next) => next,
                Err(error) => {
                    warn!(%uri, target, %error, "unparsable redirect target");
                    return None;
                }
            };
            remaining -= 1;
            continue;
        }

        if status == StatusCode::OK && is_html(&response) {
            return match response.text() {
                Ok(body) => Some(body),
                Err(error) => {
                    warn!(%uri, %error, "failed to read response body");
                    None
                }
            };
        }

        debug!(%uri, %status, "not an indexable page");
        return None;
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false)
}
