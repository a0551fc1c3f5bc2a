// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! HTML scrubbing and link extraction.
//!
//! Two independent, pure operations on raw HTML text:
//!
//! - [`sanitize`] turns a page into plain text suitable for indexing:
//!   comments and non-content block elements go first, then remaining tags,
//!   then entities are decoded, then whitespace runs collapse to single
//!   spaces.
//! - [`extract_links`] finds every `href` attribute, resolves it against the
//!   page URI, drops fragments, and keeps only absolute http/https results,
//!   in source order.
//!
//! The crawler composes them in a specific order: block elements are
//! stripped before link extraction so that script-generated URLs never
//! enter the frontier, and tag/entity stripping happens after, on the same
//! intermediate string.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use url::Url;

/// Elements whose entire content is dropped before indexing.
const BLOCK_ELEMENTS: [&str; 6] = ["head", "style", "script", "noscript", "svg", "textarea"];

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));

static BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    // The regex crate has no backreferences, so the element list is expanded
    // into one alternation of open..close pairs.
    let alternation = BLOCK_ELEMENTS
        .iter()
        .map(|name| format!(r"<{name}\b.*?</{name}\s*>"))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("block element pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);").expect("entity pattern")
});

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r#"href\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .case_insensitive(true)
        .build()
        .expect("href pattern")
});

/// Remove comments and whole non-content block elements.
pub fn strip_block_elements(html: &str) -> String {
    let without_comments = COMMENT.replace_all(html, " ");
    BLOCKS.replace_all(&without_comments, " ").into_owned()
}

/// Remove every remaining tag, leaving only text content.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ").into_owned()
}

/// Decode named and numeric character references to their text equivalents.
///
/// Unknown names and out-of-range numeric references are dropped rather than
/// left as literal `&...;` noise in the indexed text.
pub fn decode_entities(html: &str) -> String {
    ENTITY
        .replace_all(html, |caps: &regex::Captures<'_>| {
            decode_entity(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        let code = u32::from_str_radix(hex, 16).ok()?;
        return char::from_u32(code).map(String::from);
    }
    if let Some(dec) = body.strip_prefix('#') {
        let code = dec.parse::<u32>().ok()?;
        return char::from_u32(code).map(String::from);
    }
    let text = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" | "ensp" | "emsp" | "thinsp" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "hellip" => "\u{2026}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "trade" => "\u{2122}",
        "deg" => "\u{00B0}",
        "plusmn" => "\u{00B1}",
        "frac12" => "\u{00BD}",
        "times" => "\u{00D7}",
        "divide" => "\u{00F7}",
        _ => return None,
    };
    Some(text.to_string())
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a full HTML page to indexable plain text.
pub fn sanitize(html: &str) -> String {
    let stripped = strip_tags(&strip_block_elements(html));
    collapse_whitespace(&decode_entities(&stripped))
}

/// A URI with its fragment removed; the canonical location name of a page.
///
/// Scheme and host are already lowercased by `Url` parsing, so fragment
/// removal is the only remaining normalization step.
pub fn clean_uri(uri: &Url) -> Url {
    let mut cleaned = uri.clone();
    cleaned.set_fragment(None);
    cleaned
}

/// Every `href` target in `html`, resolved against `base`, in source order.
///
/// Fragments are dropped and only absolute http/https results survive;
/// unparsable or non-web targets (`mailto:`, `javascript:`) are skipped.
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    HREF.captures_iter(html)
        .filter_map(|caps| {
            let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let mut link = base.join(raw).ok()?;
            link.set_fragment(None);
            matches!(link.scheme(), "http" | "https").then_some(link)
        })
        .collect()
}
