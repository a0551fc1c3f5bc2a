// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Pretty JSON emission in the engine's documented output formats.
//!
//! These writers produce exact bytes, not approximate JSON: two-space
//! indentation per level, one element per line, scores with exactly eight
//! fractional digits. Diff-based consumers depend on the byte layout, so
//! formatting happens here rather than in a serializer that owns number
//! formatting.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::index::SearchResult;

fn indent<W: Write>(writer: &mut W, levels: usize) -> io::Result<()> {
    for _ in 0..levels {
        writer.write_all(b"  ")?;
    }
    Ok(())
}

/// Escape a string for embedding in a JSON literal.
///
/// Locations are file paths and URIs and queries are stemmed words, so this
/// almost always returns the input unchanged; quotes, backslashes, and
/// control characters are handled for the rare path that contains them.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                escaped.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Write `{ "<location>": <count>, ... }`, locations ascending.
pub(crate) fn write_counts<W: Write>(
    counts: &BTreeMap<String, usize>,
    writer: &mut W,
) -> io::Result<()> {
    writer.write_all(b"{\n")?;
    let mut first = true;
    for (location, count) in counts {
        if !first {
            writer.write_all(b",\n")?;
        }
        first = false;
        indent(writer, 1)?;
        write!(writer, "\"{}\": {}", escape(location), count)?;
    }
    if !first {
        writer.write_all(b"\n")?;
    }
    writer.write_all(b"}")
}

fn write_positions<W: Write>(
    positions: &BTreeSet<usize>,
    writer: &mut W,
    level: usize,
) -> io::Result<()> {
    writer.write_all(b"[\n")?;
    let mut first = true;
    for position in positions {
        if !first {
            writer.write_all(b",\n")?;
        }
        first = false;
        indent(writer, level + 1)?;
        write!(writer, "{position}")?;
    }
    writer.write_all(b"\n")?;
    indent(writer, level)?;
    writer.write_all(b"]")
}

/// Write the nested index object: words to locations to position arrays,
/// every layer in ascending order.
pub(crate) fn write_index<W: Write>(
    entries: &BTreeMap<String, BTreeMap<String, BTreeSet<usize>>>,
    writer: &mut W,
) -> io::Result<()> {
    if entries.is_empty() {
        return writer.write_all(b"{\n}");
    }

    writer.write_all(b"{\n")?;
    let mut first_word = true;
    for (word, postings) in entries {
        if !first_word {
            writer.write_all(b",\n")?;
        }
        first_word = false;
        indent(writer, 1)?;
        write!(writer, "\"{}\": ", escape(word))?;

        writer.write_all(b"{\n")?;
        let mut first_location = true;
        for (location, positions) in postings {
            if !first_location {
                writer.write_all(b",\n")?;
            }
            first_location = false;
            indent(writer, 2)?;
            write!(writer, "\"{}\": ", escape(location))?;
            write_positions(positions, writer, 2)?;
        }
        writer.write_all(b"\n")?;
        indent(writer, 1)?;
        writer.write_all(b"}")?;
    }
    writer.write_all(b"\n}")
}

fn write_result<W: Write>(result: &SearchResult, writer: &mut W, level: usize) -> io::Result<()> {
    writer.write_all(b"\n")?;
    indent(writer, level)?;
    writer.write_all(b"{\n")?;
    indent(writer, level + 1)?;
    write!(writer, "\"count\": {},\n", result.count)?;
    indent(writer, level + 1)?;
    write!(writer, "\"score\": {:.8},\n", result.score)?;
    indent(writer, level + 1)?;
    write!(writer, "\"where\": \"{}\"\n", escape(&result.location))?;
    indent(writer, level)?;
    writer.write_all(b"}")
}

fn write_result_list<W: Write>(
    results: &[SearchResult],
    writer: &mut W,
    level: usize,
) -> io::Result<()> {
    writer.write_all(b"[")?;
    let mut first = true;
    for result in results {
        if !first {
            writer.write_all(b",")?;
        }
        first = false;
        write_result(result, writer, level + 1)?;
    }
    writer.write_all(b"\n")?;
    indent(writer, level)?;
    writer.write_all(b"]")
}

/// Write the results map: canonical queries ascending, each with its ranked
/// result list.
pub(crate) fn write_results<W: Write>(
    results: &BTreeMap<String, Vec<SearchResult>>,
    writer: &mut W,
) -> io::Result<()> {
    writer.write_all(b"{\n")?;
    let mut remaining = results.len();
    for (query, list) in results {
        indent(writer, 1)?;
        write!(writer, "\"{}\": ", escape(query))?;
        write_result_list(list, writer, 1)?;
        remaining -= 1;
        if remaining > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(b"\n")?;
    }
    writer.write_all(b"}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(emit: F) -> String {
        let mut buffer = Vec::new();
        emit(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn empty_index_renders_as_bare_braces() {
        let entries = BTreeMap::new();
        assert_eq!(render(|w| write_index(&entries, w)), "{\n}");
    }

    #[test]
    fn empty_counts_render_as_open_close() {
        let counts = BTreeMap::new();
        assert_eq!(render(|w| write_counts(&counts, w)), "{\n}");
    }

    #[test]
    fn counts_one_entry_per_line() {
        let mut counts = BTreeMap::new();
        counts.insert("a.txt".to_string(), 3usize);
        counts.insert("b.txt".to_string(), 1usize);
        assert_eq!(
            render(|w| write_counts(&counts, w)),
            "{\n  \"a.txt\": 3,\n  \"b.txt\": 1\n}"
        );
    }

    #[test]
    fn index_nesting_and_indentation() {
        let mut entries: BTreeMap<String, BTreeMap<String, BTreeSet<usize>>> = BTreeMap::new();
        entries
            .entry("hello".to_string())
            .or_default()
            .entry("a.txt".to_string())
            .or_default()
            .extend([1, 2]);
        entries
            .entry("world".to_string())
            .or_default()
            .entry("a.txt".to_string())
            .or_default()
            .insert(3);

        let expected = concat!(
            "{\n",
            "  \"hello\": {\n",
            "    \"a.txt\": [\n",
            "      1,\n",
            "      2\n",
            "    ]\n",
            "  },\n",
            "  \"world\": {\n",
            "    \"a.txt\": [\n",
            "      3\n",
            "    ]\n",
            "  }\n",
            "}"
        );
        assert_eq!(render(|w| write_index(&entries, w)), expected);
    }

    #[test]
    fn results_format_scores_with_eight_digits() {
        let mut results = BTreeMap::new();
        results.insert(
            "run".to_string(),
            vec![SearchResult {
                location: "a.txt".to_string(),
                count: 2,
                score: 2.0 / 3.0,
            }],
        );

        let expected = concat!(
            "{\n",
            "  \"run\": [\n",
            "    {\n",
            "      \"count\": 2,\n",
            "      \"score\": 0.66666667,\n",
            "      \"where\": \"a.txt\"\n",
            "    }\n",
            "  ]\n",
            "}\n"
        );
        assert_eq!(render(|w| write_results(&results, w)), expected);
    }

    #[test]
    fn query_with_no_results_renders_empty_array() {
        let mut results = BTreeMap::new();
        results.insert("missing".to_string(), Vec::new());
        assert_eq!(
            render(|w| write_results(&results, w)),
            "{\n  \"missing\": [\n  ]\n}\n"
        );
    }

    #[test]
    fn outputs_parse_as_json() {
        let mut results = BTreeMap::new();
        results.insert(
            "foo".to_string(),
            vec![
                SearchResult {
                    location: "x.txt".to_string(),
                    count: 1,
                    score: 1.0,
                },
                SearchResult {
                    location: "y.txt".to_string(),
                    count: 1,
                    score: 0.5,
                },
            ],
        );
        let rendered = render(|w| write_results(&results, w));
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["foo"][0]["where"], "x.txt");
        assert_eq!(parsed["foo"][1]["score"], 0.5);
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        let mut counts = BTreeMap::new();
        counts.insert("dir\\file \"q\".txt".to_string(), 1usize);
        let rendered = render(|w| write_counts(&counts, w));
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["dir\\file \"q\".txt"], 1);
    }
}
