// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Index construction from local text files.
//!
//! Both flavors walk the same tree: directories recurse depth-first in
//! filesystem order (directory symlinks are followed), and regular files
//! whose lowercased name ends in `.txt` or `.text` are indexed. A root that
//! is itself a file is indexed unconditionally, extension or not.
//!
//! The serial flavor streams each file's stems straight into the target
//! index. The parallel flavor turns every file into one pool task that
//! parses into a *private* index and folds it into the shared one with a
//! single merge, which is one write-lock acquisition per document instead
//! of one per token.
//!
//! Per-file problems (unreadable, not UTF-8) are logged and skipped; a bad
//! document never fails the build.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::index::InvertedIndex;
use crate::pool::WorkQueue;
use crate::shared::SharedIndex;
use crate::tokenize::stems;

/// Whether a path names an indexable text file.
pub fn is_text_file(path: &Path) -> bool {
    let name = path.to_string_lossy().to_lowercase();
    name.ends_with(".txt") || name.ends_with(".text")
}

/// Build into a plain index on the calling thread.
pub fn build(root: &Path, index: &mut InvertedIndex) -> io::Result<()> {
    if root.is_dir() {
        traverse(root, &mut |path| {
            if let Err(error) = index_into(path, index) {
                warn!(path = %path.display(), %error, "skipping unreadable file");
            }
        })
    } else {
        index_into(root, index)
    }
}

/// Build into the shared index, one pool task per file.
///
/// Traversal happens on the calling thread; the function returns only after
/// the pool's barrier has seen every file task finish.
pub fn build_parallel(
    root: &Path,
    index: &Arc<SharedIndex>,
    queue: &Arc<WorkQueue>,
) -> io::Result<()> {
    let submit = &mut |path: &Path| {
        let path = path.to_path_buf();
        let index = Arc::clone(index);
        queue.submit(move || match index_file(&path) {
            Ok(private) => index.merge(private),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable file");
            }
        });
    };

    if root.is_dir() {
        traverse(root, submit)?;
    } else {
        submit(root);
    }
    queue.barrier();
    Ok(())
}

/// Parse one file into a fresh private index.
///
/// This is the map side of the fan-out: the returned index is owned by one
/// worker until it is merged, so it needs no locking at all.
pub fn index_file(path: &Path) -> io::Result<InvertedIndex> {
    let mut private = InvertedIndex::new();
    index_into(path, &mut private)?;
    Ok(private)
}

fn index_into(path: &Path, index: &mut InvertedIndex) -> io::Result<()> {
    let text = fs::read_to_string(path)?;
    let location = path.to_string_lossy().into_owned();
    index.add_all(&stems(&text), &location, 1);
    debug!(path = %path.display(), "indexed file");
    Ok(())
}

/// Depth-first walk calling `visit` on every indexable file.
fn traverse(dir: &Path, visit: &mut dyn FnMut(&Path)) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            traverse(&path, visit)?;
        } else if is_text_file(&path) {
            visit(&path);
        }
    }
    Ok(())
}
