//! Case-insensitive, word-boundary-safe pattern matching.
//!
//! Patterns are tried longest-first; once a span of text is claimed by a
//! pattern no shorter pattern may match inside it, so "Acme Card Plus" counts
//! once rather than once for every sub-pattern.

use std::ops::Range;

use crate::patterns::BrandPatternSet;

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn fold_all(text: &str) -> Vec<char> {
    text.chars().map(fold).collect()
}

/// Non-overlapping matches of `patterns` in `text`, as char ranges in text order.
#[must_use]
pub fn find_matches(text: &str, patterns: &BrandPatternSet) -> Vec<Range<usize>> {
    let hay = fold_all(text);
    let mut claimed = vec![false; hay.len()];
    let mut found = Vec::new();

    for pattern in patterns.texts() {
        if pattern.trim().is_empty() {
            continue;
        }
        let needle = fold_all(pattern);
        let n = needle.len();
        if n > hay.len() {
            continue;
        }

        let mut i = 0;
        while i + n <= hay.len() {
            if hay[i..i + n] == needle[..]
                && at_word_boundary(&hay, i, i + n, &needle)
                && !claimed[i..i + n].iter().any(|&c| c)
            {
                claimed[i..i + n].iter_mut().for_each(|c| *c = true);
                found.push(i..i + n);
                i += n;
            } else {
                i += 1;
            }
        }
    }

    found.sort_by_key(|r| r.start);
    found
}

/// Number of pattern occurrences in `text`.
#[must_use]
pub fn count_matches(text: &str, patterns: &BrandPatternSet) -> usize {
    find_matches(text, patterns).len()
}

/// Alphanumeric pattern edges must not touch alphanumeric text.
fn at_word_boundary(hay: &[char], start: usize, end: usize, needle: &[char]) -> bool {
    let left_ok = !needle.first().is_some_and(|c| c.is_alphanumeric())
        || start == 0
        || !hay[start - 1].is_alphanumeric();
    let right_ok = !needle.last().is_some_and(|c| c.is_alphanumeric())
        || end == hay.len()
        || !hay[end].is_alphanumeric();
    left_ok && right_ok
}
