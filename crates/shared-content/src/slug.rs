//! Slug derivation.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const SEPARATOR: char = '-';

/// Derive a URL slug from a title.
///
/// Decomposes with NFKD, drops combining marks, lowercases, and collapses
/// every run of characters outside `[a-z0-9]` into one `-`. Leading and
/// trailing separators are trimmed. The output is a fixed point:
/// `normalize_slug(&normalize_slug(x)) == normalize_slug(x)`.
pub fn normalize_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.nfkd().filter(|c| !is_combining_mark(*c)) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}
