//! Slug encoding for path components derived from document metadata.
//!
//! Every classification attribute that ends up in an export path passes
//! through [`slugify`] first, so free-text fields typed into the DMS can never
//! introduce path separators or control characters.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Anything that is not a word character, whitespace or hyphen.
#[allow(clippy::expect_used)]
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s-]").expect("slug character class is valid") // Static pattern, safe to panic
});

/// Runs of hyphens and whitespace, collapsed to a single hyphen.
#[allow(clippy::expect_used)]
static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\s]+").expect("slug separator class is valid") // Static pattern, safe to panic
});

/// Converts arbitrary text into a lowercase, hyphenated, filesystem-safe token.
///
/// With `allow_unicode = false` the value is NFKD-decomposed and everything
/// outside ASCII is dropped, so `"Müller"` becomes `"muller"`. With
/// `allow_unicode = true` the value is NFKC-normalized and non-ASCII letters
/// are kept.
///
/// Characters other than word characters, whitespace and hyphens are replaced
/// by `.`; the result is lowercased, trimmed, and runs of whitespace or hyphens
/// collapse to one `-`. The function is total and idempotent.
///
/// # Examples
///
/// ```
/// use ecodms_export::slug::slugify;
///
/// assert_eq!(slugify("Hello World", false), "hello-world");
/// assert_eq!(slugify("a/b", false), "a.b");
/// ```
#[must_use]
pub fn slugify(value: &str, allow_unicode: bool) -> String {
    let normalized: String = if allow_unicode {
        value.nfkc().collect()
    } else {
        value.nfkd().filter(char::is_ascii).collect()
    };
    let lowered = normalized.to_lowercase();
    let replaced = DISALLOWED.replace_all(&lowered, ".");
    SEPARATOR_RUN.replace_all(replaced.trim(), "-").into_owned()
}
