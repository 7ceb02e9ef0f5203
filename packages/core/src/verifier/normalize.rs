//! Text normalization for anchor matching.
//!
//! PDF text extraction introduces artifacts the extraction client silently
//! repairs: words split across line wraps ("off ence"), spaced hyphens,
//! smart quotes, stray spaces before punctuation. Both the anchor and the
//! source text are normalized the same way so those differences vanish
//! before the substring search.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

#[allow(clippy::expect_used)] // Static regexes that are guaranteed to be valid
static SPACED_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*").expect("valid regex"));

#[allow(clippy::expect_used)]
static SPACE_BETWEEN_LOWERCASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])\s+([a-z])").expect("valid regex"));

#[allow(clippy::expect_used)]
static SPACE_BEFORE_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,;:!?)\]])").expect("valid regex"));

#[allow(clippy::expect_used)]
static SPACE_AFTER_OPENING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([(\[])\s+").expect("valid regex"));

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize text for anchor matching.
///
/// Steps, in order:
/// 1. NFKC compatibility folding (ligatures such as "ﬁ" become "fi") and lowercasing
/// 2. smart double quotes become `"`, smart single quotes become `'`
/// 3. en/em dashes and the minus sign become `-`
/// 4. spaces around hyphens are collapsed (`non - resident` → `non-resident`)
/// 5. whitespace between two lowercase letters is removed, in two passes so
///    overlapping runs ("a b c") are fully joined
/// 6. whitespace before closing punctuation and after opening brackets is removed
/// 7. remaining whitespace runs collapse to one space; the result is trimmed
///
/// Hyphens are preserved, never removed.
///
/// # Examples
/// ```
/// use lawtext_core::verifier::normalize;
///
/// assert_eq!(normalize("non - resident"), normalize("non-resident"));
/// assert_eq!(normalize("an off ence"), normalize("an offence"));
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();

    let unified: String = folded
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    let text = SPACED_HYPHEN.replace_all(&unified, "-");
    let text = SPACE_BETWEEN_LOWERCASE.replace_all(&text, "$1$2");
    let text = SPACE_BETWEEN_LOWERCASE.replace_all(&text, "$1$2");
    let text = SPACE_BEFORE_CLOSING.replace_all(&text, "$1");
    let text = SPACE_AFTER_OPENING.replace_all(&text, "$1");
    let text = WHITESPACE_RUN.replace_all(&text, " ");

    text.trim().to_string()
}
