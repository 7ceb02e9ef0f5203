//! Section-number and naming helpers shared by the merger and validator.

use regex::Regex;
use std::sync::LazyLock;

/// First run of ASCII digits in a section label.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Characters that are not word characters, whitespace or dashes.
#[allow(clippy::expect_used)]
static SLUG_NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));

/// Runs of whitespace, dashes and underscores.
#[allow(clippy::expect_used)]
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_\s]+").expect("valid regex"));

/// Normalize a section label into its deduplication key.
///
/// Lowercases, strips all whitespace and removes a leading "section" token.
///
/// # Examples
/// ```
/// use lawtext_core::text::normalize_section_number;
///
/// assert_eq!(normalize_section_number("Section 15"), "15");
/// assert_eq!(normalize_section_number(" 33 (1)(a) "), "33(1)(a)");
/// ```
#[must_use]
pub fn normalize_section_number(number: &str) -> String {
    let compact: String = number
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    compact
        .strip_prefix("section")
        .map(str::to_string)
        .unwrap_or(compact)
}

/// Numeric sort key of a section label: its first run of digits.
///
/// Labels without digits ("Part I", "Schedule") sort as 0, so they cluster
/// at the start of the list.
///
/// # Examples
/// ```
/// use lawtext_core::text::leading_number;
///
/// assert_eq!(leading_number("33(1)(a)"), 33);
/// assert_eq!(leading_number("Part I"), 0);
/// ```
#[must_use]
pub fn leading_number(number: &str) -> u64 {
    DIGIT_RUN
        .find(number)
        .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Generate a URL-friendly slug.
///
/// # Examples
/// ```
/// use lawtext_core::text::slugify;
///
/// assert_eq!(slugify("Criminal Code Act, 2004"), "criminal-code-act-2004");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let text = text.to_lowercase();
    let text = SLUG_NON_WORD.replace_all(&text, "");
    let text = SLUG_SEPARATORS.replace_all(&text, "-");
    text.trim_matches('-').to_string()
}

/// Derive a human-readable title from a file name or slug.
///
/// Drops the extension, turns separators into spaces and capitalizes each
/// word.
///
/// # Examples
/// ```
/// use lawtext_core::text::title_from_filename;
///
/// assert_eq!(title_from_filename("criminal-code_act.pdf"), "Criminal Code Act");
/// ```
#[must_use]
pub fn title_from_filename(filename: &str) -> String {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(filename);
    let stem = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().all(char::is_alphanumeric) => stem,
        _ => base,
    };

    SLUG_SEPARATORS
        .split(stem)
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
