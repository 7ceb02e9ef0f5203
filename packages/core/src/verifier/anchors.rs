//! Anchor selection and substring matching.
//!
//! An anchor is a distinctive sentence taken from a section's extracted
//! content. If the extraction is faithful, the anchor appears in the source
//! text after both sides are normalized.

use serde::{Deserialize, Serialize};

use crate::config::AnchorLexicon;
use crate::verifier::normalize::normalize;

/// Preferred anchor length in words.
const MIN_ANCHOR_WORDS: usize = 8;
const MAX_ANCHOR_WORDS: usize = 40;

/// Shorter sentences are accepted when too few preferred candidates exist.
const MIN_WIDENED_ANCHOR_WORDS: usize = 5;

/// "The ..." openers shorter than this are penalized as generic.
const GENERIC_OPENER_MAX_WORDS: usize = 20;

/// Result of searching one anchor in the normalized source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorMatch {
    /// The anchor as it appears in the section content.
    pub anchor: String,
    pub found: bool,
    /// Byte offset in the normalized source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// Number of anchors to check for a section.
///
/// Short sections (under 50 words) get a single anchor, very short ones by
/// character count get two, everything else three.
#[must_use]
pub fn anchor_count_for(content: &str) -> usize {
    if content.split_whitespace().count() < 50 {
        1
    } else if content.chars().count() < 200 {
        2
    } else {
        3
    }
}

/// Split text into sentences.
///
/// A sentence ends at `.`, `?` or `!` followed by whitespace or the end of
/// the text. The delimiter stays with its sentence; results are trimmed and
/// empty fragments dropped.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '?' | '!') {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, fragment: &'a str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

/// Pick the `count` most distinctive sentences of `content`.
///
/// Candidates are sentences of 8-40 words, widened to 5-40 words when that
/// yields fewer than `count`. Ties keep document order.
#[must_use]
pub fn extract_anchors(content: &str, count: usize, lexicon: &AnchorLexicon) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let sentences = split_sentences(content);
    let mut candidates = candidates_within(&sentences, MIN_ANCHOR_WORDS);
    if candidates.len() < count {
        candidates = candidates_within(&sentences, MIN_WIDENED_ANCHOR_WORDS);
    }

    let mut scored: Vec<(i64, &str)> = candidates
        .into_iter()
        .map(|sentence| (uniqueness_score(sentence, lexicon), sentence))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(count)
        .map(|(_, sentence)| sentence.to_string())
        .collect()
}

fn candidates_within<'a>(sentences: &[&'a str], min_words: usize) -> Vec<&'a str> {
    sentences
        .iter()
        .copied()
        .filter(|s| {
            let words = s.split_whitespace().count();
            (min_words..=MAX_ANCHOR_WORDS).contains(&words)
        })
        .collect()
}

/// Heuristic likelihood that a sentence occurs only once in the document.
#[must_use]
pub fn uniqueness_score(sentence: &str, lexicon: &AnchorLexicon) -> i64 {
    let lower = sentence.to_lowercase();
    let words: Vec<&str> = sentence.split_whitespace().collect();
    let mut score: i64 = 0;

    if sentence.chars().any(|c| c.is_ascii_digit()) {
        score += 2;
    }

    // Proper nouns, ignoring the sentence-initial word
    score += words
        .iter()
        .skip(1)
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count() as i64;

    // Lexicons built in code or deserialized directly may carry capitals
    for term in &lexicon.distinctive_terms {
        score += count_term(&lower, &term.to_lowercase()) as i64;
    }
    for phrase in &lexicon.boilerplate_phrases {
        score -= 3 * count_term(&lower, &phrase.to_lowercase()) as i64;
    }

    if lower.starts_with("the ") && words.len() < GENERIC_OPENER_MAX_WORDS {
        score -= 1;
    }

    score
}

/// Count occurrences of `term` in `haystack` that are not embedded in a
/// longer word. Edges made of symbols ("₦") match anywhere.
fn count_term(haystack: &str, term: &str) -> usize {
    if term.is_empty() {
        return 0;
    }
    let starts_alnum = term.chars().next().is_some_and(char::is_alphanumeric);
    let ends_alnum = term.chars().next_back().is_some_and(char::is_alphanumeric);

    haystack
        .match_indices(term)
        .filter(|(i, _)| {
            let before_ok = !starts_alnum
                || haystack[..*i]
                    .chars()
                    .next_back()
                    .is_none_or(|c| !c.is_alphanumeric());
            let after_ok = !ends_alnum
                || haystack[i + term.len()..]
                    .chars()
                    .next()
                    .is_none_or(|c| !c.is_alphanumeric());
            before_ok && after_ok
        })
        .count()
}

/// Search for `anchor` in an already-normalized source text.
///
/// The anchor is normalized here; the source must be normalized once per
/// document by the caller. An anchor that normalizes to nothing is never
/// found.
#[must_use]
pub fn search_anchor(anchor: &str, normalized_source: &str) -> AnchorMatch {
    let needle = normalize(anchor);
    let position = if needle.is_empty() {
        None
    } else {
        normalized_source.find(&needle)
    };

    AnchorMatch {
        anchor: anchor.to_string(),
        found: position.is_some(),
        position,
    }
}
