//! Estimates how long a post takes to read.

use crate::post::ContentBlock;
use crate::richtext;

/// Reading speed in words per minute.
const WORDS_PER_MINUTE: f64 = 200.0;

/// Minutes added to every estimate.
const BASE_MINUTES: f64 = 3.0;

/// Returns the estimated reading time formatted as `"<minutes> min"`.
///
/// Only the first block is counted. Its heading and the HTML rendering of its
/// body are split on every whitespace character and the pieces (including
/// empty ones, so `""` counts as one) are summed; the estimate is
/// `ceil(words / 200 + 3)`. Later blocks never change the result.
///
/// # Panics
///
/// Panics if `content` is empty.
pub fn estimate(content: &[ContentBlock]) -> String {
    let first = &content[0];
    let words = count_words(&first.heading)
        + count_words(&richtext::as_html(&first.body));
    let minutes = (words as f64 / WORDS_PER_MINUTE + BASE_MINUTES).ceil();
    format!("{} min", minutes as u64)
}

// Counts the pieces produced by splitting on each whitespace character. Runs
// of whitespace and leading/trailing whitespace yield empty pieces, which are
// counted too.
fn count_words(text: &str) -> usize {
    text.split(is_whitespace).count()
}

// Unicode whitespace minus NEL (U+0085), plus the byte-order mark.
fn is_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}
