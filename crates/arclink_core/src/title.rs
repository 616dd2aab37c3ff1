use std::sync::LazyLock;

use regex::Regex;

// Non-greedy, one bracket kind at a time, never across a line break.
static SQUARE_SPANS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("square bracket regex must compile"));
static ROUND_SPANS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("round bracket regex must compile"));
static CURLY_SPANS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*?\}").expect("curly bracket regex must compile"));

/// Builds the search title for an archive by dropping bracketed annotations
/// such as `[Circle]`, `(Magazine 2020-01)` or `{Translator}`.
///
/// Square spans go first, then round, then curly; the result is trimmed.
/// Text outside bracket pairs is left as it is, including inner whitespace.
pub fn normalize_search_title(title: &str) -> String {
    let without_square = SQUARE_SPANS.replace_all(title, "");
    let without_round = ROUND_SPANS.replace_all(&without_square, "");
    let without_curly = CURLY_SPANS.replace_all(&without_round, "");
    without_curly.trim().to_string()
}
