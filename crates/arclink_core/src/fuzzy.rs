//! Fuzzy title matching and the auto-select policy.

/// Score treated as an exact title match.
pub const EXACT_SCORE: u8 = 100;
/// Candidates scoring below this never take part in a decision.
pub const DEFAULT_CUTOFF: u8 = 95;

/// One entry of the primary catalog's suggestion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    /// Display title, HTML entities already decoded.
    pub title: String,
    /// Absolute link to the catalog page.
    pub link: String,
    /// Content type reported by the catalog, e.g. `comic`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored<T> {
    pub item: T,
    pub score: u8,
}

/// What the candidate set allows without asking anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Nothing reached the cutoff.
    Nothing,
    /// Exactly one exact match, at this index.
    Exact(usize),
    /// No exact match, or several: the operator has to pick.
    Ambiguous,
}

/// Similarity of two titles, 0 to 100.
///
/// Both sides are lowercased with punctuation turned into spaces; the result is
/// the better of the plain and the token-sorted edit-distance ratio.
pub fn score(query: &str, choice: &str) -> u8 {
    let query = preprocess(query);
    let choice = preprocess(choice);
    let plain = ratio(&query, &choice);
    if plain == EXACT_SCORE {
        return plain;
    }
    plain.max(ratio(&token_sort(&query), &token_sort(&choice)))
}

/// Scores every choice against `query` and keeps those at or above `cutoff`,
/// in their original order.
pub fn extract_all<T, F, S>(
    query: &str,
    choices: impl IntoIterator<Item = T>,
    to_text: F,
    cutoff: u8,
) -> Vec<Scored<T>>
where
    F: Fn(&T) -> S,
    S: AsRef<str>,
{
    choices
        .into_iter()
        .map(|item| {
            let score = score(query, to_text(&item).as_ref());
            Scored { item, score }
        })
        .filter(|scored| scored.score >= cutoff)
        .collect()
}

/// Auto-selects only a unique exact match; two exact matches are as ambiguous
/// as none.
pub fn select<T>(results: &[Scored<T>]) -> Selection {
    if results.is_empty() {
        return Selection::Nothing;
    }
    let mut exact = results
        .iter()
        .enumerate()
        .filter(|(_, scored)| scored.score >= EXACT_SCORE)
        .map(|(index, _)| index);
    match (exact.next(), exact.next()) {
        (Some(index), None) => Selection::Exact(index),
        _ => Selection::Ambiguous,
    }
}

fn preprocess(text: &str) -> String {
    let spaced: String = text
        .chars()
        .flat_map(|ch| {
            let mapped = if ch.is_alphanumeric() { ch } else { ' ' };
            mapped.to_lowercase()
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn token_sort(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}
