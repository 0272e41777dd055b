use std::num::NonZeroUsize;

/// Separator between metadata and content fragments
pub const FRAGMENT_SEPARATOR: &str = ", ";

/// Rounds a score to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Number of CPUs the process may use, at least 1
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Joins the non-blank fragments with [`FRAGMENT_SEPARATOR`]
pub fn join_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .filter_map(|fragment| {
            let fragment = fragment.as_ref().trim();
            (!fragment.is_empty()).then(|| fragment.to_string())
        })
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}

/// Collapses every whitespace run into a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
