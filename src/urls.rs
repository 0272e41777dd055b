use std::collections::HashSet;

/// Characters stripped from both ends of every item in a comma-separated list
pub const STRIP_CHARS: &[char] = &[' ', '"', '\''];

/// Trims surrounding whitespace from every URL
pub fn pre_process_urls<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    urls.iter().map(|url| url.as_ref().trim().to_string()).collect()
}

/// Splits a comma-separated parameter into its non-empty items.
///
/// Each item is stripped of spaces and single/double quotes, so
/// `"a", 'b' ,,c` yields `["a", "b", "c"]`.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim_matches(STRIP_CHARS))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes repeated URLs, keeping the first occurrence of each
pub fn dedupe<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(AsRef::as_ref)
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}
