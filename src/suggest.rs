use crate::models::CategoryUsage;

pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    Prefix,
    Contains,
}

fn match_kind(name: &str, query: &str) -> Option<MatchKind> {
    let name = name.to_lowercase();
    if name.starts_with(query) {
        Some(MatchKind::Prefix)
    } else if name.contains(query) {
        Some(MatchKind::Contains)
    } else {
        None
    }
}

/// Ranks category names for the partial input `input`.
///
/// `history` must already be ordered most recently used first. A blank input
/// returns the most recent names. Otherwise names starting with the input come
/// before names that only contain it, recency breaks ties, and names that do
/// not match at all are left out.
pub fn rank_suggestions(history: &[CategoryUsage], input: &str, limit: usize) -> Vec<String> {
    let query = input.trim().to_lowercase();
    if query.is_empty() {
        return history.iter().take(limit).map(|c| c.name.clone()).collect();
    }

    let mut matched: Vec<(MatchKind, usize, &str)> = history
        .iter()
        .enumerate()
        .filter_map(|(pos, c)| match_kind(&c.name, &query).map(|kind| (kind, pos, c.name.as_str())))
        .collect();
    matched.sort_by_key(|(kind, pos, _)| (*kind, *pos));
    matched
        .into_iter()
        .take(limit)
        .map(|(_, _, name)| name.to_string())
        .collect()
}
