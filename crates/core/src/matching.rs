/// A catalog name with its row id, used for tiered fuzzy lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameEntry {
    pub id: i64,
    pub name: String,
}

impl NameEntry {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MatchTier {
    Exact,
    Prefix,
    Substring,
}

fn tier(query: &str, name: &str) -> Option<MatchTier> {
    let query = query.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    if query.is_empty() || name.is_empty() {
        return None;
    }
    if name == query {
        Some(MatchTier::Exact)
    } else if name.starts_with(&query) {
        Some(MatchTier::Prefix)
    } else if name.contains(&query) || query.contains(&name) {
        // Handles both an abbreviated query ("hdfc" -> "HDFC Life") and a
        // verbose one ("the HDFC Life insurer").
        Some(MatchTier::Substring)
    } else {
        None
    }
}

/// Resolves a name fragment against catalog entries with explicit precedence:
/// exact match, then prefix, then substring, all case-insensitive. Within a
/// tier the lowest id wins, keeping the selection deterministic.
pub fn best_match<'a>(query: &str, entries: &'a [NameEntry]) -> Option<&'a NameEntry> {
    entries
        .iter()
        .filter_map(|entry| tier(query, &entry.name).map(|tier| (tier, entry)))
        .min_by_key(|(tier, entry)| (*tier, entry.id))
        .map(|(_, entry)| entry)
}
