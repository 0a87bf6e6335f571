use std::collections::{BTreeSet, HashSet};

/// A normalized set of topic keywords: trimmed, lowercased, non-empty, unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        KeywordSet(
            tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Parses a comma-separated list such as `"python, ML,sql"`.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains(keyword)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Size of the intersection with a stored metadata list. Repeated
    /// metadata entries count once.
    pub fn overlap(&self, metadata: &[String]) -> usize {
        metadata
            .iter()
            .map(String::as_str)
            .filter(|k| self.contains(k))
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalizes_case_whitespace_and_duplicates() {
        let set = KeywordSet::new(["  Python", "python", "ML ", "", "   "]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("python"));
        assert!(set.contains("ml"));
    }

    #[test]
    fn test_parse_list_splits_on_commas() {
        let set = KeywordSet::parse_list("python, ML,,sql");
        assert_eq!(set.to_vec(), strings(&["ml", "python", "sql"]));
    }

    #[test]
    fn test_parse_empty_list_is_empty() {
        assert!(KeywordSet::parse_list("").is_empty());
        assert!(KeywordSet::parse_list(" , ,").is_empty());
    }

    #[test]
    fn test_overlap_counts_shared_keywords() {
        let set = KeywordSet::new(["python", "ml", "sql"]);
        assert_eq!(set.overlap(&strings(&["python", "ml", "rust"])), 2);
        assert_eq!(set.overlap(&strings(&["rust", "go"])), 0);
        assert_eq!(set.overlap(&[]), 0);
    }

    #[test]
    fn test_overlap_ignores_repeated_metadata() {
        let set = KeywordSet::new(["python", "ml"]);
        assert_eq!(set.overlap(&strings(&["python", "python", "python"])), 1);
    }
}
