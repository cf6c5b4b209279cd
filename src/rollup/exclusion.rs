//! Account exclusion list for session and subscription statistics
//!
//! Known internal/system accounts are dropped from the folders entirely.
//! Lookups are exact matches against a sorted list.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    addrs: Vec<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut addrs: Vec<String> = addrs
            .into_iter()
            .map(Into::into)
            .filter(|addr| !addr.is_empty())
            .collect();
        addrs.sort();
        addrs.dedup();
        Self { addrs }
    }

    /// Parse a comma-separated list, ignoring blanks
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').map(|addr| addr.trim().to_string()))
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.addrs
            .binary_search_by(|probe| probe.as_str().cmp(addr))
            .is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let set = ExclusionSet::parse("sent1zzz, sent1aaa,,sent1mmm");

        assert_eq!(set.len(), 3);
        assert!(set.contains("sent1aaa"));
        assert!(set.contains("sent1mmm"));
        assert!(set.contains("sent1zzz"));
        assert!(!set.contains("sent1aa"));
        assert!(!set.contains("SENT1AAA"));
    }

    #[test]
    fn test_empty_list() {
        let set = ExclusionSet::parse("");
        assert!(set.is_empty());
        assert!(!set.contains(""));
    }
}
