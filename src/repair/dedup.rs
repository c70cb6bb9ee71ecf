//! Per-run dedup cache
//!
//! Owned by a single repair run and dropped when it returns. Keys are trimmed
//! link strings.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct DedupCache {
    known_invalid: HashSet<String>,
    accepted: HashSet<String>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_known_invalid(&self, link: &str) -> bool {
        self.known_invalid.contains(link.trim())
    }

    pub fn mark_invalid(&mut self, link: &str) {
        self.known_invalid.insert(link.trim().to_string());
    }

    pub fn is_accepted(&self, link: &str) -> bool {
        self.accepted.contains(link.trim())
    }

    /// Record a link as part of the plan; false if it was already there
    pub fn accept(&mut self, link: &str) -> bool {
        self.accepted.insert(link.trim().to_string())
    }

    /// A replacement candidate must be new to the plan and not previously rejected
    pub fn is_usable_candidate(&self, link: &str) -> bool {
        !link.trim().is_empty() && !self.is_accepted(link) && !self.is_known_invalid(link)
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.known_invalid.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_is_first_seen_wins() {
        let mut cache = DedupCache::new();
        assert!(cache.accept("https://youtu.be/aaaaaaaaaaa"));
        assert!(!cache.accept(" https://youtu.be/aaaaaaaaaaa "));
        assert_eq!(cache.accepted_count(), 1);
    }

    #[test]
    fn test_candidate_usability() {
        let mut cache = DedupCache::new();
        cache.accept("https://youtu.be/aaaaaaaaaaa");
        cache.mark_invalid("https://youtu.be/bbbbbbbbbbb");
        assert!(!cache.is_usable_candidate("https://youtu.be/aaaaaaaaaaa"));
        assert!(!cache.is_usable_candidate("https://youtu.be/bbbbbbbbbbb"));
        assert!(!cache.is_usable_candidate("   "));
        assert!(cache.is_usable_candidate("https://youtu.be/ccccccccccc"));
        assert_eq!(cache.invalid_count(), 1);
    }
}
