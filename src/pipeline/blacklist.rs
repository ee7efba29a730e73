// src/pipeline/blacklist.rs

//! Static module blacklist.

use std::collections::HashMap;

/// Lookup of modules that must never be analyzed, with the reason why.
#[derive(Debug, Clone, Default)]
pub struct BlacklistFilter {
    entries: HashMap<String, String>,
}

impl BlacklistFilter {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Reason the module is blacklisted, if it is.
    pub fn is_blacklisted(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> BlacklistFilter {
        BlacklistFilter::new(HashMap::from([(
            "hooka-tools".to_string(),
            "Package is too big".to_string(),
        )]))
    }

    #[test]
    fn test_listed_module_has_reason() {
        assert_eq!(
            filter().is_blacklisted("hooka-tools"),
            Some("Package is too big")
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        let filter = filter();
        assert_eq!(filter.is_blacklisted("left-pad"), None);
        assert_eq!(filter.is_blacklisted("Hooka-Tools"), None);
        assert_eq!(filter.is_blacklisted("hooka"), None);
    }

    #[test]
    fn test_empty_filter() {
        let filter = BlacklistFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.is_blacklisted("anything"), None);
    }
}
