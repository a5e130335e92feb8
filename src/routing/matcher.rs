//! File name matching logic.
//!
//! # Responsibilities
//! - Match a fixed prefix (case-sensitive)
//! - Match a fixed suffix (case-sensitive)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Equivalent to the shell pattern `<prefix>*<suffix>`, nothing more
//! - Hidden files never match unless the prefix itself starts with a dot
//! - No regex or glob engine: prefixes are caller data and must stay literal

use std::fmt;

/// Trait for matching directory entry names against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the name matches this condition.
    fn matches(&self, name: &str) -> bool;
}

/// Matches the start of the name.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && (self.prefix.starts_with('.') || !name.starts_with('.'))
    }
}

/// Matches the end of the name.
#[derive(Debug, Clone)]
pub struct SuffixMatcher {
    suffix: String,
}

impl SuffixMatcher {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Matcher for SuffixMatcher {
    fn matches(&self, name: &str) -> bool {
        name.ends_with(&self.suffix)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, name: &str) -> bool {
        self.matchers.iter().all(|m| m.matches(name))
    }
}

/// `<prefix>*<suffix>`, where prefix and suffix must not overlap.
#[derive(Debug)]
pub struct FilePattern {
    prefix: String,
    suffix: String,
    matcher: AndMatcher,
}

impl FilePattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let suffix = suffix.into();
        let matcher = AndMatcher::new(vec![
            Box::new(PrefixMatcher::new(prefix.clone())),
            Box::new(SuffixMatcher::new(suffix.clone())),
        ]);
        Self {
            prefix,
            suffix,
            matcher,
        }
    }
}

impl Matcher for FilePattern {
    fn matches(&self, name: &str) -> bool {
        name.len() >= self.prefix.len() + self.suffix.len() && self.matcher.matches(name)
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.prefix, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matcher() {
        let matcher = PrefixMatcher::new("nodelist_");
        assert!(matcher.matches("nodelist_a.xml"));
        assert!(!matcher.matches("info_a.xml"));
        assert!(!matcher.matches("Nodelist_a.xml")); // Case sensitive
    }

    #[test]
    fn test_hidden_names_need_explicit_dot() {
        assert!(!PrefixMatcher::new("").matches(".hidden.xml"));
        assert!(PrefixMatcher::new(".h").matches(".hidden.xml"));
    }

    #[test]
    fn test_file_pattern() {
        let pattern = FilePattern::new("catalog_0013A2_", ".xml");
        assert_eq!(pattern.to_string(), "catalog_0013A2_*.xml");
        assert!(pattern.matches("catalog_0013A2_v1.xml"));
        assert!(pattern.matches("catalog_0013A2_.xml"));
        assert!(!pattern.matches("catalog_0013A2_v1.xml.bak"));
        assert!(!pattern.matches("catalog_0013A3_v1.xml"));
    }

    #[test]
    fn test_prefix_and_suffix_do_not_overlap() {
        // "a.xml" would satisfy both halves of "a.xml*.xml" only by sharing characters
        let pattern = FilePattern::new("a.xml", ".xml");
        assert!(!pattern.matches("a.xml"));
        assert!(pattern.matches("a.xml.xml"));
    }
}
