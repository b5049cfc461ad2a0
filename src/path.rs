//! Dot-delimited state paths
//!
//! `"game.memory.score"` addresses key `score` inside `memory` inside `game`.
//! Segments are taken literally, so `"a..b"` has an empty middle key.

use std::fmt;

/// Path subscribers use to hear about every reset
pub const WILDCARD: &str = "*";

/// A parsed state path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatePath {
    raw: String,
    segments: Vec<String>,
}

impl StatePath {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            segments: raw.split('.').map(str::to_string).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment (the key assigned by a write)
    pub fn leaf(&self) -> &str {
        // split() always yields at least one segment
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Segments leading to the leaf
    pub fn parent_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_wildcard(&self) -> bool {
        self.raw == WILDCARD
    }

    /// Strict ancestors, nearest parent first.
    ///
    /// `"a.b.c"` yields `"a.b"` then `"a"`.
    pub fn ancestors(&self) -> impl Iterator<Item = String> + '_ {
        (1..self.segments.len())
            .rev()
            .map(move |len| self.segments[..len].join("."))
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for StatePath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Parse a segment as a sequence index (plain decimal digits only)
pub fn as_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let path = StatePath::parse("game.memory.score");
        assert_eq!(path.segments(), ["game", "memory", "score"]);
        assert_eq!(path.leaf(), "score");
        assert_eq!(path.parent_segments(), ["game", "memory"]);
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let path = StatePath::parse("a.b.c");
        let ancestors: Vec<String> = path.ancestors().collect();
        assert_eq!(ancestors, vec!["a.b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_top_level_has_no_ancestors() {
        let path = StatePath::parse("user");
        assert_eq!(path.ancestors().count(), 0);
        assert!(path.parent_segments().is_empty());
    }

    #[test]
    fn test_empty_segments_are_keys() {
        let path = StatePath::parse("a..b");
        assert_eq!(path.segments(), ["a", "", "b"]);

        let empty = StatePath::parse("");
        assert_eq!(empty.segments(), [""]);
    }

    #[test]
    fn test_wildcard() {
        assert!(StatePath::parse(WILDCARD).is_wildcard());
        assert!(!StatePath::parse("user").is_wildcard());
    }

    #[test]
    fn test_as_index() {
        assert_eq!(as_index("0"), Some(0));
        assert_eq!(as_index("12"), Some(12));
        assert_eq!(as_index("-1"), None);
        assert_eq!(as_index("+1"), None);
        assert_eq!(as_index("1a"), None);
        assert_eq!(as_index(""), None);
    }
}
