//! Pattern matching for subjects, resources, and actions.
//!
//! A pattern is either a literal string (byte-exact match) or contains one or
//! more `<...>` segments, where the text between `<` and `>` is an embedded
//! regular expression fragment and everything outside is matched literally.
//! `"myrn:foo:<bar|baz>"` matches `"myrn:foo:bar"` and `"myrn:foo:baz"` and
//! nothing else; the compiled expression is anchored to the whole candidate.
//!
//! Compiled expressions are cached per matcher instance, keyed by the raw
//! pattern text. Patterns recur across every request evaluated against a
//! policy set, so after warm-up matching is lock-read plus `is_match`.

use crate::error::{PolicyError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;

/// Start of an embedded regex fragment
const DELIMITER_START: char = '<';
/// End of an embedded regex fragment
const DELIMITER_END: char = '>';

/// Tests a candidate string against a set of policy patterns.
///
/// Seam for swapping the matching strategy; the engine only depends on this
/// trait.
pub trait Matcher: Send + Sync {
    /// True iff any pattern in the sequence matches the whole candidate.
    /// An empty pattern sequence never matches.
    fn matches(&self, patterns: &[String], candidate: &str) -> bool;
}

/// Regex-backed [`Matcher`] with a compiled-pattern cache.
///
/// Safe for concurrent use from many evaluators. Cache misses compile outside
/// the lock; redundant concurrent compiles of the same pattern are tolerated
/// (last write wins) since compiled regexes for the same text are
/// interchangeable. Entries are never evicted: the pattern space is bounded
/// by the policy corpus, which is small relative to request volume.
#[derive(Debug)]
pub struct RegexMatcher {
    cache: RwLock<HashMap<String, Regex>>,
}

impl Default for RegexMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexMatcher {
    /// Create a matcher with an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Test a single pattern against a candidate.
    ///
    /// A pattern without delimiters matches iff it is byte-identical to the
    /// candidate. A pattern whose fragment fails to compile matches nothing;
    /// unmatched is the safe default for an authorization decision. Policy
    /// validation rejects such patterns at write time, so this path only
    /// triggers for patterns that bypassed validation.
    #[must_use]
    pub fn matches_pattern(&self, pattern: &str, candidate: &str) -> bool {
        if !pattern.contains(DELIMITER_START) && !pattern.contains(DELIMITER_END) {
            return pattern == candidate;
        }

        self.get_or_compile(pattern)
            .map(|re| re.is_match(candidate))
            .unwrap_or(false)
    }

    /// Number of cached compiled patterns
    #[must_use]
    pub fn cached_patterns(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Get a compiled regex from cache or compile and cache it
    fn get_or_compile(&self, pattern: &str) -> Option<Regex> {
        if let Some(re) = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(pattern).cloned())
        {
            return Some(re);
        }

        let re = compile_pattern(pattern).ok()?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(pattern.to_string(), re.clone());
        }

        Some(re)
    }
}

impl Matcher for RegexMatcher {
    fn matches(&self, patterns: &[String], candidate: &str) -> bool {
        patterns
            .iter()
            .any(|pattern| self.matches_pattern(pattern, candidate))
    }
}

/// Compile a delimiter pattern into an anchored regex.
///
/// Shared by the matcher (lazily, on cache miss) and by policy validation
/// (eagerly, to reject malformed patterns at write time).
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
    let expr = build_expression(pattern)?;
    Regex::new(&expr).map_err(|e| PolicyError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Translate a delimiter pattern into a full-string regex source.
///
/// Literal runs are escaped so regex metacharacters in them match literally;
/// fragment text inside `<...>` is inserted verbatim, wrapped in a
/// non-capturing group so alternation stays scoped to its segment.
fn build_expression(pattern: &str) -> Result<String> {
    let invalid = |reason: &str| PolicyError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');

    let mut run = String::new();
    let mut in_fragment = false;

    for ch in pattern.chars() {
        match ch {
            DELIMITER_START if !in_fragment => {
                expr.push_str(&regex::escape(&run));
                run.clear();
                in_fragment = true;
            }
            DELIMITER_START => return Err(invalid("nested '<' delimiter")),
            DELIMITER_END if in_fragment => {
                expr.push_str("(?:");
                expr.push_str(&run);
                expr.push(')');
                run.clear();
                in_fragment = false;
            }
            DELIMITER_END => return Err(invalid("'>' without matching '<'")),
            _ => run.push(ch),
        }
    }

    if in_fragment {
        return Err(invalid("unclosed '<' delimiter"));
    }

    expr.push_str(&regex::escape(&run));
    expr.push('$');
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, candidate: &str) -> bool {
        RegexMatcher::new().matches_pattern(pattern, candidate)
    }

    #[test]
    fn test_literal_pattern_is_exact() {
        assert!(matches("myrn:foo:123", "myrn:foo:123"));
        assert!(!matches("myrn:foo:123", "myrn:foo:12"));
        assert!(!matches("myrn:foo:123", "myrn:foo:1234"));
        assert!(!matches("myrn:foo:123", "xmyrn:foo:123"));
    }

    #[test]
    fn test_literal_pattern_treats_metacharacters_literally() {
        assert!(matches("a.b", "a.b"));
        assert!(!matches("a.b", "axb"));
        assert!(matches("a+b", "a+b"));
        assert!(!matches("a+b", "aab"));
    }

    #[test]
    fn test_fragment_is_anchored_to_full_candidate() {
        assert!(matches("myrn:something:foo:<.+>", "myrn:something:foo:bar"));
        assert!(!matches("myrn:something:foo:<.+>", "myrn:something:foo:"));
        assert!(!matches("myrn:something:foo:<.+>", "xmyrn:something:foo:bar"));
    }

    #[test]
    fn test_alternation_scoped_to_its_segment() {
        assert!(matches("<zac|ken>", "zac"));
        assert!(matches("<zac|ken>", "ken"));
        assert!(!matches("<zac|ken>", "zacken"));

        // Without the group, "urn:zac|ken" would anchor incorrectly
        assert!(matches("urn:<zac|ken>:1", "urn:zac:1"));
        assert!(!matches("urn:<zac|ken>:1", "ken:1"));
    }

    #[test]
    fn test_wildcard_matches_empty_candidate() {
        assert!(matches("<.*>", ""));
        assert!(matches("<.*>", "anything at all"));
        assert!(!matches("<.+>", ""));
    }

    #[test]
    fn test_empty_pattern_list_never_matches() {
        let matcher = RegexMatcher::new();
        assert!(!matcher.matches(&[], "anything"));
        assert!(!matcher.matches(&[], ""));
    }

    #[test]
    fn test_any_of_semantics_across_patterns() {
        let matcher = RegexMatcher::new();
        let patterns = vec!["max".to_string(), "peter".to_string(), "<zac|ken>".to_string()];
        assert!(matcher.matches(&patterns, "peter"));
        assert!(matcher.matches(&patterns, "ken"));
        assert!(!matcher.matches(&patterns, "anna"));
    }

    #[test]
    fn test_invalid_fragment_is_a_non_match() {
        assert!(!matches("<[unclosed>", "anything"));
        assert!(!matches("<[unclosed>", "<[unclosed>"));
    }

    #[test]
    fn test_unbalanced_delimiters_are_invalid() {
        assert!(compile_pattern("foo<bar").is_err());
        assert!(compile_pattern("foo>bar").is_err());
        assert!(compile_pattern("a<b<c>>").is_err());
        assert!(!matches("foo<bar", "foo<bar"));
    }

    #[test]
    fn test_cache_populates_lazily_and_is_transparent() {
        let matcher = RegexMatcher::new();
        assert_eq!(matcher.cached_patterns(), 0);

        // Literal patterns bypass the cache entirely
        assert!(matcher.matches_pattern("literal", "literal"));
        assert_eq!(matcher.cached_patterns(), 0);

        // Same pattern, different candidates: one cache entry, identical results
        assert!(matcher.matches_pattern("urn:<.+>", "urn:a"));
        assert!(matcher.matches_pattern("urn:<.+>", "urn:b"));
        assert!(!matcher.matches_pattern("urn:<.+>", "urn:"));
        assert_eq!(matcher.cached_patterns(), 1);
    }

    #[test]
    fn test_expression_building() {
        assert_eq!(build_expression("abc").unwrap(), "^abc$");
        assert_eq!(build_expression("a.b").unwrap(), r"^a\.b$");
        assert_eq!(build_expression("a<\\d+>b").unwrap(), r"^a(?:\d+)b$");
        assert_eq!(
            build_expression("<create|delete>").unwrap(),
            "^(?:create|delete)$"
        );
    }
}
