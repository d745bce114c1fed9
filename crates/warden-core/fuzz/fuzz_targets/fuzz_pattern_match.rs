//! Fuzz target for the pattern matcher
//!
//! Feeds arbitrary pattern/candidate combinations to ensure no panics,
//! including malformed delimiter patterns and invalid regex fragments.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_core::matcher::{Matcher, RegexMatcher};

/// Structured input for pattern matching
#[derive(Arbitrary, Debug)]
struct MatchInput {
    pattern: String,
    candidate: String,
}

fuzz_target!(|input: MatchInput| {
    if input.pattern.len() <= 4096 && input.candidate.len() <= 4096 {
        let matcher = RegexMatcher::new();

        // Must never panic, whatever the pattern looks like
        let _ = matcher.matches_pattern(&input.pattern, &input.candidate);
        let _ = matcher.matches_pattern(&input.pattern, "");

        // Delimiter-free patterns must match exactly themselves
        if !input.pattern.contains('<') && !input.pattern.contains('>') {
            assert!(matcher.matches_pattern(&input.pattern, &input.pattern));
        }

        // Cached and cold evaluation must agree
        let first = matcher.matches_pattern(&input.pattern, &input.candidate);
        let second = matcher.matches_pattern(&input.pattern, &input.candidate);
        assert_eq!(first, second);
    }
});
