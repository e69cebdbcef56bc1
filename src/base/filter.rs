//! Blacklist check for text the bot is asked to repeat.

use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};

use super::types::Res;

/// Words rejected by the `say` skill when no list is configured.
pub const DEFAULT_BLACKLIST: &[&str] = &["fuck", "shit", "cunt", "bitch", "bastard", "twat", "wanker", "asshole"];

/// Case-insensitive substring blacklist.
#[derive(Clone, Debug)]
pub struct WordFilter {
    automaton: Option<Arc<AhoCorasick>>,
}

impl WordFilter {
    /// Builds a filter from the given words; blank entries are skipped.
    pub fn new<I, S>(words: I) -> Res<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words.into_iter().map(|w| w.as_ref().trim().to_string()).filter(|w| !w.is_empty()).collect();

        if words.is_empty() {
            return Ok(Self { automaton: None });
        }

        let automaton = AhoCorasick::builder().ascii_case_insensitive(true).match_kind(MatchKind::LeftmostFirst).build(&words)?;

        Ok(Self { automaton: Some(Arc::new(automaton)) })
    }

    /// Returns true if `text` contains any blacklisted word.
    pub fn blacklisted(&self, text: &str) -> bool {
        self.automaton.as_ref().is_some_and(|ac| ac.is_match(text))
    }
}

impl Default for WordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLACKLIST).unwrap_or(Self { automaton: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklisted_is_case_insensitive_substring() {
        let filter = WordFilter::new(["heck", "darn"]).unwrap();

        assert!(filter.blacklisted("what the HECK"));
        assert!(filter.blacklisted("darnit"));
        assert!(!filter.blacklisted("hello world"));
    }

    #[test]
    fn test_empty_filter_allows_everything() {
        let filter = WordFilter::new(Vec::<String>::new()).unwrap();
        assert!(!filter.blacklisted("anything goes"));

        let filter = WordFilter::new(["  ", ""]).unwrap();
        assert!(!filter.blacklisted("anything goes"));
    }

    #[test]
    fn test_default_list() {
        let filter = WordFilter::default();
        assert!(filter.blacklisted("Shit happens"));
        assert!(!filter.blacklisted("ship it"));
    }
}
