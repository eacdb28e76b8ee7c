//! Detection of "repeatable content" tasks (jokes, quotes, facts, ...).

use regex::{Regex, RegexBuilder};

/// Default pattern families. Product policy; overridable from config.
pub const DEFAULT_REPEATABLE_PATTERNS: &[&str] = &[
    r"\bjokes?\b",
    r"\bpuns?\b",
    r"\bquotes?\b",
    r"\bquotations?\b",
    r"\b(fun )?facts?\b",
    r"\btips?\b",
    r"\briddles?\b",
    r"\bpoems?\b",
    r"\bhaikus?\b",
    r"\baffirmations?\b",
    r"\btrivia\b",
];

/// Case-insensitive pattern list deciding whether a task asks for content
/// that can be pre-generated in batches.
#[derive(Debug, Clone)]
pub struct RepeatableContentPolicy {
    patterns: Vec<Regex>,
}

impl RepeatableContentPolicy {
    /// Compile `patterns`; returns the first invalid pattern on failure.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, (String, regex::Error)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| (pattern.to_string(), e))?;
            compiled.push(regex);
        }
        Ok(Self { patterns: compiled })
    }

    /// A policy that never matches.
    pub fn disabled() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn matches(&self, task: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(task))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for RepeatableContentPolicy {
    fn default() -> Self {
        let patterns = DEFAULT_REPEATABLE_PATTERNS
            .iter()
            .filter_map(|p| RegexBuilder::new(p).case_insensitive(true).build().ok())
            .collect();
        Self { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_common_shapes() {
        let policy = RepeatableContentPolicy::default();
        assert_eq!(policy.len(), DEFAULT_REPEATABLE_PATTERNS.len());
        assert!(policy.matches("Tell me a JOKE about cats"));
        assert!(policy.matches("Send an inspirational quote every morning"));
        assert!(policy.matches("daily fun fact about space"));
        assert!(policy.matches("a productivity tip"));
        assert!(!policy.matches("Summarize the top crypto news today"));
        assert!(!policy.matches("check the weather in Lisbon"));
    }

    #[test]
    fn custom_patterns() {
        let policy = RepeatableContentPolicy::from_patterns(["recipe"]).unwrap();
        assert!(policy.matches("a new Recipe idea"));
        assert!(!policy.matches("tell me a joke"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = RepeatableContentPolicy::from_patterns(["ok", "(unclosed"]).unwrap_err();
        assert_eq!(err.0, "(unclosed");
    }

    #[test]
    fn disabled_never_matches() {
        assert!(!RepeatableContentPolicy::disabled().matches("joke"));
    }
}
