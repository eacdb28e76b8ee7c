//! Recurring-job parameters: novelty pipeline and fire retry policy.

use relay_domain::DEFAULT_REPEATABLE_PATTERNS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Novelty pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoveltyParams {
    /// Number of future items requested when batch-generating.
    pub batch_size: usize,
    /// Minimum similarity score for a witness to be quoted.
    pub similarity_threshold: f32,
    /// Maximum witnesses quoted in one directive.
    pub similarity_limit: usize,
    /// How far back similar exchanges are considered. `None` = all history.
    pub similarity_window: Option<Duration>,
    /// Regexes deciding whether a task is repeatable content.
    pub repeatable_patterns: Vec<String>,
}

impl Default for NoveltyParams {
    fn default() -> Self {
        Self {
            batch_size: 10,
            similarity_threshold: 0.35,
            similarity_limit: 5,
            similarity_window: Some(Duration::from_secs(30 * 24 * 60 * 60)),
            repeatable_patterns: DEFAULT_REPEATABLE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl NoveltyParams {
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_similarity_limit(mut self, limit: usize) -> Self {
        self.similarity_limit = limit;
        self
    }

    pub fn with_similarity_window(mut self, window: Option<Duration>) -> Self {
        self.similarity_window = window;
        self
    }

    pub fn with_repeatable_patterns(mut self, patterns: Vec<String>) -> Self {
        self.repeatable_patterns = patterns;
        self
    }
}

/// Fire retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireParams {
    /// Delay before a failed fire becomes due again.
    pub retry_backoff: Duration,
}

impl Default for FireParams {
    fn default() -> Self {
        Self {
            retry_backoff: Duration::from_secs(5 * 60),
        }
    }
}

impl FireParams {
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}
