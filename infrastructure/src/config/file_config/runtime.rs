//! Runtime tuning from TOML (`[dispatch]`, `[selection]`, `[catalog]`,
//! `[novelty]` and `[scheduler]` sections)

use relay_application::{
    CatalogParams, DispatchParams, FireParams, NoveltyParams, SelectionParams,
};
use relay_domain::{ConfigIssue, ConfigIssueCode, RepeatableContentPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dispatcher settings
///
/// ```toml
/// [dispatch]
/// execution_timeout_secs = 180   # 0 disables the deadline
/// tool_summary_bytes = 500
/// channel_capacity = 64
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    pub execution_timeout_secs: u64,
    pub tool_summary_bytes: usize,
    pub channel_capacity: usize,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            execution_timeout_secs: 180,
            tool_summary_bytes: 500,
            channel_capacity: 64,
        }
    }
}

impl FileDispatchConfig {
    pub fn to_params(&self) -> DispatchParams {
        let timeout = (self.execution_timeout_secs > 0)
            .then(|| Duration::from_secs(self.execution_timeout_secs));
        DispatchParams::default()
            .with_execution_timeout(timeout)
            .with_tool_summary_bytes(self.tool_summary_bytes)
            .with_channel_capacity(self.channel_capacity)
    }
}

/// Which classifier backs agent selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    /// LLM-backed, through the configured provider.
    #[default]
    Llm,
    /// Deterministic token overlap; no provider needed.
    Keyword,
}

/// Selector settings
///
/// ```toml
/// [selection]
/// default_agent = "general"
/// classifier = "llm"          # "llm" or "keyword"
/// classifier_timeout_secs = 15
/// prefer_specialized = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSelectionConfig {
    pub default_agent: String,
    pub classifier: String,
    pub classifier_timeout_secs: u64,
    pub prefer_specialized: bool,
}

impl Default for FileSelectionConfig {
    fn default() -> Self {
        Self {
            default_agent: "general".to_string(),
            classifier: "llm".to_string(),
            classifier_timeout_secs: 15,
            prefer_specialized: true,
        }
    }
}

impl FileSelectionConfig {
    pub fn to_params(&self) -> SelectionParams {
        SelectionParams::default()
            .with_default_agent(self.default_agent.trim())
            .with_classifier_timeout(Duration::from_secs(self.classifier_timeout_secs))
            .with_prefer_specialized(self.prefer_specialized)
    }

    /// Parse `classifier`, falling back to `llm` with a warning.
    pub fn parse_classifier(&self) -> (ClassifierKind, Vec<ConfigIssue>) {
        match self.classifier.trim().to_lowercase().as_str() {
            "llm" => (ClassifierKind::Llm, vec![]),
            "keyword" | "keywords" => (ClassifierKind::Keyword, vec![]),
            other => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "selection.classifier".to_string(),
                        value: other.to_string(),
                        valid_values: vec!["llm".to_string(), "keyword".to_string()],
                    },
                    format!(
                        "selection.classifier: unknown value '{}', falling back to 'llm'",
                        self.classifier
                    ),
                );
                (ClassifierKind::default(), vec![issue])
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCatalogConfig {
    pub factory_timeout_secs: u64,
}

impl Default for FileCatalogConfig {
    fn default() -> Self {
        Self {
            factory_timeout_secs: 30,
        }
    }
}

impl FileCatalogConfig {
    pub fn to_params(&self) -> CatalogParams {
        CatalogParams::default().with_factory_timeout(Duration::from_secs(self.factory_timeout_secs))
    }
}

/// Novelty settings for recurring jobs
///
/// ```toml
/// [novelty]
/// batch_size = 10
/// similarity_threshold = 0.35
/// similarity_limit = 5
/// similarity_window_days = 30     # 0 searches all history
/// repeatable_patterns = ['\bjokes?\b', '\bquotes?\b']
/// ```
///
/// Omitting `repeatable_patterns` keeps the built-in list; an empty list
/// disables batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNoveltyConfig {
    pub batch_size: usize,
    pub similarity_threshold: f32,
    pub similarity_limit: usize,
    pub similarity_window_days: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeatable_patterns: Option<Vec<String>>,
}

impl Default for FileNoveltyConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            similarity_threshold: 0.35,
            similarity_limit: 5,
            similarity_window_days: 30,
            repeatable_patterns: None,
        }
    }
}

impl FileNoveltyConfig {
    pub fn to_params(&self) -> NoveltyParams {
        let window = (self.similarity_window_days > 0)
            .then(|| Duration::from_secs(self.similarity_window_days * 24 * 60 * 60));
        let params = NoveltyParams::default()
            .with_batch_size(self.batch_size)
            .with_similarity_threshold(self.similarity_threshold)
            .with_similarity_limit(self.similarity_limit)
            .with_similarity_window(window);
        match &self.repeatable_patterns {
            Some(patterns) => params.with_repeatable_patterns(patterns.clone()),
            None => params,
        }
    }

    /// Compile the repeatable-content policy.
    ///
    /// Invalid patterns are reported and skipped; the rest still apply.
    pub fn parse_policy(&self) -> (RepeatableContentPolicy, Vec<ConfigIssue>) {
        let Some(patterns) = &self.repeatable_patterns else {
            return (RepeatableContentPolicy::default(), vec![]);
        };

        let mut issues = Vec::new();
        let mut valid = Vec::new();
        for pattern in patterns {
            match RepeatableContentPolicy::from_patterns([pattern.as_str()]) {
                Ok(_) => valid.push(pattern.as_str()),
                Err((pattern, e)) => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidPattern {
                        pattern: pattern.clone(),
                    },
                    format!("novelty.repeatable_patterns: '{}' ignored: {}", pattern, e),
                )),
            }
        }

        let policy = RepeatableContentPolicy::from_patterns(valid)
            .unwrap_or_else(|_| RepeatableContentPolicy::disabled());
        (policy, issues)
    }
}

/// Recurring-job driver settings
///
/// ```toml
/// [scheduler]
/// poll_interval_secs = 60
/// retry_backoff_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchedulerConfig {
    pub poll_interval_secs: u64,
    pub retry_backoff_secs: u64,
}

impl Default for FileSchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            retry_backoff_secs: 300,
        }
    }
}

impl FileSchedulerConfig {
    pub fn to_params(&self) -> FireParams {
        FireParams::default().with_retry_backoff(Duration::from_secs(self.retry_backoff_secs))
    }

    /// Poll period, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_execution_timeout_disables_deadline() {
        let config = FileDispatchConfig {
            execution_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.to_params().execution_timeout, None);
        assert_eq!(
            FileDispatchConfig::default().to_params().execution_timeout,
            Some(Duration::from_secs(180))
        );
    }

    #[test]
    fn classifier_kind_parses_and_falls_back() {
        let mut config = FileSelectionConfig {
            classifier: "Keyword".to_string(),
            ..Default::default()
        };
        let (kind, issues) = config.parse_classifier();
        assert_eq!(kind, ClassifierKind::Keyword);
        assert!(issues.is_empty());

        config.classifier = "oracle".to_string();
        let (kind, issues) = config.parse_classifier();
        assert_eq!(kind, ClassifierKind::Llm);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn omitted_patterns_keep_defaults() {
        let (policy, issues) = FileNoveltyConfig::default().parse_policy();
        assert!(issues.is_empty());
        assert!(policy.matches("tell me a joke"));
    }

    #[test]
    fn empty_patterns_disable_batching() {
        let config = FileNoveltyConfig {
            repeatable_patterns: Some(vec![]),
            ..Default::default()
        };
        let (policy, _) = config.parse_policy();
        assert!(policy.is_empty());
        assert!(config.to_params().repeatable_patterns.is_empty());
    }

    #[test]
    fn invalid_pattern_is_reported_and_skipped() {
        let config = FileNoveltyConfig {
            repeatable_patterns: Some(vec!["(unclosed".to_string(), r"\bhaiku\b".to_string()]),
            ..Default::default()
        };
        let (policy, issues) = config.parse_policy();
        assert_eq!(policy.len(), 1);
        assert!(policy.matches("write a haiku"));
        assert!(matches!(
            &issues[0].code,
            ConfigIssueCode::InvalidPattern { pattern } if pattern == "(unclosed"
        ));
    }

    #[test]
    fn scheduler_interval_has_floor() {
        let config = FileSchedulerConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(
            config.to_params().retry_backoff,
            Duration::from_secs(300)
        );
    }
}
