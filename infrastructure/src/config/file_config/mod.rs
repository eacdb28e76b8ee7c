//! Raw TOML configuration data types
//!
//! These structs mirror the config file exactly. They are deserialized
//! directly, validated into [`ConfigIssue`]s, and converted into the
//! application's parameter types.

mod agents;
mod jobs;
mod provider;
mod runtime;
mod server;

pub use agents::{AgentKind, ExternalKind, FileAgentEntry, FileDirectoryConfig, FileExternalAgent};
pub use jobs::FileJobConfig;
pub use provider::FileProviderConfig;
pub use runtime::{
    ClassifierKind, FileCatalogConfig, FileDispatchConfig, FileNoveltyConfig,
    FileSchedulerConfig, FileSelectionConfig,
};
pub use server::{FileLoggingConfig, FileServerConfig};

use chrono::Utc;
use relay_application::RelayConfig;
use relay_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub dispatch: FileDispatchConfig,
    pub selection: FileSelectionConfig,
    pub catalog: FileCatalogConfig,
    pub novelty: FileNoveltyConfig,
    pub scheduler: FileSchedulerConfig,
    pub provider: FileProviderConfig,
    /// Core and lazily loaded agents
    pub agents: Vec<FileAgentEntry>,
    /// Per-identity external agent listings
    pub directories: Vec<FileDirectoryConfig>,
    /// Recurring jobs seeded at startup
    pub jobs: Vec<FileJobConfig>,
    pub server: FileServerConfig,
    pub logging: FileLoggingConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            dispatch: FileDispatchConfig::default(),
            selection: FileSelectionConfig::default(),
            catalog: FileCatalogConfig::default(),
            novelty: FileNoveltyConfig::default(),
            scheduler: FileSchedulerConfig::default(),
            provider: FileProviderConfig::default(),
            agents: vec![FileAgentEntry::general()],
            directories: Vec::new(),
            jobs: Vec::new(),
            server: FileServerConfig::default(),
            logging: FileLoggingConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks, in order:
    /// 1. Agent entries: descriptions, duplicate names, kinds, endpoints
    /// 2. The default agent is one of the configured agents
    /// 3. Selector classifier kind
    /// 4. Repeatable-content patterns compile
    /// 5. Directory entries
    /// 6. Job schedules
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Agents
        let mut seen = HashSet::new();
        for entry in &self.agents {
            let name = entry.name.trim();
            if entry.description.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::MissingDescription {
                        agent: name.to_string(),
                    },
                    format!("agents.{}: description must not be empty", name),
                ));
            }
            if !seen.insert(name.to_string()) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::DuplicateAgent {
                        agent: name.to_string(),
                    },
                    format!("agents.{}: defined more than once; the last entry wins", name),
                ));
            }
            let (kind, kind_issues) = entry.parse_kind();
            issues.extend(kind_issues);
            if kind == AgentKind::Http && entry.endpoint.as_deref().is_none_or(|e| e.trim().is_empty()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::MissingField {
                        entry: format!("agents.{}", name),
                        field: "endpoint".to_string(),
                    },
                    format!("agents.{}: kind 'http' requires an endpoint", name),
                ));
            }
        }

        // 2. Default agent
        let default_agent = self.selection.default_agent.trim();
        if !seen.contains(default_agent) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownDefaultAgent {
                    agent: default_agent.to_string(),
                },
                format!(
                    "selection.default_agent: '{}' is not a configured agent",
                    default_agent
                ),
            ));
        }

        // 3. Classifier
        issues.extend(self.selection.parse_classifier().1);

        // 4. Patterns
        issues.extend(self.novelty.parse_policy().1);

        // 5. Directories
        for directory in &self.directories {
            for agent in &directory.agents {
                let entry = format!("directories.{}.{}", directory.id, agent.name);
                if agent.description.trim().is_empty() {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::MissingDescription {
                            agent: agent.name.clone(),
                        },
                        format!("{}: description must not be empty", entry),
                    ));
                }
                if agent.endpoint.trim().is_empty() {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::MissingField {
                            entry: entry.clone(),
                            field: "endpoint".to_string(),
                        },
                        format!("{}: endpoint must not be empty", entry),
                    ));
                }
            }
        }

        // 6. Jobs
        let now = Utc::now();
        for job in &self.jobs {
            if let Err(issue) = job.to_job(now) {
                issues.push(issue);
            }
        }

        issues
    }

    /// Whether any issue is fatal.
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(ConfigIssue::is_error)
    }

    /// Convert to the application's parameter container.
    pub fn to_relay_config(&self) -> RelayConfig {
        RelayConfig::new(
            self.catalog.to_params(),
            self.selection.to_params(),
            self.dispatch.to_params(),
            self.novelty.to_params(),
            self.scheduler.to_params(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[dispatch]
execution_timeout_secs = 60

[selection]
default_agent = "general"
classifier = "keyword"

[novelty]
batch_size = 5

[[agents]]
name = "general"
description = "Everyday questions"

[[agents]]
name = "research"
description = "Papers and articles"
command = "research"
lazy = true

[[jobs]]
id = "joke"
owner = "alice"
prompt = "Tell me a joke"
kind = "daily"
anchor = "2024-01-01T09:00:00Z"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert!(config.agents[1].lazy);
        assert_eq!(config.novelty.batch_size, 5);
        assert_eq!(config.jobs.len(), 1);
        assert!(config.validate().is_empty());

        let relay = config.to_relay_config();
        assert_eq!(
            relay.dispatch().execution_timeout,
            Some(Duration::from_secs(60))
        );
        assert_eq!(relay.novelty().batch_size, 5);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:9000"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        // Defaults should apply
        assert_eq!(config.agents, vec![FileAgentEntry::general()]);
        assert_eq!(config.selection.default_agent, "general");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_catalog_problems() {
        let mut config = FileConfig::default();
        config.selection.default_agent = "assistant".to_string();
        config.agents.push(FileAgentEntry {
            name: "general".to_string(),
            description: String::new(),
            ..Default::default()
        });
        config.agents.push(FileAgentEntry {
            name: "remote".to_string(),
            description: "Remote agent".to_string(),
            kind: "http".to_string(),
            ..Default::default()
        });

        let issues = config.validate();
        let has = |pred: fn(&ConfigIssueCode) -> bool| issues.iter().any(|i| pred(&i.code));
        assert!(has(|c| matches!(c, ConfigIssueCode::MissingDescription { .. })));
        assert!(has(|c| matches!(c, ConfigIssueCode::DuplicateAgent { .. })));
        assert!(has(|c| matches!(c, ConfigIssueCode::UnknownDefaultAgent { .. })));
        assert!(has(|c| matches!(c, ConfigIssueCode::MissingField { .. })));
        assert!(FileConfig::has_errors(&issues));
    }

    #[test]
    fn test_validate_reports_unschedulable_job() {
        let mut config = FileConfig::default();
        config.jobs.push(FileJobConfig {
            id: "every-few-days".to_string(),
            prompt: "Check in".to_string(),
            kind: "custom-interval-days".to_string(),
            ..Default::default()
        });
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::UnschedulableJob { .. }
        ));
    }

    #[test]
    fn test_invalid_pattern_is_a_warning() {
        let mut config = FileConfig::default();
        config.novelty.repeatable_patterns = Some(vec!["[".to_string()]);
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(!FileConfig::has_errors(&issues));
    }
}
