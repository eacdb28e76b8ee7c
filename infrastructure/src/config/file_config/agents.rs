//! Agent catalog entries from TOML (`[[agents]]` and `[[directories]]`)

use relay_domain::{
    AgentDescriptor, AgentOrigin, ConfigIssue, ConfigIssueCode, DomainError,
};
use serde::{Deserialize, Serialize};

/// How a configured agent executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentKind {
    /// Chat completions through the `[provider]` endpoint.
    #[default]
    Llm,
    /// POST to the entry's own `endpoint`.
    Http,
}

/// One core or lazily loaded agent
///
/// ```toml
/// [[agents]]
/// name = "research"
/// description = "Finds and summarizes papers and articles"
/// command = "research"            # addressable as `/research ...`
/// capabilities = ["search", "papers"]
/// system_prompt = "You are a careful research assistant."
/// model = "gpt-4o-mini"           # overrides [provider].model
/// lazy = true                     # construct on first use
/// kind = "llm"                    # "llm" or "http"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentEntry {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub lazy: bool,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for FileAgentEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            command: None,
            capabilities: Vec::new(),
            system_prompt: None,
            model: None,
            lazy: false,
            kind: "llm".to_string(),
            endpoint: None,
        }
    }
}

impl FileAgentEntry {
    /// The built-in general-purpose agent used when no `[[agents]]` are
    /// configured.
    pub fn general() -> Self {
        Self {
            name: "general".to_string(),
            description: "General-purpose assistant for questions, writing and everyday tasks"
                .to_string(),
            capabilities: vec!["chat".to_string(), "writing".to_string()],
            ..Default::default()
        }
    }

    pub fn origin(&self) -> AgentOrigin {
        if self.lazy {
            AgentOrigin::LazilyLoaded
        } else {
            AgentOrigin::Core
        }
    }

    pub fn to_descriptor(&self) -> Result<AgentDescriptor, DomainError> {
        let descriptor = AgentDescriptor::new(&self.name, &self.description, self.origin())?
            .with_capabilities(self.capabilities.iter().cloned());
        Ok(match &self.command {
            Some(command) => descriptor.with_command(command),
            None => descriptor,
        })
    }

    /// Parse `kind`, falling back to `llm` with a warning.
    pub fn parse_kind(&self) -> (AgentKind, Vec<ConfigIssue>) {
        match self.kind.trim().to_lowercase().as_str() {
            "llm" => (AgentKind::Llm, vec![]),
            "http" => (AgentKind::Http, vec![]),
            other => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: format!("agents.{}.kind", self.name),
                        value: other.to_string(),
                        valid_values: vec!["llm".to_string(), "http".to_string()],
                    },
                    format!(
                        "agents.{}.kind: unknown value '{}', falling back to 'llm'",
                        self.name, self.kind
                    ),
                );
                (AgentKind::default(), vec![issue])
            }
        }
    }
}

/// Kind of an externally provided agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalKind {
    #[default]
    Tool,
    Peer,
}

impl ExternalKind {
    pub fn origin(&self) -> AgentOrigin {
        match self {
            ExternalKind::Tool => AgentOrigin::ExternalTool,
            ExternalKind::Peer => AgentOrigin::ExternalPeer,
        }
    }
}

/// One agent listed by an external directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExternalAgent {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub kind: ExternalKind,
    pub endpoint: String,
    /// Reported reachability; unreachable peers are hidden from callers.
    pub reachable: bool,
}

impl Default for FileExternalAgent {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            capabilities: Vec::new(),
            kind: ExternalKind::Tool,
            endpoint: String::new(),
            reachable: true,
        }
    }
}

impl FileExternalAgent {
    pub fn to_descriptor(&self) -> Result<AgentDescriptor, DomainError> {
        Ok(
            AgentDescriptor::new(&self.name, &self.description, self.kind.origin())?
                .with_capabilities(self.capabilities.iter().cloned()),
        )
    }
}

/// A per-identity directory of external tools and peer agents
///
/// ```toml
/// [[directories]]
/// id = "alice-tools"
/// identity = "alice"
///
/// [[directories.agents]]
/// name = "weather"
/// description = "Current weather and forecasts"
/// kind = "tool"
/// endpoint = "http://localhost:9100/invoke"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDirectoryConfig {
    pub id: String,
    /// Caller the listing is visible to.
    pub identity: String,
    pub agents: Vec<FileExternalAgent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_flag_selects_origin() {
        let entry = FileAgentEntry {
            name: "research".to_string(),
            description: "papers".to_string(),
            lazy: true,
            command: Some("/research".to_string()),
            ..Default::default()
        };
        let descriptor = entry.to_descriptor().unwrap();
        assert_eq!(descriptor.origin, AgentOrigin::LazilyLoaded);
        assert_eq!(descriptor.command.as_deref(), Some("research"));
    }

    #[test]
    fn empty_description_is_rejected() {
        let entry = FileAgentEntry {
            name: "mute".to_string(),
            ..Default::default()
        };
        assert!(entry.to_descriptor().is_err());
    }

    #[test]
    fn unknown_kind_warns() {
        let entry = FileAgentEntry {
            name: "x".to_string(),
            kind: "grpc".to_string(),
            ..Default::default()
        };
        let (kind, issues) = entry.parse_kind();
        assert_eq!(kind, AgentKind::Llm);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn directory_entries_deserialize() {
        let toml_str = r#"
id = "alice-tools"
identity = "alice"

[[agents]]
name = "weather"
description = "Forecasts"
endpoint = "http://localhost:9100"

[[agents]]
name = "bob-bot"
description = "Bob's assistant"
kind = "peer"
endpoint = "http://localhost:9200"
reachable = false
"#;
        let config: FileDirectoryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].kind, ExternalKind::Tool);
        assert!(config.agents[0].reachable);
        assert_eq!(
            config.agents[1].to_descriptor().unwrap().origin,
            AgentOrigin::ExternalPeer
        );
        assert!(!config.agents[1].reachable);
    }
}
