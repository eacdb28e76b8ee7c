//! Agent descriptors: the catalog's view of an executable agent.
//!
//! A descriptor is everything selection needs to know about an agent without
//! constructing it: name, description, capability tags, where it came from,
//! and whether it can currently run.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an agent comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentOrigin {
    /// Constructed eagerly at process start.
    Core,
    /// Constructed on first successful resolution.
    LazilyLoaded,
    /// Discovered per caller from an external tool provider.
    ExternalTool,
    /// Discovered per caller from an external peer-agent provider.
    ExternalPeer,
}

impl AgentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentOrigin::Core => "core",
            AgentOrigin::LazilyLoaded => "lazily-loaded",
            AgentOrigin::ExternalTool => "external-tool",
            AgentOrigin::ExternalPeer => "external-peer",
        }
    }

    /// External origins are scoped to a caller identity.
    pub fn is_external(&self) -> bool {
        matches!(self, AgentOrigin::ExternalTool | AgentOrigin::ExternalPeer)
    }
}

impl fmt::Display for AgentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime availability of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Available,
    Degraded,
    Unavailable,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Available => f.write_str("available"),
            AgentStatus::Degraded => f.write_str("degraded"),
            AgentStatus::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Describes one executable agent (Value Object).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique name within a catalog view.
    pub name: String,
    /// Natural-language description the selector classifies against.
    pub description: String,
    /// Capability tags (e.g. "search", "crypto", "images").
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub origin: AgentOrigin,
    #[serde(default)]
    pub status: AgentStatus,
    /// Slash command addressing this agent directly (`/research ...`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl AgentDescriptor {
    /// Create a descriptor, rejecting empty names and descriptions.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        origin: AgentOrigin,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        let description = description.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::EmptyAgentName);
        }
        if description.is_empty() {
            return Err(DomainError::MissingDescription(name));
        }
        Ok(Self {
            name,
            description,
            capabilities: Vec::new(),
            origin,
            status: AgentStatus::Available,
            command: None,
        })
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        let command = command.into();
        let command = command.trim_start_matches('/').trim();
        self.command = (!command.is_empty()).then(|| command.to_string());
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the selector may offer this agent as a candidate.
    pub fn is_selectable(&self) -> bool {
        self.status != AgentStatus::Unavailable
    }

    /// One-line summary used in selection prompts and listings.
    pub fn summary_line(&self) -> String {
        let mut line = format!("{}: {}", self.name, self.description);
        if !self.capabilities.is_empty() {
            line.push_str(&format!(" [{}]", self.capabilities.join(", ")));
        }
        line.push_str(&format!(" ({})", self.origin));
        if self.status == AgentStatus::Degraded {
            line.push_str(" (degraded)");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_description() {
        let err = AgentDescriptor::new("research", "   ", AgentOrigin::Core).unwrap_err();
        assert_eq!(err, DomainError::MissingDescription("research".to_string()));
    }

    #[test]
    fn new_rejects_empty_name() {
        let err = AgentDescriptor::new("", "does things", AgentOrigin::Core).unwrap_err();
        assert_eq!(err, DomainError::EmptyAgentName);
    }

    #[test]
    fn with_command_strips_leading_slash() {
        let d = AgentDescriptor::new("research", "web research", AgentOrigin::Core)
            .unwrap()
            .with_command("/research");
        assert_eq!(d.command.as_deref(), Some("research"));

        let d = d.with_command("/");
        assert!(d.command.is_none());
    }

    #[test]
    fn unavailable_is_not_selectable() {
        let d = AgentDescriptor::new("peer", "remote peer", AgentOrigin::ExternalPeer)
            .unwrap()
            .with_status(AgentStatus::Unavailable);
        assert!(!d.is_selectable());
        assert!(d.origin.is_external());
    }

    #[test]
    fn summary_line_lists_tags_and_origin() {
        let d = AgentDescriptor::new("crypto_data", "Token prices", AgentOrigin::LazilyLoaded)
            .unwrap()
            .with_capabilities(["crypto", "prices"]);
        assert_eq!(
            d.summary_line(),
            "crypto_data: Token prices [crypto, prices] (lazily-loaded)"
        );
    }

    #[test]
    fn origin_serializes_kebab_case() {
        let json = serde_json::to_string(&AgentOrigin::ExternalPeer).unwrap();
        assert_eq!(json, "\"external-peer\"");
    }
}
