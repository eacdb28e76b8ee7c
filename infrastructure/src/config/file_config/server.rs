//! HTTP surface and transcript settings (`[server]`, `[logging]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ```toml
/// [server]
/// bind = "127.0.0.1:8787"
/// keep_alive_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub bind: String,
    /// SSE keep-alive comment period.
    pub keep_alive_secs: u64,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            keep_alive_secs: 30,
        }
    }
}

/// ```toml
/// [logging]
/// conversation_log = "~/.local/share/agent-relay/transcript.jsonl"
/// ```
///
/// No path disables the transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_log: Option<String>,
}

impl FileLoggingConfig {
    /// Transcript path with a leading `~/` expanded.
    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        let raw = self.conversation_log.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_path_disables_transcript() {
        let config = FileLoggingConfig {
            conversation_log: Some(" ".to_string()),
        };
        assert_eq!(config.conversation_log_path(), None);
        assert_eq!(FileLoggingConfig::default().conversation_log_path(), None);
    }

    #[test]
    fn absolute_path_is_kept() {
        let config = FileLoggingConfig {
            conversation_log: Some("/tmp/relay.jsonl".to_string()),
        };
        assert_eq!(
            config.conversation_log_path(),
            Some(PathBuf::from("/tmp/relay.jsonl"))
        );
    }
}
