//! Token usage reported by the execution substrate.

use serde::{Deserialize, Serialize};

/// Token counts for one execution. Every field is optional: substrates
/// report different subsets and missing counts are omitted, never zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl Usage {
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none() && self.completion_tokens.is_none() && self.total_tokens.is_none()
    }

    /// Fill in `total_tokens` when only the parts are known.
    pub fn normalized(mut self) -> Self {
        if self.total_tokens.is_none()
            && let (Some(p), Some(c)) = (self.prompt_tokens, self.completion_tokens)
        {
            self.total_tokens = Some(p + c);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_omitted() {
        let usage = Usage {
            prompt_tokens: Some(12),
            ..Default::default()
        };
        let json = serde_json::to_string(&usage).unwrap();
        assert_eq!(json, r#"{"prompt_tokens":12}"#);
    }

    #[test]
    fn normalized_computes_total() {
        let usage = Usage {
            prompt_tokens: Some(10),
            completion_tokens: Some(5),
            total_tokens: None,
        }
        .normalized();
        assert_eq!(usage.total_tokens, Some(15));
        assert!(Usage::default().is_empty());
    }
}
