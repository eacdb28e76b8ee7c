//! Prompts and response schema for the classification call.

use crate::agent::descriptor::AgentDescriptor;
use serde_json::{Value, json};

/// Templates for the agent-selection classifier.
pub struct SelectionPromptTemplate;

impl SelectionPromptTemplate {
    /// System prompt listing every candidate.
    pub fn system(candidates: &[AgentDescriptor], default_agent: &str, prefer_specialized: bool) -> String {
        let listing = candidates
            .iter()
            .map(|c| format!("- {}", c.summary_line()))
            .collect::<Vec<_>>()
            .join("\n");

        let tie_break = if prefer_specialized {
            format!(
                "\nWhen a specialized agent and the general-purpose agent '{}' match comparably, prefer the specialized agent.",
                default_agent
            )
        } else {
            String::new()
        };

        format!(
            r#"You route user requests to exactly one agent.

## Candidate Agents

{listing}

## Rules

- Choose the single agent whose description best fits the request.
- Answer with the agent's exact name from the list above.
- If no agent fits, set "agent" to null and explain why.{tie_break}

Respond with a JSON object: {{"agent": "<name or null>", "rationale": "<one sentence>"}}"#
        )
    }

    pub fn user(task: &str) -> String {
        format!("Request:\n{}", task)
    }
}

/// JSON schema constraining the classifier to one candidate name or null.
pub fn classification_schema(names: &[String]) -> Value {
    let mut allowed: Vec<Value> = names.iter().map(|n| Value::String(n.clone())).collect();
    allowed.push(Value::Null);
    json!({
        "type": "object",
        "properties": {
            "agent": {
                "type": ["string", "null"],
                "enum": allowed,
            },
            "rationale": { "type": "string" }
        },
        "required": ["agent", "rationale"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::descriptor::AgentOrigin;

    fn candidates() -> Vec<AgentDescriptor> {
        vec![
            AgentDescriptor::new("general", "General assistant", AgentOrigin::Core).unwrap(),
            AgentDescriptor::new("crypto", "Token prices and on-chain data", AgentOrigin::LazilyLoaded)
                .unwrap(),
        ]
    }

    #[test]
    fn system_prompt_lists_candidates_and_tie_break() {
        let prompt = SelectionPromptTemplate::system(&candidates(), "general", true);
        assert!(prompt.contains("general: General assistant"));
        assert!(prompt.contains("crypto: Token prices"));
        assert!(prompt.contains("prefer the specialized agent"));

        let no_hint = SelectionPromptTemplate::system(&candidates(), "general", false);
        assert!(!no_hint.contains("prefer the specialized agent"));
    }

    #[test]
    fn schema_enumerates_names_and_null() {
        let schema = classification_schema(&["general".to_string(), "crypto".to_string()]);
        let allowed = schema["properties"]["agent"]["enum"].as_array().unwrap();
        assert_eq!(allowed.len(), 3);
        assert!(allowed.contains(&Value::Null));
        assert!(allowed.contains(&json!("crypto")));
    }
}
