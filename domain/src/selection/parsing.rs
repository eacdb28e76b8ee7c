//! Parsing of classifier output.

use crate::selection::entities::Classification;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationParseError {
    #[error("classifier output is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("classifier named '{0}', which is not a candidate")]
    NotACandidate(String),
}

#[derive(Deserialize)]
struct RawClassification {
    agent: Option<String>,
    #[serde(default)]
    rationale: String,
}

/// Parse `{"agent": <name|null>, "rationale": "..."}` and check the name
/// against `candidates`.
///
/// Accepts the object bare or inside a fenced ` ```json ` block.
pub fn parse_classification(
    text: &str,
    candidates: &[String],
) -> Result<Classification, ClassificationParseError> {
    let body = strip_fence(text.trim());
    let raw: RawClassification = serde_json::from_str(body)
        .map_err(|e| ClassificationParseError::InvalidJson(e.to_string()))?;

    let rationale = raw.rationale.trim().to_string();
    match raw.agent.map(|a| a.trim().to_string()) {
        None => Ok(Classification::Declined { rationale }),
        Some(agent) if agent.is_empty() => Ok(Classification::Declined { rationale }),
        Some(agent) => {
            if candidates.iter().any(|c| c == &agent) {
                Ok(Classification::Chosen { agent, rationale })
            } else {
                Err(ClassificationParseError::NotACandidate(agent))
            }
        }
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["general".to_string(), "research".to_string()]
    }

    #[test]
    fn chosen_candidate() {
        let result =
            parse_classification(r#"{"agent":"research","rationale":"needs search"}"#, &names()).unwrap();
        assert_eq!(
            result,
            Classification::Chosen {
                agent: "research".to_string(),
                rationale: "needs search".to_string()
            }
        );
    }

    #[test]
    fn null_is_declined() {
        let result = parse_classification(r#"{"agent":null,"rationale":"nothing fits"}"#, &names()).unwrap();
        assert!(matches!(result, Classification::Declined { .. }));
    }

    #[test]
    fn fenced_output_is_accepted() {
        let text = "```json\n{\"agent\":\"general\",\"rationale\":\"chat\"}\n```";
        assert!(matches!(
            parse_classification(text, &names()),
            Ok(Classification::Chosen { .. })
        ));
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            parse_classification(r#"{"agent":"weather","rationale":""}"#, &names()),
            Err(ClassificationParseError::NotACandidate("weather".to_string()))
        );
    }

    #[test]
    fn garbage_is_invalid_json() {
        assert!(matches!(
            parse_classification("I pick research", &names()),
            Err(ClassificationParseError::InvalidJson(_))
        ));
    }
}
