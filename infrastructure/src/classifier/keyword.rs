//! Deterministic keyword classifier.
//!
//! Scores each candidate by how many task keywords appear in its name,
//! description and capability tags. No network; used offline and in tests.

use async_trait::async_trait;
use relay_application::{AgentClassifier, ClassifierError};
use relay_domain::util::keyword_tokens;
use relay_domain::{AgentDescriptor, Classification};
use std::collections::BTreeSet;

pub struct KeywordClassifier {
    default_agent: String,
}

impl KeywordClassifier {
    pub fn new(default_agent: impl Into<String>) -> Self {
        Self {
            default_agent: default_agent.into(),
        }
    }

    fn vocabulary(candidate: &AgentDescriptor) -> BTreeSet<String> {
        let mut words = keyword_tokens(&candidate.name);
        words.extend(keyword_tokens(&candidate.description));
        for tag in &candidate.capabilities {
            words.extend(keyword_tokens(tag));
        }
        words
    }

    /// Best-scoring candidate and its matched keywords.
    ///
    /// Specialized agents beat the default agent on equal scores; among
    /// specialized agents the earlier candidate wins.
    fn best<'a>(
        &self,
        task: &BTreeSet<String>,
        candidates: &'a [AgentDescriptor],
    ) -> Option<(&'a AgentDescriptor, Vec<String>)> {
        let mut best: Option<(&AgentDescriptor, Vec<String>)> = None;
        for candidate in candidates {
            let matched: Vec<String> = Self::vocabulary(candidate)
                .intersection(task)
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }
            let better = match &best {
                None => true,
                Some((current, current_matched)) => {
                    matched.len() > current_matched.len()
                        || (matched.len() == current_matched.len()
                            && current.name == self.default_agent
                            && candidate.name != self.default_agent)
                }
            };
            if better {
                best = Some((candidate, matched));
            }
        }
        best
    }
}

#[async_trait]
impl AgentClassifier for KeywordClassifier {
    async fn classify(
        &self,
        task: &str,
        candidates: &[AgentDescriptor],
    ) -> Result<Classification, ClassifierError> {
        let tokens = keyword_tokens(task);
        Ok(match self.best(&tokens, candidates) {
            Some((agent, matched)) => Classification::Chosen {
                agent: agent.name.clone(),
                rationale: format!("matched keywords: {}", matched.join(", ")),
            },
            None => Classification::Declined {
                rationale: "no candidate shares keywords with the request".to_string(),
            },
        })
    }
}
