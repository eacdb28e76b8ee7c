//! Prompt augmentation for recurring jobs.

use crate::job::JobId;
use crate::util::truncate_str;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prior (prompt, response) pair judged similar to the current task.
///
/// Supplied by the similarity collaborator; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWitness {
    pub prompt: String,
    pub response: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub created_at: DateTime<Utc>,
}

/// Longest prior response quoted in an anti-repetition directive.
const MAX_QUOTED_BYTES: usize = 1_500;

/// Instruction asking the agent to answer with one current item plus
/// `future_count` items for later fires.
pub fn batch_generation_instruction(future_count: usize) -> String {
    format!(
        "This request repeats on a schedule. Produce {total} distinct variations now so later runs can reuse them.\n\
         Respond with ONLY a JSON object of this exact shape:\n\
         ```json\n\
         {{\"current_item\": \"<the answer to deliver now>\", \"future_items\": [\"<variation 1>\", \"...\", \"<variation {future_count}>\"], \"item_type\": \"<short type label, e.g. joke>\"}}\n\
         ```\n\
         `future_items` must contain exactly {future_count} entries. Every entry must differ from the others and from `current_item` in subject and structure.",
        total = future_count + 1,
    )
}

/// Directive quoting prior responses verbatim and forbidding overlap with
/// them. `None` when there is nothing to avoid.
pub fn anti_repetition_directive(witnesses: &[SimilarityWitness]) -> Option<String> {
    if witnesses.is_empty() {
        return None;
    }

    let mut out = String::from(
        "IMPORTANT: this request has been answered before. The previous responses are quoted below. \
         Your answer MUST NOT repeat, paraphrase, or reuse the topic, structure, punchline, or wording of any of them.\n",
    );
    for (i, witness) in witnesses.iter().enumerate() {
        let quoted = truncate_str(witness.response.trim(), MAX_QUOTED_BYTES);
        out.push_str(&format!("\nPrevious response {}:\n\"\"\"\n{}\n\"\"\"\n", i + 1, quoted));
    }
    out.push_str("\nProduce something entirely new.");
    Some(out)
}

/// Append directives to the base task, separated by blank lines.
pub fn augment_prompt(base: &str, directives: &[String]) -> String {
    let mut prompt = base.trim_end().to_string();
    for directive in directives.iter().filter(|d| !d.trim().is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(directive.trim());
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn witness(response: &str) -> SimilarityWitness {
        SimilarityWitness {
            prompt: "tell me a joke".to_string(),
            response: response.to_string(),
            score: 0.8,
            job_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn batch_instruction_names_shape_and_count() {
        let text = batch_generation_instruction(10);
        assert!(text.contains("current_item"));
        assert!(text.contains("future_items"));
        assert!(text.contains("item_type"));
        assert!(text.contains("exactly 10 entries"));
        assert!(text.contains("11 distinct"));
    }

    #[test]
    fn directive_quotes_responses_verbatim() {
        let directive = anti_repetition_directive(&[
            witness("Why did the chicken cross the road?"),
            witness("Knock knock."),
        ])
        .unwrap();
        assert!(directive.contains("Why did the chicken cross the road?"));
        assert!(directive.contains("Knock knock."));
        assert!(directive.contains("Previous response 2"));
        assert!(directive.contains("MUST NOT"));
    }

    #[test]
    fn no_witnesses_no_directive() {
        assert!(anti_repetition_directive(&[]).is_none());
    }

    #[test]
    fn augment_appends_non_empty_directives() {
        let prompt = augment_prompt("Tell me a joke", &["Be new.".to_string(), "  ".to_string()]);
        assert_eq!(prompt, "Tell me a joke\n\nBe new.");
    }
}
