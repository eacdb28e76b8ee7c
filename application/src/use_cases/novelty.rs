//! Novelty pipeline for recurring-job fires.
//!
//! At fire time, [`prepare`](NoveltyPipeline::prepare) decides between:
//!
//! - **Serve**: a live batch has items left; hand out the next one without
//!   running any agent. The advanced cursor is persisted by
//!   [`commit_serve`](NoveltyPipeline::commit_serve) once the fire is counted.
//! - **Dispatch**: no usable batch. The prompt is augmented with an
//!   anti-repetition directive (when similar prior exchanges exist) and, for
//!   repeatable-content tasks, a batch-generation instruction.
//!
//! After a dispatch, [`reconcile`](NoveltyPipeline::reconcile) extracts the
//! batch payload, persists the future items, and returns the text to
//! deliver. A payload that does not parse is delivered verbatim.

use crate::config::NoveltyParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::store::{BatchStore, SimilarityQuery, SimilaritySource, StoreError};
use chrono::{DateTime, Utc};
use relay_domain::{
    NoveltyBatch, RecurringJob, RepeatableContentPolicy, ServedItem, SimilarityWitness,
    anti_repetition_directive, augment_prompt, batch_generation_instruction, parse_batch_payload,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How to produce this fire's result.
#[derive(Debug, Clone, PartialEq)]
pub enum NoveltyPlan {
    Serve(ServePlan),
    Dispatch(DispatchPlan),
}

/// Next batch item plus the batch with its cursor already advanced.
#[derive(Debug, Clone, PartialEq)]
pub struct ServePlan {
    pub served: ServedItem,
    batch: NoveltyBatch,
}

/// Augmented prompt for a fire that goes through an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    pub prompt: String,
    /// The prompt asks for a batch payload.
    pub expects_batch: bool,
    /// Prior exchanges quoted in the prompt.
    pub witnesses: Vec<SimilarityWitness>,
}

pub struct NoveltyPipeline {
    batches: Arc<dyn BatchStore>,
    similarity: Arc<dyn SimilaritySource>,
    policy: RepeatableContentPolicy,
    params: NoveltyParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl NoveltyPipeline {
    pub fn new(
        batches: Arc<dyn BatchStore>,
        similarity: Arc<dyn SimilaritySource>,
        policy: RepeatableContentPolicy,
        params: NoveltyParams,
    ) -> Self {
        Self {
            batches,
            similarity,
            policy,
            params,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Decide how the fire at `now` produces its result.
    ///
    /// Must run under the job's fire lock. A served item is staged only;
    /// nothing is written until [`commit_serve`](Self::commit_serve).
    pub async fn prepare(&self, job: &RecurringJob, now: DateTime<Utc>) -> Result<NoveltyPlan, StoreError> {
        let stored = self.batches.get_batch(&job.id).await?;
        let had_batch = stored.is_some();

        if let Some(mut batch) = stored {
            if let Some(served) = batch.take_next(now) {
                return Ok(NoveltyPlan::Serve(ServePlan { served, batch }));
            }
            debug!(job_id = %job.id, "Novelty batch exhausted");
        }

        let witnesses = if job.is_first_fire() && !had_batch {
            Vec::new()
        } else {
            self.witnesses(job, now).await
        };

        let mut directives = Vec::new();
        if let Some(directive) = anti_repetition_directive(&witnesses) {
            debug!(job_id = %job.id, count = witnesses.len(), "Injecting anti-repetition directive");
            directives.push(directive);
        }

        let expects_batch = self.params.batch_size > 0 && self.policy.matches(&job.prompt);
        if expects_batch {
            directives.push(batch_generation_instruction(self.params.batch_size));
        }

        Ok(NoveltyPlan::Dispatch(DispatchPlan {
            prompt: augment_prompt(&job.prompt, &directives),
            expects_batch,
            witnesses,
        }))
    }

    /// Persist the advanced cursor of a served item.
    pub async fn commit_serve(&self, job: &RecurringJob, plan: &ServePlan) -> Result<(), StoreError> {
        self.batches.put_batch(&job.id, &plan.batch).await?;
        info!(job_id = %job.id, remaining = plan.served.remaining, "Served item from novelty batch");
        self.conversation_logger.log(ConversationEvent::new(
            "batch_served",
            serde_json::json!({
                "job_id": job.id,
                "cursor": plan.batch.cursor,
                "remaining": plan.served.remaining,
                "item_type": plan.served.item_type,
            }),
        ));
        Ok(())
    }

    async fn witnesses(&self, job: &RecurringJob, now: DateTime<Utc>) -> Vec<SimilarityWitness> {
        let since = self
            .params
            .similarity_window
            .and_then(|window| chrono::Duration::from_std(window).ok())
            .and_then(|window| now.checked_sub_signed(window));

        let query = SimilarityQuery {
            identity: job.owner.clone(),
            prompt: job.prompt.clone(),
            exclude_job: None,
            since,
            threshold: self.params.similarity_threshold,
            limit: self.params.similarity_limit,
        };

        match self.similarity.similar_to(&query).await {
            Ok(found) => found
                .into_iter()
                .filter(|w| w.score >= self.params.similarity_threshold)
                .take(self.params.similarity_limit)
                .collect(),
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Similarity lookup failed; dispatching without directive");
                Vec::new()
            }
        }
    }

    /// Turn the agent's final text into the delivered result, storing a new
    /// batch when the text carries one.
    pub async fn reconcile(
        &self,
        job: &RecurringJob,
        plan: &DispatchPlan,
        final_text: &str,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        if !plan.expects_batch {
            return Ok(final_text.to_string());
        }

        let payload = match parse_batch_payload(final_text) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Batch payload not recognized; delivering raw text");
                return Ok(final_text.to_string());
            }
        };

        if payload.future_items.is_empty() {
            self.batches.delete_batch(&job.id).await?;
            debug!(job_id = %job.id, "Batch payload had no future items");
            return Ok(payload.current_item);
        }

        let batch = NoveltyBatch::new(payload.future_items, payload.item_type, now);
        self.batches.put_batch(&job.id, &batch).await?;
        info!(job_id = %job.id, items = batch.items.len(), item_type = %batch.item_type, "Stored novelty batch");
        self.conversation_logger.log(ConversationEvent::new(
            "batch_created",
            serde_json::json!({
                "job_id": job.id,
                "items": batch.items.len(),
                "item_type": batch.item_type,
            }),
        ));

        Ok(payload.current_item)
    }
}
