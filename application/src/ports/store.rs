//! Persistence ports
//!
//! Job schedules, novelty batches, delivered exchanges and similarity
//! lookups. Implementations decide durability; the use cases only require
//! that a successful write is visible to the next read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_domain::{
    ExchangeRecord, Identity, JobId, NoveltyBatch, RecurrenceSpec, RecurringJob, SimilarityWitness,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_job(&self, id: &JobId) -> Result<Option<RecurringJob>, StoreError>;

    async fn list_jobs(&self) -> Result<Vec<RecurringJob>, StoreError>;

    async fn put_job(&self, job: RecurringJob) -> Result<(), StoreError>;

    /// Active jobs whose next fire is at or before `now`.
    async fn due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<RecurringJob>, StoreError>;

    /// Persist schedule fields (run count, next fire, active flag).
    async fn save_schedule(&self, id: &JobId, schedule: &RecurrenceSpec) -> Result<(), StoreError>;
}

/// Novelty batches, at most one per job.
#[async_trait]
pub trait BatchStore: Send + Sync {
    async fn get_batch(&self, job: &JobId) -> Result<Option<NoveltyBatch>, StoreError>;

    /// Insert or replace the job's batch.
    async fn put_batch(&self, job: &JobId, batch: &NoveltyBatch) -> Result<(), StoreError>;

    async fn delete_batch(&self, job: &JobId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_exchange(&self, record: ExchangeRecord) -> Result<(), StoreError>;
}

/// Query for prior exchanges resembling a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityQuery {
    pub identity: Identity,
    pub prompt: String,
    /// Skip exchanges recorded for this job.
    pub exclude_job: Option<JobId>,
    /// Skip exchanges older than this.
    pub since: Option<DateTime<Utc>>,
    pub threshold: f32,
    pub limit: usize,
}

#[async_trait]
pub trait SimilaritySource: Send + Sync {
    /// Most similar first, each scoring at least `query.threshold`.
    async fn similar_to(&self, query: &SimilarityQuery) -> Result<Vec<SimilarityWitness>, StoreError>;
}
