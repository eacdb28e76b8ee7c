//! In-process reference store.
//!
//! Implements every persistence port over `RwLock`-guarded maps. Nothing
//! survives a restart; jobs are re-seeded from config at startup.
//!
//! Similarity is token-set Jaccard between the query prompt and each stored
//! exchange's prompt, restricted to the caller's identity and the query's
//! recency window.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_application::{
    BatchStore, HistoryStore, JobStore, SimilarityQuery, SimilaritySource, StoreError,
};
use relay_domain::util::{jaccard, keyword_tokens};
use relay_domain::{
    ExchangeRecord, Identity, JobId, NoveltyBatch, RecurrenceSpec, RecurringJob, SimilarityWitness,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

const DEFAULT_HISTORY_LIMIT: usize = 500;

pub struct InMemoryStore {
    jobs: RwLock<BTreeMap<JobId, RecurringJob>>,
    batches: RwLock<HashMap<JobId, NoveltyBatch>>,
    history: RwLock<HashMap<Identity, VecDeque<ExchangeRecord>>>,
    history_limit: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(BTreeMap::new()),
            batches: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Exchanges kept per identity; the oldest are dropped first.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Delivered exchanges for `identity`, oldest first.
    pub fn history_for(&self, identity: &Identity) -> Vec<ExchangeRecord> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn get_job(&self, id: &JobId) -> Result<Option<RecurringJob>, StoreError> {
        Ok(self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<RecurringJob>, StoreError> {
        Ok(self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    async fn put_job(&self, job: RecurringJob) -> Result<(), StoreError> {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.id.clone(), job);
        Ok(())
    }

    async fn due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<RecurringJob>, StoreError> {
        let mut due: Vec<RecurringJob> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|job| job.schedule.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|job| job.schedule.next_fire);
        Ok(due)
    }

    async fn save_schedule(&self, id: &JobId, schedule: &RecurrenceSpec) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("job '{}'", id)))?;
        job.schedule = schedule.clone();
        Ok(())
    }
}

#[async_trait]
impl BatchStore for InMemoryStore {
    async fn get_batch(&self, job: &JobId) -> Result<Option<NoveltyBatch>, StoreError> {
        Ok(self
            .batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job)
            .cloned())
    }

    async fn put_batch(&self, job: &JobId, batch: &NoveltyBatch) -> Result<(), StoreError> {
        self.batches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.clone(), batch.clone());
        Ok(())
    }

    async fn delete_batch(&self, job: &JobId) -> Result<(), StoreError> {
        self.batches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job);
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn append_exchange(&self, record: ExchangeRecord) -> Result<(), StoreError> {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        let records = history.entry(record.identity.clone()).or_default();
        records.push_back(record);
        while records.len() > self.history_limit {
            records.pop_front();
        }
        Ok(())
    }
}

#[async_trait]
impl SimilaritySource for InMemoryStore {
    async fn similar_to(
        &self,
        query: &SimilarityQuery,
    ) -> Result<Vec<SimilarityWitness>, StoreError> {
        let tokens = keyword_tokens(&query.prompt);
        if tokens.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        let Some(records) = history.get(&query.identity) else {
            return Ok(Vec::new());
        };

        let mut witnesses: Vec<SimilarityWitness> = records
            .iter()
            .filter(|r| query.since.is_none_or(|since| r.at >= since))
            .filter(|r| {
                query.exclude_job.is_none() || r.job_id.as_ref() != query.exclude_job.as_ref()
            })
            .filter_map(|r| {
                let score = jaccard(&tokens, &keyword_tokens(&r.prompt));
                (score >= query.threshold && score > 0.0).then(|| SimilarityWitness {
                    prompt: r.prompt.clone(),
                    response: r.response.clone(),
                    score,
                    job_id: r.job_id.clone(),
                    created_at: r.at,
                })
            })
            .collect();

        // Highest score first, newest first among equals
        witnesses.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        witnesses.truncate(query.limit);
        Ok(witnesses)
    }
}
