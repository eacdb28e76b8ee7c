//! Fire Job use case.
//!
//! One fire of one recurring job:
//!
//! 1. take the job's exclusive lock (skip when already held)
//! 2. reload the job and check it is active (and due, for scheduled fires)
//! 3. run the novelty pipeline: serve a batch item or route through an agent
//! 4. record the exchange, advance the schedule, persist it
//! 5. for a served batch item, persist the advanced batch cursor
//!
//! A failed dispatch, or a batch that cannot be stored, leaves the run count
//! untouched and pushes the next fire back by the retry backoff.

use crate::config::FireParams;
use crate::ports::store::{HistoryStore, JobStore, StoreError};
use crate::use_cases::novelty::{NoveltyPipeline, NoveltyPlan};
use crate::use_cases::route_task::{RouteOptions, RouteTaskUseCase};
use chrono::{DateTime, Utc};
use relay_domain::{
    Deactivation, DispatchResult, DomainError, ExchangeRecord, JobId, RecurrenceContext,
    RecurringJob, TaskRequest,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FireError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid job: {0}")]
    InvalidJob(#[from] DomainError),
}

/// Exclusive per-job fire locks with try-lock semantics.
#[derive(Debug, Default)]
pub struct JobLocks {
    held: Mutex<HashSet<JobId>>,
}

impl JobLocks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Acquire the lock for `id`, or `None` when a fire already holds it.
    pub fn try_lock(self: &Arc<Self>, id: &JobId) -> Option<JobGuard> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(id.clone()) {
            return None;
        }
        Some(JobGuard {
            locks: self.clone(),
            id: id.clone(),
        })
    }

    pub fn is_locked(&self, id: &JobId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

/// Releases the job's lock on drop.
#[derive(Debug)]
pub struct JobGuard {
    locks: Arc<JobLocks>,
    id: JobId,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fire of the same job is running.
    Locked,
    NotFound,
    Inactive,
    NotDue,
}

/// A delivered fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub text: String,
    /// `None` when served from a batch.
    pub agent: Option<String>,
    pub from_batch: bool,
    pub run_count: u32,
    pub next_fire: Option<DateTime<Utc>>,
    pub deactivated: Option<Deactivation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    Skipped(SkipReason),
    Delivered(Delivery),
    Failed {
        error: String,
        retry_at: Option<DateTime<Utc>>,
    },
}

impl FireOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, FireOutcome::Delivered(_))
    }
}

pub struct FireJobUseCase {
    jobs: Arc<dyn JobStore>,
    history: Arc<dyn HistoryStore>,
    novelty: NoveltyPipeline,
    router: Arc<RouteTaskUseCase>,
    locks: Arc<JobLocks>,
    params: FireParams,
}

impl FireJobUseCase {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        history: Arc<dyn HistoryStore>,
        novelty: NoveltyPipeline,
        router: Arc<RouteTaskUseCase>,
        params: FireParams,
    ) -> Self {
        Self {
            jobs,
            history,
            novelty,
            router,
            locks: JobLocks::new(),
            params,
        }
    }

    /// Share locks with another driver in the same process.
    pub fn with_locks(mut self, locks: Arc<JobLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &Arc<JobLocks> {
        &self.locks
    }

    /// Scheduled fire: skipped unless the job is due at `now`.
    pub async fn fire_due(&self, id: &JobId, now: DateTime<Utc>) -> Result<FireOutcome, FireError> {
        self.fire(id, now, true).await
    }

    /// Manual fire: runs any active job immediately.
    pub async fn fire_now(&self, id: &JobId, now: DateTime<Utc>) -> Result<FireOutcome, FireError> {
        self.fire(id, now, false).await
    }

    async fn fire(&self, id: &JobId, now: DateTime<Utc>, require_due: bool) -> Result<FireOutcome, FireError> {
        let Some(_guard) = self.locks.try_lock(id) else {
            debug!(job_id = %id, "Fire already in progress; skipping");
            return Ok(FireOutcome::Skipped(SkipReason::Locked));
        };

        let Some(mut job) = self.jobs.get_job(id).await? else {
            return Ok(FireOutcome::Skipped(SkipReason::NotFound));
        };
        if !job.schedule.is_active {
            return Ok(FireOutcome::Skipped(SkipReason::Inactive));
        }
        if require_due && !job.schedule.is_due(now) {
            return Ok(FireOutcome::Skipped(SkipReason::NotDue));
        }

        info!(job_id = %id, run = job.schedule.run_count + 1, "Firing job");

        let (text, agent, staged) = match self.novelty.prepare(&job, now).await? {
            NoveltyPlan::Serve(plan) => (plan.served.item.clone(), None, Some(plan)),
            NoveltyPlan::Dispatch(plan) => {
                let task = self.task_for(&job)?;
                match self
                    .router
                    .execute(&task, RouteOptions::with_prompt(plan.prompt.clone()))
                    .await
                {
                    DispatchResult::Done(done) => {
                        match self.novelty.reconcile(&job, &plan, &done.text, now).await {
                            Ok(text) => (text, Some(done.agent), None),
                            Err(e) => {
                                let error = format!("Failed to store novelty batch: {}", e);
                                return self.defer(&mut job, now, error).await;
                            }
                        }
                    }
                    DispatchResult::Failed { error } => {
                        return self.defer(&mut job, now, error).await;
                    }
                }
            }
        };
        let from_batch = staged.is_some();

        let record = ExchangeRecord {
            identity: job.owner.clone(),
            job_id: Some(job.id.clone()),
            prompt: job.prompt.clone(),
            response: text.clone(),
            agent: agent.clone(),
            at: now,
        };
        if let Err(e) = self.history.append_exchange(record).await {
            warn!(job_id = %id, error = %e, "Failed to record exchange");
        }

        let transition = job.schedule.record_fire(now);
        self.jobs.save_schedule(&job.id, &job.schedule).await?;

        // The run is counted; a cursor write failure only repeats this item.
        if let Some(plan) = &staged
            && let Err(e) = self.novelty.commit_serve(&job, plan).await
        {
            warn!(job_id = %id, error = %e, "Failed to advance novelty batch cursor");
        }

        if transition.next_fire.is_none() && job.schedule.is_active {
            warn!(job_id = %id, kind = %job.schedule.kind, "Schedule cannot produce a next fire; job is inert until corrected");
        }
        if let Some(reason) = transition.deactivated {
            info!(job_id = %id, reason = ?reason, "Job deactivated");
        }

        Ok(FireOutcome::Delivered(Delivery {
            text,
            agent,
            from_batch,
            run_count: transition.run_count,
            next_fire: transition.next_fire,
            deactivated: transition.deactivated,
        }))
    }

    fn task_for(&self, job: &RecurringJob) -> Result<TaskRequest, DomainError> {
        Ok(TaskRequest::new(job.prompt.clone())?
            .with_identity(job.owner.clone())
            .with_conversation(format!("job:{}", job.id))
            .with_recurrence(RecurrenceContext {
                job_id: job.id.clone(),
                run_count: job.schedule.run_count,
            }))
    }

    async fn defer(
        &self,
        job: &mut RecurringJob,
        now: DateTime<Utc>,
        error: String,
    ) -> Result<FireOutcome, FireError> {
        let retry_at = chrono::Duration::from_std(self.params.retry_backoff)
            .ok()
            .and_then(|backoff| now.checked_add_signed(backoff));
        if let Some(at) = retry_at {
            job.schedule.defer(at);
            self.jobs.save_schedule(&job.id, &job.schedule).await?;
        }
        warn!(job_id = %job.id, error = %error, retry_at = ?retry_at, "Job fire failed");
        Ok(FireOutcome::Failed { error, retry_at })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ports::store::{
        BatchStore, HistoryStore, JobStore, SimilarityQuery, SimilaritySource, StoreError,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use relay_domain::{
        ExchangeRecord, JobId, NoveltyBatch, RecurrenceSpec, RecurringJob, SimilarityWitness,
    };
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Minimal store for use-case tests.
    #[derive(Default)]
    pub struct TestStore {
        pub jobs: Mutex<HashMap<JobId, RecurringJob>>,
        pub batches: Mutex<HashMap<JobId, NoveltyBatch>>,
        pub history: Mutex<Vec<ExchangeRecord>>,
        pub fail_save_schedule: AtomicBool,
        pub fail_put_batch: AtomicBool,
    }

    impl TestStore {
        pub fn job(&self, id: &JobId) -> RecurringJob {
            self.jobs.lock().unwrap().get(id).cloned().unwrap()
        }
    }

    #[async_trait]
    impl JobStore for TestStore {
        async fn get_job(&self, id: &JobId) -> Result<Option<RecurringJob>, StoreError> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn list_jobs(&self) -> Result<Vec<RecurringJob>, StoreError> {
            Ok(self.jobs.lock().unwrap().values().cloned().collect())
        }

        async fn put_job(&self, job: RecurringJob) -> Result<(), StoreError> {
            self.jobs.lock().unwrap().insert(job.id.clone(), job);
            Ok(())
        }

        async fn due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<RecurringJob>, StoreError> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .values()
                .filter(|j| j.schedule.is_due(now))
                .cloned()
                .collect())
        }

        async fn save_schedule(&self, id: &JobId, schedule: &RecurrenceSpec) -> Result<(), StoreError> {
            if self.fail_save_schedule.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("schedule write failed".to_string()));
            }
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            job.schedule = schedule.clone();
            Ok(())
        }
    }

    #[async_trait]
    impl BatchStore for TestStore {
        async fn get_batch(&self, job: &JobId) -> Result<Option<NoveltyBatch>, StoreError> {
            Ok(self.batches.lock().unwrap().get(job).cloned())
        }

        async fn put_batch(&self, job: &JobId, batch: &NoveltyBatch) -> Result<(), StoreError> {
            if self.fail_put_batch.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("batch write failed".to_string()));
            }
            self.batches.lock().unwrap().insert(job.clone(), batch.clone());
            Ok(())
        }

        async fn delete_batch(&self, job: &JobId) -> Result<(), StoreError> {
            self.batches.lock().unwrap().remove(job);
            Ok(())
        }
    }

    #[async_trait]
    impl HistoryStore for TestStore {
        async fn append_exchange(&self, record: ExchangeRecord) -> Result<(), StoreError> {
            self.history.lock().unwrap().push(record);
            Ok(())
        }
    }

    #[async_trait]
    impl SimilaritySource for TestStore {
        async fn similar_to(&self, _query: &SimilarityQuery) -> Result<Vec<SimilarityWitness>, StoreError> {
            Ok(Vec::new())
        }
    }
}
