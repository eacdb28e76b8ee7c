//! Poll Due Jobs use case.
//!
//! One poll cycle: list the jobs due at `now` and fire each concurrently.
//! Jobs whose lock is held are skipped and picked up by a later cycle.

use crate::ports::store::{JobStore, StoreError};
use crate::use_cases::fire_job::{FireJobUseCase, FireOutcome};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use relay_domain::JobId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tally of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub due: usize,
    pub delivered: Vec<JobId>,
    pub skipped: Vec<JobId>,
    pub failed: Vec<JobId>,
}

pub struct PollDueJobs {
    jobs: Arc<dyn JobStore>,
    fire: Arc<FireJobUseCase>,
}

impl PollDueJobs {
    pub fn new(jobs: Arc<dyn JobStore>, fire: Arc<FireJobUseCase>) -> Self {
        Self { jobs, fire }
    }

    pub async fn poll_once(&self, now: DateTime<Utc>) -> Result<PollReport, StoreError> {
        let due = self.jobs.due_jobs(now).await?;
        let mut report = PollReport {
            due: due.len(),
            ..PollReport::default()
        };
        if due.is_empty() {
            debug!("No jobs due");
            return Ok(report);
        }

        let fires = due.iter().map(|job| async move {
            let outcome = self.fire.fire_due(&job.id, now).await;
            (job.id.clone(), outcome)
        });

        for (id, outcome) in join_all(fires).await {
            match outcome {
                Ok(FireOutcome::Delivered(_)) => report.delivered.push(id),
                Ok(FireOutcome::Skipped(reason)) => {
                    debug!(job_id = %id, reason = ?reason, "Job skipped");
                    report.skipped.push(id);
                }
                Ok(FireOutcome::Failed { .. }) => report.failed.push(id),
                Err(e) => {
                    warn!(job_id = %id, error = %e, "Job fire errored");
                    report.failed.push(id);
                }
            }
        }

        info!(
            due = report.due,
            delivered = report.delivered.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Poll cycle finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AgentCatalog;
    use crate::config::{CatalogParams, DispatchParams, FireParams, NoveltyParams, SelectionParams};
    use crate::ports::agent::{Agent, AgentError, AgentOutput};
    use crate::ports::classifier::{AgentClassifier, ClassifierError};
    use crate::use_cases::dispatch::Dispatcher;
    use crate::use_cases::fire_job::test_support::TestStore;
    use crate::use_cases::novelty::NoveltyPipeline;
    use crate::use_cases::route_task::RouteTaskUseCase;
    use crate::use_cases::select_agent::AgentSelector;
    use async_trait::async_trait;
    use relay_domain::{
        AgentDescriptor, AgentOrigin, Classification, Identity, Message, RecurrenceKind,
        RecurrenceSpec, RecurringJob, RepeatableContentPolicy,
    };

    struct Echo(AgentDescriptor);

    #[async_trait]
    impl Agent for Echo {
        fn descriptor(&self) -> &AgentDescriptor {
            &self.0
        }

        async fn invoke(&self, messages: &[Message]) -> Result<AgentOutput, AgentError> {
            Ok(AgentOutput::text(
                messages.last().map(|m| m.content.clone()).unwrap_or_default(),
            ))
        }
    }

    struct Unused;

    #[async_trait]
    impl AgentClassifier for Unused {
        async fn classify(
            &self,
            _task: &str,
            _candidates: &[AgentDescriptor],
        ) -> Result<Classification, ClassifierError> {
            Err(ClassifierError::Unavailable("unused".to_string()))
        }
    }

    fn poller(store: Arc<TestStore>) -> PollDueJobs {
        let catalog = Arc::new(AgentCatalog::new(CatalogParams::default()));
        catalog.register_instance(Arc::new(Echo(
            AgentDescriptor::new("general", "general agent", AgentOrigin::Core).unwrap(),
        )));
        let selector = Arc::new(AgentSelector::new(
            catalog.clone(),
            Arc::new(Unused),
            SelectionParams::default(),
        ));
        let router = Arc::new(RouteTaskUseCase::new(
            catalog,
            selector,
            Dispatcher::new(DispatchParams::default()),
        ));
        let novelty = NoveltyPipeline::new(
            store.clone(),
            store.clone(),
            RepeatableContentPolicy::disabled(),
            NoveltyParams::default(),
        );
        let fire = Arc::new(FireJobUseCase::new(
            store.clone(),
            store.clone(),
            novelty,
            router,
            FireParams::default(),
        ));
        PollDueJobs::new(store, fire)
    }

    fn add_job(store: &TestStore, id: &str, anchor: DateTime<Utc>) {
        let job = RecurringJob::new(
            JobId::new(id),
            id,
            Identity::new("alice"),
            format!("status report {}", id),
            RecurrenceSpec::new(RecurrenceKind::Hourly, anchor),
        );
        store.jobs.lock().unwrap().insert(job.id.clone(), job);
    }

    #[tokio::test]
    async fn fires_only_due_jobs() {
        let now = Utc::now();
        let store = Arc::new(TestStore::default());
        add_job(&store, "due-a", now - chrono::Duration::minutes(1));
        add_job(&store, "due-b", now);
        add_job(&store, "later", now + chrono::Duration::hours(1));

        let report = poller(store.clone()).poll_once(now).await.unwrap();
        assert_eq!(report.due, 2);
        assert_eq!(report.delivered.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(store.job(&JobId::new("later")).schedule.run_count, 0);
        assert_eq!(store.job(&JobId::new("due-a")).schedule.run_count, 1);
    }

    #[tokio::test]
    async fn second_poll_finds_nothing_due() {
        let now = Utc::now();
        let store = Arc::new(TestStore::default());
        add_job(&store, "hourly", now);

        let poller = poller(store);
        assert_eq!(poller.poll_once(now).await.unwrap().delivered.len(), 1);
        assert_eq!(poller.poll_once(now).await.unwrap(), PollReport::default());
    }
}
