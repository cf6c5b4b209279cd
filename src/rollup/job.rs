//! The statistics batch job
//!
//! `Init → ComputingUpperBound → Aggregating → Publishing → Done`; any failure
//! moves to `Failed` and reports the phase it happened in. `Init` only prepares
//! the schema, so a failure there has read and published nothing. There is no
//! retry: the next scheduled run starts from scratch.

use super::coordinator::aggregate;
use super::exclusion::ExclusionSet;
use super::types::TimeBounds;
use crate::config::StatisticsConfig;
use crate::error::StatisticsError;
use crate::store::{SnapshotPublisher, SourceStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Init,
    ComputingUpperBound,
    Aggregating,
    Publishing,
    Done,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Init => "init",
            JobState::ComputingUpperBound => "computing_upper_bound",
            JobState::Aggregating => "aggregating",
            JobState::Publishing => "publishing",
            JobState::Done => "done",
            JobState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful run summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub upper_bound: DateTime<Utc>,
    pub records_published: usize,
    pub duration: Duration,
}

/// Failed run: the phase that failed and why
#[derive(Debug, thiserror::Error)]
#[error("statistics job failed during {phase}: {error}")]
pub struct JobError {
    pub phase: JobState,
    #[source]
    pub error: StatisticsError,
}

pub struct StatisticsJob<S> {
    store: Arc<S>,
    exclude: Arc<ExclusionSet>,
    state: JobState,
}

impl<S> StatisticsJob<S>
where
    S: SourceStore + SnapshotPublisher + 'static,
{
    pub fn new(store: Arc<S>, config: &StatisticsConfig) -> Self {
        Self {
            store,
            exclude: Arc::new(config.exclude.clone()),
            state: JobState::Init,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    fn enter(&mut self, next: JobState) {
        log::debug!("🔄 Job state: {} → {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: StatisticsError) -> JobError {
        let phase = self.state;
        self.enter(JobState::Failed);
        log::error!("❌ Statistics job failed during {}: {}", phase, error);
        JobError { phase, error }
    }

    /// Run the job once; a job that already ran cannot be rerun
    pub async fn run(&mut self) -> Result<JobReport, JobError> {
        if self.state != JobState::Init {
            return Err(JobError {
                phase: self.state,
                error: StatisticsError::AlreadyRan(self.state),
            });
        }

        let started = Instant::now();
        log::info!("🚀 Statistics job starting");
        log::info!("   └─ Excluded accounts: {}", self.exclude.len());

        if let Err(e) = self.store.prepare().await {
            return Err(self.fail(e));
        }

        self.enter(JobState::ComputingUpperBound);
        let upper_bound = match self.store.latest_block().await {
            Ok(Some(block)) => {
                log::info!("🧱 Upper bound from block {}: {}", block.height, block.time);
                block.time
            }
            Ok(None) => {
                let now = Utc::now();
                log::warn!("⚠️  No indexed blocks, upper bound falls back to now ({})", now);
                now
            }
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(JobState::Aggregating);
        let source: Arc<dyn SourceStore> = self.store.clone();
        let records = match aggregate(
            source,
            TimeBounds::up_to(upper_bound),
            Arc::clone(&self.exclude),
        )
        .await
        {
            Ok(records) => records,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(JobState::Publishing);
        let records_published = match self.store.replace_snapshot(records).await {
            Ok(count) => count,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(JobState::Done);
        let duration = started.elapsed();
        log::info!(
            "✅ Statistics job done: {} records in {:?}",
            records_published,
            duration
        );

        Ok(JobReport {
            upper_bound,
            records_published,
            duration,
        })
    }
}
