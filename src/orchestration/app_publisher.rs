//! App Publisher - Main orchestrator for one CI run
//!
//! Manages the complete workflow:
//! - Version resolution and step outputs
//! - Publish (or install) request submission
//! - Progress polling until the remote job finishes

use crate::core::config::PublishConfig;
use crate::core::error::PublishError;
use crate::core::job::JobOutcome;
use crate::core::traits::{AppRepository, OutputReporter, Sleeper};
use crate::core::version::VersionRecord;
use crate::tracking::job_tracker::JobTracker;
use crate::versioning::version_resolver::{ResolveContext, VersionResolver};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::info;

/// Which request a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Publish,
    Install,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Install => "install",
        }
    }
}

/// Report returned after a finished run
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub operation: Operation,
    pub job_id: String,
    /// `None` for installs
    pub versions: Option<VersionRecord>,
    pub status_message: String,
    pub status_detail: String,
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration: u64,
}

/// Main application publisher orchestrator
pub struct AppPublisher<'a> {
    repository: &'a dyn AppRepository,
    reporter: &'a dyn OutputReporter,
    sleeper: &'a dyn Sleeper,
}

impl<'a> AppPublisher<'a> {
    pub fn new(
        repository: &'a dyn AppRepository,
        reporter: &'a dyn OutputReporter,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            repository,
            reporter,
            sleeper,
        }
    }

    /// Resolve the version, publish it and wait for the job
    pub async fn publish(&self, config: &PublishConfig) -> Result<PublishReport, PublishError> {
        let start = Instant::now();

        let versions = VersionResolver::new(self.repository, self.reporter)
            .resolve(&config.version_format, &ResolveContext::from(config))
            .await?;

        let tracker = self.tracker(config);
        let job = tracker
            .submit(&versions.new, &config.identity, config.dev_notes.as_deref())
            .await?;
        let job_id = job.id().to_string();
        let outcome = tracker.await_completion(job).await?.into_result()?;

        info!(version = %versions.new, job_id = %job_id, "application published");
        Ok(Self::report(
            Operation::Publish,
            job_id,
            Some(versions),
            outcome,
            start,
        ))
    }

    /// Install the application from the repository and wait for the job
    pub async fn install(&self, config: &PublishConfig) -> Result<PublishReport, PublishError> {
        let start = Instant::now();
        let sys_id = config
            .identity
            .sys_id()
            .ok_or(PublishError::IncorrectConfiguration)?;

        let tracker = self.tracker(config);
        let job = tracker.install(sys_id).await?;
        let job_id = job.id().to_string();
        let outcome = tracker.await_completion(job).await?.into_result()?;

        info!(sys_id, job_id = %job_id, "application installed");
        Ok(Self::report(Operation::Install, job_id, None, outcome, start))
    }

    fn tracker(&self, config: &PublishConfig) -> JobTracker<'a> {
        JobTracker::new(
            self.repository,
            self.reporter,
            self.sleeper,
            config.poll.clone(),
        )
    }

    fn report(
        operation: Operation,
        job_id: String,
        versions: Option<VersionRecord>,
        outcome: JobOutcome,
        start: Instant,
    ) -> PublishReport {
        let (status_message, status_detail) = match outcome {
            JobOutcome::Success {
                status_message,
                status_detail,
            } => (status_message, status_detail),
            JobOutcome::Failure { message, .. } => (message, String::new()),
        };

        PublishReport {
            operation,
            job_id,
            versions,
            status_message,
            status_detail,
            finished_at: Utc::now(),
            duration: start.elapsed().as_millis() as u64,
        }
    }
}
