//! Remote job tracking
//!
//! Submits publish/install requests and polls the progress endpoint until
//! the job reaches a terminal status. The loop is iterative; each fetch is
//! followed by a pause through the injected `Sleeper`.

use crate::core::config::{AppIdentity, PollOptions};
use crate::core::error::PublishError;
use crate::core::job::{JobOutcome, JobStatus, RemoteJob};
use crate::core::retry::{RetryManager, RetryOptions};
use crate::core::traits::{AppRepository, OutputReporter, Sleeper};
use crate::remote::params::build_params;
use tracing::{debug, info};

/// Drives one remote job from submission to a terminal status
pub struct JobTracker<'a> {
    repository: &'a dyn AppRepository,
    reporter: &'a dyn OutputReporter,
    sleeper: &'a dyn Sleeper,
    options: PollOptions,
}

impl<'a> JobTracker<'a> {
    pub fn new(
        repository: &'a dyn AppRepository,
        reporter: &'a dyn OutputReporter,
        sleeper: &'a dyn Sleeper,
        options: PollOptions,
    ) -> Self {
        Self {
            repository,
            reporter,
            sleeper,
            options,
        }
    }

    /// Submit a publish request for `version`
    pub async fn submit(
        &self,
        version: &str,
        identity: &AppIdentity,
        dev_notes: Option<&str>,
    ) -> Result<RemoteJob, PublishError> {
        let key = identity.key().ok_or(PublishError::IncorrectConfiguration)?;
        let query = build_params(&[
            (key.param_name(), Some(key.value())),
            ("version", Some(version)),
            ("dev_notes", dev_notes),
        ]);

        info!(%query, "submitting publish request");
        let job = self.repository.publish(&query).await?;
        debug!(job_id = job.id(), status = %job.status, "publish request accepted");
        Ok(job)
    }

    /// Submit an install request for the application `sys_id`
    pub async fn install(&self, sys_id: &str) -> Result<RemoteJob, PublishError> {
        if sys_id.is_empty() {
            return Err(PublishError::IncorrectConfiguration);
        }

        let query = build_params(&[("app_sys_id", Some(sys_id))]);
        info!(%query, "submitting install request");
        let job = self.repository.install(&query).await?;
        debug!(job_id = job.id(), status = %job.status, "install request accepted");
        Ok(job)
    }

    /// Poll `job` until it reaches a terminal status
    ///
    /// Fails only when a progress fetch fails or the poll limit is reached;
    /// a failed or canceled job is returned as `JobOutcome::Failure`.
    pub async fn await_completion(&self, job: RemoteJob) -> Result<JobOutcome, PublishError> {
        let retry = RetryManager::new(
            RetryOptions {
                max_attempts: self.options.transport_retries,
                delay: self.options.interval,
            },
            self.sleeper,
        );
        let mut url = job.progress_url().to_string();
        let mut job = job;
        let mut polls = 0u32;

        loop {
            self.notify(&job);

            if let Some(outcome) = JobOutcome::from_terminal(&job) {
                info!(status = %job.status, polls, "job finished");
                return Ok(outcome);
            }

            if let Some(max_polls) = self.options.max_polls {
                if polls >= max_polls {
                    return Err(PublishError::PollLimitExceeded { attempts: polls });
                }
            }

            let current_url = url.as_str();
            job = retry
                .retry(|| self.repository.progress(current_url))
                .await?;
            polls += 1;
            debug!(polls, status = %job.status, percent = job.percent_complete, "progress fetched");

            if !job.progress_url().is_empty() {
                url = job.progress_url().to_string();
            }

            self.sleeper.sleep(self.options.interval).await;
        }
    }

    fn notify(&self, job: &RemoteJob) {
        match job.status {
            JobStatus::Pending => self.reporter.progress(&job.status_label),
            JobStatus::Running => self.reporter.progress(&percent_line(job)),
            JobStatus::Successful => {
                self.reporter.progress(&percent_line(job));
                self.reporter.progress(&job.status_message);
                self.reporter.progress(&job.status_detail);
            }
            JobStatus::Failed | JobStatus::Canceled => {}
        }
    }
}

fn percent_line(job: &RemoteJob) -> String {
    format!("{}: {}%", job.status_label, job.percent_complete)
}
