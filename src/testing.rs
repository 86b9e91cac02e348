//! Scripted fakes for the async seams, shared by unit tests

use crate::core::error::PublishError;
use crate::core::job::{JobLinks, JobStatus, ProgressLink, RemoteJob};
use crate::core::traits::{AppRepository, OutputReporter, ScopedVersion, Sleeper};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub fn job(status: JobStatus, percent: u8) -> RemoteJob {
    RemoteJob {
        links: JobLinks {
            progress: ProgressLink {
                id: "job-1".to_string(),
                url: "https://acme.example.com/progress/job-1".to_string(),
            },
        },
        status,
        status_label: status.to_string(),
        status_message: format!("{} message", status),
        status_detail: format!("{} detail", status),
        error: None,
        percent_complete: percent,
    }
}

/// In-memory `AppRepository` that records every call
#[derive(Default)]
pub struct FakeRepository {
    pub app_version: Option<String>,
    pub scoped: Vec<ScopedVersion>,
    pub lookup_error: Option<PublishError>,
    pub submitted: Option<RemoteJob>,
    pub submit_error: Option<PublishError>,
    pub progress: Mutex<VecDeque<Result<RemoteJob, PublishError>>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub fn with_version(version: &str) -> Self {
        Self {
            app_version: Some(version.to_string()),
            ..Default::default()
        }
    }

    pub fn with_progress(submitted: RemoteJob, progress: Vec<RemoteJob>) -> Self {
        Self {
            submitted: Some(submitted),
            progress: Mutex::new(progress.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn submit(&self) -> Result<RemoteJob, PublishError> {
        if let Some(error) = &self.submit_error {
            return Err(error.clone());
        }
        Ok(self
            .submitted
            .clone()
            .unwrap_or_else(|| job(JobStatus::Successful, 100)))
    }
}

#[async_trait]
impl AppRepository for FakeRepository {
    async fn app_version(&self, sys_id: &str) -> Result<Option<String>, PublishError> {
        self.record(format!("app_version:{}", sys_id));
        match &self.lookup_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.app_version.clone()),
        }
    }

    async fn scoped_versions(&self) -> Result<Vec<ScopedVersion>, PublishError> {
        self.record("scoped_versions".to_string());
        match &self.lookup_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.scoped.clone()),
        }
    }

    async fn publish(&self, query: &str) -> Result<RemoteJob, PublishError> {
        self.record(format!("publish:{}", query));
        self.submit()
    }

    async fn install(&self, query: &str) -> Result<RemoteJob, PublishError> {
        self.record(format!("install:{}", query));
        self.submit()
    }

    async fn progress(&self, url: &str) -> Result<RemoteJob, PublishError> {
        self.record(format!("progress:{}", url));
        self.progress
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(PublishError::Transport {
                    message: "no scripted progress left".to_string(),
                })
            })
    }
}

/// `OutputReporter` that keeps everything in memory
#[derive(Default)]
pub struct RecordingReporter {
    pub outputs: Mutex<Vec<(String, String)>>,
    pub lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn outputs(&self) -> Vec<(String, String)> {
        self.outputs.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl OutputReporter for RecordingReporter {
    fn set_output(&self, name: &str, value: &str) -> Result<(), PublishError> {
        self.outputs
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn progress(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

/// `Sleeper` that returns immediately and remembers each pause
#[derive(Default)]
pub struct RecordingSleeper {
    pub pauses: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
