//! Remote job model
//!
//! A publish or install request creates an asynchronous job on the instance.
//! The job is only ever replaced by a freshly fetched copy; it is never
//! patched locally.

use crate::core::error::PublishError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Failure message of a canceled job
pub const CANCELED_MESSAGE: &str = "Canceled";

/// Job status as reported by the progress API
///
/// The numeric order is part of the contract: anything at or above
/// `Successful` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum JobStatus {
    Pending = 0,
    Running = 1,
    Successful = 2,
    Failed = 3,
    Canceled = 4,
}

impl JobStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Running),
            2 => Some(Self::Successful),
            3 => Some(Self::Failed),
            4 => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn is_terminal(&self) -> bool {
        *self >= Self::Successful
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Successful => "Successful",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        };
        f.write_str(label)
    }
}

/// The API sends the status as a numeric string ("0".."4"); plain numbers are
/// accepted as well.
impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawStatus {
            Number(u8),
            Text(String),
        }

        let code = match RawStatus::deserialize(deserializer)? {
            RawStatus::Number(n) => n,
            RawStatus::Text(text) => text
                .trim()
                .parse::<u8>()
                .map_err(|_| serde::de::Error::custom(format!("invalid job status {:?}", text)))?,
        };

        JobStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown job status {}", code)))
    }
}

/// Link to the progress record of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLink {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLinks {
    #[serde(default)]
    pub progress: ProgressLink,
}

/// Server-side asynchronous operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteJob {
    #[serde(default)]
    pub links: JobLinks,
    pub status: JobStatus,
    #[serde(default)]
    pub status_label: String,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub status_detail: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub percent_complete: u8,
}

impl RemoteJob {
    pub fn id(&self) -> &str {
        &self.links.progress.id
    }

    pub fn progress_url(&self) -> &str {
        &self.links.progress.url
    }

    /// Message for a failed job: the remote error text, else the status message
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| self.status_message.clone())
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

/// Terminal result of a tracked job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success {
        status_message: String,
        status_detail: String,
    },
    /// `status` is `Failed` or `Canceled`
    Failure { status: JobStatus, message: String },
}

impl JobOutcome {
    /// Outcome for a job that already reached a terminal status
    ///
    /// Returns `None` while the job is still pending or running.
    pub fn from_terminal(job: &RemoteJob) -> Option<Self> {
        match job.status {
            JobStatus::Pending | JobStatus::Running => None,
            JobStatus::Successful => Some(Self::Success {
                status_message: job.status_message.clone(),
                status_detail: job.status_detail.clone(),
            }),
            JobStatus::Failed => Some(Self::Failure {
                status: JobStatus::Failed,
                message: job.failure_message(),
            }),
            JobStatus::Canceled => Some(Self::Failure {
                status: JobStatus::Canceled,
                message: CANCELED_MESSAGE.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Turn a failed outcome into the error surfaced to the caller
    pub fn into_result(self) -> Result<Self, PublishError> {
        match self {
            Self::Failure {
                status: JobStatus::Canceled,
                ..
            } => Err(PublishError::JobCanceled),
            Self::Failure { message, .. } => Err(PublishError::JobFailed { message }),
            success => Ok(success),
        }
    }
}
