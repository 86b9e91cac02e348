//! Core traits at the seams of the publishing workflow
//!
//! The remote API, the output sink and the clock are injected so that the
//! version resolver and the job tracker can be driven deterministically in
//! tests.

use crate::core::error::PublishError;
use crate::core::job::RemoteJob;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `{ scope, version }` row of the application table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedVersion {
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub version: String,
}

// ============================================================================
// Remote API
// ============================================================================

/// Remote application repository API
///
/// Every method returns the already translated error message on failure.
#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Version of the application record with the given `sys_id`
    ///
    /// `Ok(None)` means the record has no version yet.
    async fn app_version(&self, sys_id: &str) -> Result<Option<String>, PublishError>;

    /// Scope and version of every application record
    async fn scoped_versions(&self) -> Result<Vec<ScopedVersion>, PublishError>;

    /// Submit a publish request; `query` is an already encoded query string
    async fn publish(&self, query: &str) -> Result<RemoteJob, PublishError>;

    /// Submit an install request; `query` is an already encoded query string
    async fn install(&self, query: &str) -> Result<RemoteJob, PublishError>;

    /// Re-fetch a job from its progress URL
    async fn progress(&self, url: &str) -> Result<RemoteJob, PublishError>;
}

// ============================================================================
// Output
// ============================================================================

/// Sink for step outputs and progress lines
pub trait OutputReporter: Send + Sync {
    /// Record a named step output (`rollbackVersion`, `newVersion`)
    fn set_output(&self, name: &str, value: &str) -> Result<(), PublishError>;

    /// Show a human-readable progress line
    fn progress(&self, message: &str);
}

// ============================================================================
// Clock
// ============================================================================

/// Suspension between two progress checks
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// `Sleeper` backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
