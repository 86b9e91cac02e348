pub mod core;
pub mod github;
pub mod orchestration;
pub mod remote;
pub mod reporters;
pub mod security;
pub mod tracking;
pub mod versioning;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::core::*;
pub use github::{GitHubTagClient, RepoTag};
pub use orchestration::{AppPublisher, Operation, PublishReport};
pub use remote::AppRepoClient;
pub use reporters::{ConsoleReporter, GitHubOutputReporter};
pub use security::SecureCredentials;
pub use tracking::JobTracker;
pub use versioning::{ResolveContext, VersionResolver};
