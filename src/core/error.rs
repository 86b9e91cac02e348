//! Error handling for app repository publishing
//!
//! Every failure is surfaced to the caller as one human-readable message.
//! The enum keeps enough structure for tests and for the CLI to print
//! recovery hints.

use thiserror::Error;

/// Suffix appended to every configuration failure
pub const CONFIG_HINT: &str = ". Configure Github secrets please";

/// A single problem found while validating configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("nowUsername is not set")]
    MissingUsername,

    #[error("nowPassword is not set")]
    MissingPassword,

    #[error("nowSourceInstance is not set")]
    MissingInstance,

    #[error("No version format selected")]
    MissingVersionFormat,

    #[error("Please specify scope or sys_id")]
    MissingIdentity,

    #[error("GITHUB_WORKSPACE is missing")]
    MissingWorkspace,

    #[error("sys_id not defined")]
    CustomizationWithoutSysId,

    #[error("appScope should not be defined if isAppCustomization=true")]
    CustomizationWithScope,

    #[error("Invalid project config {path}: {message}")]
    InvalidProjectConfig { path: String, message: String },
}

/// Broad family an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    VersionResolution,
    RemoteRequest,
    JobOutcome,
}

/// Main error type for publish and install operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    // Configuration errors
    #[error("{}{}", join_issues(.issues), CONFIG_HINT)]
    Configuration { issues: Vec<ConfigIssue> },

    #[error("Configuration is incorrect")]
    IncorrectConfiguration,

    #[error("Invalid project config {path}: {message}")]
    InvalidProjectConfig { path: String, message: String },

    // Version resolution errors
    #[error("Version is not set in the workflow")]
    MissingVersion,

    #[error("versionTemplate is not set in the workflow")]
    MissingVersionTemplate,

    #[error("Versions are incorrect")]
    IncorrectVersions,

    #[error("For templateVersion = detect, appSysID and appScope are required")]
    DetectRequiresIdentity,

    #[error("Incorrect or not selected versionFormat variable")]
    UnsupportedVersionPolicy { value: String },

    #[error("Application version not found")]
    VersionNotFoundInRepo { path: String },

    #[error("Version not found")]
    VersionNotFound,

    #[error("GITHUB_WORKSPACE env not found")]
    RepositoryRootMissing,

    // Remote errors
    #[error("{message}")]
    Remote { status: Option<u16>, message: String },

    #[error("{message}")]
    Transport { message: String },

    // Job outcome errors
    #[error("{message}")]
    JobFailed { message: String },

    #[error("Canceled")]
    JobCanceled,

    #[error("Job did not finish after {attempts} status checks")]
    PollLimitExceeded { attempts: u32 },

    // Output errors
    #[error("Failed to write output {name}: {message}")]
    OutputFailed { name: String, message: String },
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join(". ")
}

impl PublishError {
    /// Family this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. }
            | Self::IncorrectConfiguration
            | Self::InvalidProjectConfig { .. }
            | Self::OutputFailed { .. } => ErrorCategory::Configuration,
            Self::MissingVersion
            | Self::MissingVersionTemplate
            | Self::IncorrectVersions
            | Self::DetectRequiresIdentity
            | Self::UnsupportedVersionPolicy { .. }
            | Self::VersionNotFoundInRepo { .. }
            | Self::VersionNotFound
            | Self::RepositoryRootMissing => ErrorCategory::VersionResolution,
            Self::Remote { .. } | Self::Transport { .. } => ErrorCategory::RemoteRequest,
            Self::JobFailed { .. } | Self::JobCanceled | Self::PollLimitExceeded { .. } => {
                ErrorCategory::JobOutcome
            }
        }
    }

    /// Only transport failures may succeed on a second attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::Configuration { .. } => vec![
                "Set the missing values as repository secrets",
                "Check the env section of the workflow step",
            ],
            Self::IncorrectConfiguration => vec!["Provide appSysID or appScope"],
            Self::InvalidProjectConfig { .. } => {
                vec!["Fix or remove the .app-publisher.yaml file"]
            }
            Self::MissingVersion => vec!["Set the version input of the workflow step"],
            Self::MissingVersionTemplate => {
                vec!["Set the versionTemplate input, for example 1.2"]
            }
            Self::IncorrectVersions => vec![
                "The new version must be greater than the published one",
                "Raise the versionTemplate or check GITHUB_RUN_NUMBER",
            ],
            Self::DetectRequiresIdentity => vec!["Set both appSysID and appScope"],
            Self::UnsupportedVersionPolicy { .. } => {
                vec!["Use one of: exact, template, detect, autodetect"]
            }
            Self::VersionNotFoundInRepo { .. } => vec![
                "Check that the application was committed to the repository",
                "The sys_app XML file must contain a <version> element",
            ],
            Self::VersionNotFound => vec!["Publish the application once with an explicit version"],
            Self::RepositoryRootMissing => vec!["Run the step after actions/checkout"],
            Self::Remote { .. } => vec![
                "Check the instance name and the user roles",
                "Check that the application exists on the instance",
            ],
            Self::Transport { .. } => vec![
                "Check the network connection to the instance",
                "Retry the workflow later",
            ],
            Self::JobFailed { .. } => vec!["Open the progress record on the instance for details"],
            Self::JobCanceled => vec!["Check who canceled the job on the instance"],
            Self::PollLimitExceeded { .. } => vec![
                "Increase --max-polls",
                "Check the job state on the instance",
            ],
            Self::OutputFailed { .. } => vec!["Check the GITHUB_OUTPUT file permissions"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION",
            Self::IncorrectConfiguration => "INCORRECT_CONFIGURATION",
            Self::InvalidProjectConfig { .. } => "INVALID_PROJECT_CONFIG",
            Self::MissingVersion => "MISSING_VERSION",
            Self::MissingVersionTemplate => "MISSING_VERSION_TEMPLATE",
            Self::IncorrectVersions => "INCORRECT_VERSIONS",
            Self::DetectRequiresIdentity => "DETECT_REQUIRES_IDENTITY",
            Self::UnsupportedVersionPolicy { .. } => "UNSUPPORTED_VERSION_POLICY",
            Self::VersionNotFoundInRepo { .. } => "VERSION_NOT_FOUND_IN_REPO",
            Self::VersionNotFound => "VERSION_NOT_FOUND",
            Self::RepositoryRootMissing => "REPOSITORY_ROOT_MISSING",
            Self::Remote { .. } => "REMOTE_REQUEST",
            Self::Transport { .. } => "TRANSPORT",
            Self::JobFailed { .. } => "JOB_FAILED",
            Self::JobCanceled => "JOB_CANCELED",
            Self::PollLimitExceeded { .. } => "POLL_LIMIT_EXCEEDED",
            Self::OutputFailed { .. } => "OUTPUT_FAILED",
        }
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }
}
