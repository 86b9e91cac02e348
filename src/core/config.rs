//! Configuration structures and types for app-repo-publisher
//!
//! `PublishConfig` is built once by the config loader and never mutated
//! afterwards. `ProjectConfig` is the optional YAML file kept in the
//! repository root.

use crate::security::credentials::SecureCredentials;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Project configuration file name
pub const PROJECT_CONFIG_FILENAME: &str = ".app-publisher.yaml";

/// Default pause between two progress checks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Strategy used to compute the version to publish
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VersionFormat {
    Exact,
    Template,
    Detect,
    AutoDetect,
}

impl VersionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Template => "template",
            Self::Detect => "detect",
            Self::AutoDetect => "autodetect",
        }
    }
}

impl FromStr for VersionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "template" => Ok(Self::Template),
            "detect" => Ok(Self::Detect),
            "autodetect" => Ok(Self::AutoDetect),
            other => Err(other.to_string()),
        }
    }
}

/// Remote application addressed by `sys_id` and/or `scope`
///
/// Empty strings are normalised to `None` by the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppIdentity {
    pub sys_id: Option<String>,
    pub scope: Option<String>,
}

impl AppIdentity {
    pub fn new(sys_id: Option<String>, scope: Option<String>) -> Self {
        Self {
            sys_id: sys_id.filter(|v| !v.is_empty()),
            scope: scope.filter(|v| !v.is_empty()),
        }
    }

    pub fn sys_id(&self) -> Option<&str> {
        self.sys_id.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// `sys_id` wins over `scope` when both are set
    pub fn key(&self) -> Option<IdentityKey<'_>> {
        match (self.sys_id(), self.scope()) {
            (Some(sys_id), _) => Some(IdentityKey::SysId(sys_id)),
            (None, Some(scope)) => Some(IdentityKey::Scope(scope)),
            (None, None) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key().is_none()
    }
}

/// The identity value actually used for remote lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKey<'a> {
    SysId(&'a str),
    Scope(&'a str),
}

impl IdentityKey<'_> {
    /// Query parameter name used by the publish endpoint
    pub fn param_name(&self) -> &'static str {
        match self {
            Self::SysId(_) => "sys_id",
            Self::Scope(_) => "scope",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::SysId(v) | Self::Scope(v) => v,
        }
    }
}

/// Progress polling behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Pause after every progress fetch
    pub interval: Duration,
    /// Stop after this many progress fetches; `None` polls until a terminal status
    pub max_polls: Option<u32>,
    /// Attempts per progress fetch on transport failures (1 = no retry)
    pub transport_retries: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: None,
            transport_retries: 1,
        }
    }
}

/// Validated configuration for one CI run
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub credentials: SecureCredentials,
    /// Instance name (`acme`) or full base URL (`https://acme.example.com`)
    pub instance: String,
    pub identity: AppIdentity,
    /// Raw policy selector; parsed when the version is resolved
    pub version_format: String,
    pub version: Option<String>,
    pub version_template: Option<String>,
    pub run_number: String,
    pub repository_root: PathBuf,
    pub dev_notes: Option<String>,
    pub is_app_customization: bool,
    pub poll: PollOptions,
}

impl PublishConfig {
    /// Base URL of the remote instance
    pub fn base_url(&self) -> String {
        instance_base_url(&self.instance)
    }
}

/// Expand a bare instance name into its base URL
pub fn instance_base_url(instance: &str) -> String {
    if instance.contains("://") {
        instance.trim_end_matches('/').to_string()
    } else {
        format!("https://{}.service-now.com", instance)
    }
}

/// Optional `.app-publisher.yaml` kept in the repository root
///
/// Values here are defaults; workflow inputs and env override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    #[serde(skip_serializing_if = "Option::is_none", rename = "versionFormat")]
    pub version_format: Option<VersionFormat>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "versionTemplate")]
    pub version_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "devNotes")]
    pub dev_notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollConfig>,
}

/// Poll section of the project file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PollConfig {
    #[serde(skip_serializing_if = "Option::is_none", rename = "intervalMs")]
    pub interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "maxPolls")]
    pub max_polls: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "transportRetries")]
    pub transport_retries: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_format_from_str() {
        assert_eq!("exact".parse::<VersionFormat>(), Ok(VersionFormat::Exact));
        assert_eq!("autodetect".parse::<VersionFormat>(), Ok(VersionFormat::AutoDetect));
        assert_eq!("latest".parse::<VersionFormat>(), Err("latest".to_string()));
    }

    #[test]
    fn test_identity_prefers_sys_id() {
        let identity = AppIdentity::new(Some("abc".to_string()), Some("x_scope".to_string()));
        assert_eq!(identity.key(), Some(IdentityKey::SysId("abc")));

        let identity = AppIdentity::new(Some(String::new()), Some("x_scope".to_string()));
        assert_eq!(identity.key(), Some(IdentityKey::Scope("x_scope")));
        assert_eq!(identity.key().map(|k| k.param_name()), Some("scope"));
    }

    #[test]
    fn test_identity_empty() {
        let identity = AppIdentity::new(Some(String::new()), None);
        assert!(identity.is_empty());
    }

    #[test]
    fn test_instance_base_url() {
        assert_eq!(instance_base_url("acme"), "https://acme.service-now.com");
        assert_eq!(
            instance_base_url("http://127.0.0.1:1234/"),
            "http://127.0.0.1:1234"
        );
    }

    #[test]
    fn test_default_poll_options() {
        let poll = PollOptions::default();
        assert_eq!(poll.interval, Duration::from_millis(3000));
        assert!(poll.max_polls.is_none());
        assert_eq!(poll.transport_retries, 1);
    }

    #[test]
    fn test_deserialize_project_config() {
        let yaml = r#"
versionFormat: template
versionTemplate: "1.2"
poll:
  intervalMs: 500
  maxPolls: 20
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version_format, Some(VersionFormat::Template));
        assert_eq!(config.version_template.as_deref(), Some("1.2"));
        let poll = config.poll.unwrap();
        assert_eq!(poll.interval_ms, Some(500));
        assert_eq!(poll.max_polls, Some(20));
        assert!(poll.transport_retries.is_none());
    }

    #[test]
    fn test_serialize_project_config() {
        let config = ProjectConfig {
            version_format: Some(VersionFormat::AutoDetect),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("versionFormat: autodetect"));
    }
}
