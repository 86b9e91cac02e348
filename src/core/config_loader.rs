//! Configuration loader for app-repo-publisher
//!
//! Builds a validated `PublishConfig` from three sources, highest priority
//! first:
//! 1. Workflow inputs (CLI flags or `INPUT_*` variables)
//! 2. Environment (secrets and the GitHub runner variables)
//! 3. Project config (`<workspace>/.app-publisher.yaml`)
//!
//! Every missing value is collected before failing, so one run reports all of
//! them at once.

use super::config::*;
use crate::core::error::{ConfigIssue, PublishError};
use crate::security::credentials::SecureCredentials;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

pub const ENV_USERNAME: &str = "nowUsername";
pub const ENV_PASSWORD: &str = "nowPassword";
pub const ENV_INSTANCE: &str = "nowSourceInstance";
pub const ENV_SYS_ID: &str = "appSysID";
pub const ENV_SCOPE: &str = "appScope";
pub const ENV_WORKSPACE: &str = "GITHUB_WORKSPACE";
pub const ENV_RUN_NUMBER: &str = "GITHUB_RUN_NUMBER";

/// Which workflow the configuration is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Publish,
    Install,
}

/// Step inputs, as given by the workflow file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionInputs {
    pub version_format: Option<String>,
    pub version: Option<String>,
    pub version_template: Option<String>,
    pub dev_notes: Option<String>,
    pub is_app_customization: bool,
    pub poll_interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
    pub transport_retries: Option<u32>,
}

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Environment variables (the process env in the binary)
    pub env: HashMap<String, String>,

    /// Workflow inputs (highest priority)
    pub inputs: ActionInputs,

    pub mode: RunMode,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, merge and validate configuration
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, PublishError> {
        let env = &options.env;
        let workspace = env_value(env, ENV_WORKSPACE);

        let (project, project_issue) = match workspace.as_deref() {
            Some(root) => match Self::load_project_config(Path::new(root)).await {
                Ok(project) => (project.unwrap_or_default(), None),
                Err(issue) => (ProjectConfig::default(), Some(issue)),
            },
            None => (ProjectConfig::default(), None),
        };

        let inputs = Self::merge_inputs(options.inputs, &project);

        let mut issues = Self::validate(env, &inputs, options.mode);
        issues.extend(project_issue);
        if let [ConfigIssue::InvalidProjectConfig { path, message }] = issues.as_slice() {
            return Err(PublishError::InvalidProjectConfig {
                path: path.clone(),
                message: message.clone(),
            });
        }
        if !issues.is_empty() {
            return Err(PublishError::Configuration { issues });
        }

        let credentials = SecureCredentials::new(
            env_value(env, ENV_USERNAME).unwrap_or_default(),
            env_value(env, ENV_PASSWORD).unwrap_or_default(),
        );

        let defaults = PollOptions::default();
        let poll_file = project.poll.unwrap_or_default();
        let poll = PollOptions {
            interval: inputs
                .poll_interval_ms
                .or(poll_file.interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            max_polls: inputs.max_polls.or(poll_file.max_polls),
            transport_retries: inputs
                .transport_retries
                .or(poll_file.transport_retries)
                .unwrap_or(defaults.transport_retries),
        };

        let config = PublishConfig {
            credentials,
            instance: env_value(env, ENV_INSTANCE).unwrap_or_default(),
            identity: AppIdentity::new(env_value(env, ENV_SYS_ID), env_value(env, ENV_SCOPE)),
            version_format: inputs.version_format.unwrap_or_default(),
            version: inputs.version,
            version_template: inputs.version_template,
            run_number: env_value(env, ENV_RUN_NUMBER).unwrap_or_default(),
            repository_root: workspace.map(PathBuf::from).unwrap_or_default(),
            dev_notes: inputs.dev_notes,
            is_app_customization: inputs.is_app_customization,
            poll,
        };

        debug!(
            user = config.credentials.username(),
            instance = %config.instance,
            format = %config.version_format,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Check every required value, in a fixed order
    pub fn validate(
        env: &HashMap<String, String>,
        inputs: &ActionInputs,
        mode: RunMode,
    ) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let sys_id = env_value(env, ENV_SYS_ID);
        let scope = env_value(env, ENV_SCOPE);

        if env_value(env, ENV_USERNAME).is_none() {
            issues.push(ConfigIssue::MissingUsername);
        }
        if env_value(env, ENV_PASSWORD).is_none() {
            issues.push(ConfigIssue::MissingPassword);
        }
        if env_value(env, ENV_INSTANCE).is_none() {
            issues.push(ConfigIssue::MissingInstance);
        }
        if mode == RunMode::Publish && non_empty(inputs.version_format.as_deref()).is_none() {
            issues.push(ConfigIssue::MissingVersionFormat);
        }
        if sys_id.is_none() && scope.is_none() {
            issues.push(ConfigIssue::MissingIdentity);
        }
        if env_value(env, ENV_WORKSPACE).is_none() {
            issues.push(ConfigIssue::MissingWorkspace);
        }
        if inputs.is_app_customization && sys_id.is_none() {
            issues.push(ConfigIssue::CustomizationWithoutSysId);
        }
        if inputs.is_app_customization && scope.is_some() {
            issues.push(ConfigIssue::CustomizationWithScope);
        }

        issues
    }

    /// Fill unset inputs from the project file
    fn merge_inputs(inputs: ActionInputs, project: &ProjectConfig) -> ActionInputs {
        ActionInputs {
            version_format: non_empty(inputs.version_format.as_deref())
                .map(str::to_string)
                .or_else(|| project.version_format.map(|f| f.as_str().to_string())),
            version: non_empty(inputs.version.as_deref()).map(str::to_string),
            version_template: non_empty(inputs.version_template.as_deref())
                .map(str::to_string)
                .or_else(|| project.version_template.clone()),
            dev_notes: non_empty(inputs.dev_notes.as_deref())
                .map(str::to_string)
                .or_else(|| project.dev_notes.clone()),
            ..inputs
        }
    }

    /// Load `<root>/.app-publisher.yaml` if it exists
    ///
    /// An unreadable file is returned as an issue so it is reported together
    /// with the missing values.
    async fn load_project_config(root: &Path) -> Result<Option<ProjectConfig>, ConfigIssue> {
        let path = root.join(PROJECT_CONFIG_FILENAME);
        if !path.exists() {
            return Ok(None);
        }

        let invalid = |message: String| ConfigIssue::InvalidProjectConfig {
            path: path.display().to_string(),
            message,
        };

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| invalid(e.to_string()))?;
        let config: ProjectConfig =
            serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        debug!(path = %path.display(), "project config loaded");
        Ok(Some(config))
    }
}

fn env_value(env: &HashMap<String, String>, key: &str) -> Option<String> {
    non_empty(env.get(key).map(String::as_str)).map(str::to_string)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CONFIG_HINT;
    use tempfile::TempDir;

    fn full_env(workspace: &str) -> HashMap<String, String> {
        [
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "secret"),
            (ENV_INSTANCE, "acme"),
            (ENV_SYS_ID, "123"),
            (ENV_WORKSPACE, workspace),
            (ENV_RUN_NUMBER, "7"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn exact_inputs() -> ActionInputs {
        ActionInputs {
            version_format: Some("exact".to_string()),
            version: Some("1.0.0".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_reports_every_missing_value_in_order() {
        let issues =
            ConfigLoader::validate(&HashMap::new(), &ActionInputs::default(), RunMode::Publish);

        assert_eq!(
            issues,
            vec![
                ConfigIssue::MissingUsername,
                ConfigIssue::MissingPassword,
                ConfigIssue::MissingInstance,
                ConfigIssue::MissingVersionFormat,
                ConfigIssue::MissingIdentity,
                ConfigIssue::MissingWorkspace,
            ]
        );
    }

    #[test]
    fn test_validate_only_credentials_missing() {
        let mut env = full_env("/tmp");
        env.remove(ENV_USERNAME);
        env.insert(ENV_PASSWORD.to_string(), String::new());

        let issues = ConfigLoader::validate(&env, &exact_inputs(), RunMode::Publish);

        assert_eq!(
            issues,
            vec![ConfigIssue::MissingUsername, ConfigIssue::MissingPassword]
        );
    }

    #[test]
    fn test_install_does_not_need_version_format() {
        let env = full_env("/tmp");
        let issues = ConfigLoader::validate(&env, &ActionInputs::default(), RunMode::Install);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_customization_with_scope_and_no_sys_id() {
        let mut env = full_env("/tmp");
        env.remove(ENV_SYS_ID);
        env.insert(ENV_SCOPE.to_string(), "x_abc".to_string());
        let inputs = ActionInputs {
            is_app_customization: true,
            ..exact_inputs()
        };

        let issues = ConfigLoader::validate(&env, &inputs, RunMode::Publish);

        assert_eq!(
            issues,
            vec![
                ConfigIssue::CustomizationWithoutSysId,
                ConfigIssue::CustomizationWithScope
            ]
        );
    }

    #[test]
    fn test_customization_with_sys_id_and_scope() {
        let mut env = full_env("/tmp");
        env.insert(ENV_SCOPE.to_string(), "x_abc".to_string());
        let inputs = ActionInputs {
            is_app_customization: true,
            ..exact_inputs()
        };

        let issues = ConfigLoader::validate(&env, &inputs, RunMode::Publish);

        assert_eq!(issues, vec![ConfigIssue::CustomizationWithScope]);
    }

    #[tokio::test]
    async fn test_load_fails_with_joined_message() {
        let error = ConfigLoader::load(ConfigLoadOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "nowUsername is not set. nowPassword is not set. nowSourceInstance is not set. \
             No version format selected. Please specify scope or sys_id. \
             GITHUB_WORKSPACE is missing. Configure Github secrets please"
        );
    }

    #[tokio::test]
    async fn test_load_builds_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap();

        let config = ConfigLoader::load(ConfigLoadOptions {
            env: full_env(root),
            inputs: exact_inputs(),
            mode: RunMode::Publish,
        })
        .await
        .unwrap();

        assert_eq!(config.credentials.username(), "admin");
        assert_eq!(config.base_url(), "https://acme.service-now.com");
        assert_eq!(config.identity.sys_id(), Some("123"));
        assert!(config.identity.scope().is_none());
        assert_eq!(config.version_format, "exact");
        assert_eq!(config.version.as_deref(), Some("1.0.0"));
        assert_eq!(config.run_number, "7");
        assert_eq!(config.repository_root, PathBuf::from(root));
        assert_eq!(config.poll, PollOptions::default());
    }

    #[tokio::test]
    async fn test_project_config_fills_unset_inputs() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILENAME),
            "versionFormat: template\n\
             versionTemplate: \"2.1\"\n\
             devNotes: from file\n\
             poll:\n  intervalMs: 10\n  maxPolls: 5\n",
        )
        .unwrap();

        let config = ConfigLoader::load(ConfigLoadOptions {
            env: full_env(temp_dir.path().to_str().unwrap()),
            inputs: ActionInputs {
                dev_notes: Some("from input".to_string()),
                ..Default::default()
            },
            mode: RunMode::Publish,
        })
        .await
        .unwrap();

        assert_eq!(config.version_format, "template");
        assert_eq!(config.version_template.as_deref(), Some("2.1"));
        assert_eq!(config.dev_notes.as_deref(), Some("from input"));
        assert_eq!(config.poll.interval, Duration::from_millis(10));
        assert_eq!(config.poll.max_polls, Some(5));
    }

    #[tokio::test]
    async fn test_invalid_project_config() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILENAME),
            "versionFormat: [not, a, format]\n",
        )
        .unwrap();

        let error = ConfigLoader::load(ConfigLoadOptions {
            env: full_env(temp_dir.path().to_str().unwrap()),
            inputs: exact_inputs(),
            mode: RunMode::Publish,
        })
        .await
        .unwrap_err();

        assert_eq!(error.code(), "INVALID_PROJECT_CONFIG");
    }

    #[tokio::test]
    async fn test_invalid_project_file_is_reported_with_missing_values() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILENAME),
            "versionFormat: [\n",
        )
        .unwrap();
        let root = temp_dir.path().to_str().unwrap();
        let env: HashMap<String, String> =
            [(ENV_WORKSPACE.to_string(), root.to_string())].into_iter().collect();

        let error = ConfigLoader::load(ConfigLoadOptions {
            env,
            inputs: exact_inputs(),
            mode: RunMode::Publish,
        })
        .await
        .unwrap_err();

        let PublishError::Configuration { issues } = &error else {
            panic!("expected a configuration error, got {:?}", error);
        };
        assert_eq!(
            issues[..4],
            [
                ConfigIssue::MissingUsername,
                ConfigIssue::MissingPassword,
                ConfigIssue::MissingInstance,
                ConfigIssue::MissingIdentity,
            ]
        );
        assert_eq!(issues.len(), 5);
        let ConfigIssue::InvalidProjectConfig { path, .. } = &issues[4] else {
            panic!("expected the project file issue last, got {:?}", issues[4]);
        };
        assert!(path.ends_with(PROJECT_CONFIG_FILENAME));
        assert!(error.to_string().starts_with("nowUsername is not set."));
        assert!(error.to_string().ends_with(CONFIG_HINT));
    }
}
