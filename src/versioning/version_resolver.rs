//! Version resolution
//!
//! Computes the version to publish under one of four policies and reports
//! the rollback/new pair:
//!
//! - `exact`: the literal `version` input
//! - `template`: `<versionTemplate>.<run number>`, strictly newer than the
//!   published version
//! - `detect`: the `<version>` element of the committed `sys_app` record
//! - `autodetect`: the version currently published on the instance
//!
//! `detect` and `autodetect` use the value as-is. Neither policy bumps the
//! patch component.

use crate::core::config::{AppIdentity, IdentityKey, PublishConfig, VersionFormat};
use crate::core::error::PublishError;
use crate::core::traits::{AppRepository, OutputReporter};
use crate::core::version::{AppVersion, VersionRecord};
use crate::versioning::repo_version::read_repo_version;
use std::path::Path;
use tracing::{debug, info};

pub const OUTPUT_ROLLBACK_VERSION: &str = "rollbackVersion";
pub const OUTPUT_NEW_VERSION: &str = "newVersion";

/// Inputs the policies draw from
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub identity: &'a AppIdentity,
    pub version: Option<&'a str>,
    pub version_template: Option<&'a str>,
    pub run_number: &'a str,
    pub repository_root: &'a Path,
}

impl<'a> From<&'a PublishConfig> for ResolveContext<'a> {
    fn from(config: &'a PublishConfig) -> Self {
        Self {
            identity: &config.identity,
            version: config.version.as_deref(),
            version_template: config.version_template.as_deref(),
            run_number: &config.run_number,
            repository_root: &config.repository_root,
        }
    }
}

/// Resolves the version to publish
pub struct VersionResolver<'a> {
    repository: &'a dyn AppRepository,
    reporter: &'a dyn OutputReporter,
}

impl<'a> VersionResolver<'a> {
    pub fn new(repository: &'a dyn AppRepository, reporter: &'a dyn OutputReporter) -> Self {
        Self {
            repository,
            reporter,
        }
    }

    /// Resolve the version for `policy` and report the version pair
    pub async fn resolve(
        &self,
        policy: &str,
        context: &ResolveContext<'_>,
    ) -> Result<VersionRecord, PublishError> {
        let format: VersionFormat =
            policy
                .parse()
                .map_err(|value| PublishError::UnsupportedVersionPolicy { value })?;

        let record = match format {
            VersionFormat::Exact => self.resolve_exact(context).await?,
            VersionFormat::Template => self.resolve_template(context).await?,
            VersionFormat::Detect => Self::resolve_detect(context).await?,
            VersionFormat::AutoDetect => self.resolve_auto_detect(context).await?,
        };

        info!(
            policy = format.as_str(),
            rollback = %record.rollback,
            new = %record.new,
            "version resolved"
        );
        self.reporter
            .set_output(OUTPUT_ROLLBACK_VERSION, &record.rollback)?;
        self.reporter.set_output(OUTPUT_NEW_VERSION, &record.new)?;

        Ok(record)
    }

    /// Version currently published on the instance
    ///
    /// `Ok(None)` when the record has no version or the scope is unknown.
    pub async fn current_version(
        &self,
        identity: &AppIdentity,
    ) -> Result<Option<String>, PublishError> {
        match identity.key() {
            Some(IdentityKey::SysId(sys_id)) => self.repository.app_version(sys_id).await,
            Some(IdentityKey::Scope(scope)) => {
                let rows = self.repository.scoped_versions().await?;
                Ok(rows
                    .into_iter()
                    .find(|row| row.scope == scope)
                    .map(|row| row.version)
                    .filter(|v| !v.is_empty()))
            }
            None => Err(PublishError::IncorrectConfiguration),
        }
    }

    async fn resolve_exact(
        &self,
        context: &ResolveContext<'_>,
    ) -> Result<VersionRecord, PublishError> {
        let version = non_empty(context.version).ok_or(PublishError::MissingVersion)?;
        let current = self.current_version(context.identity).await?;

        Ok(VersionRecord::new(current.unwrap_or_default(), version))
    }

    async fn resolve_template(
        &self,
        context: &ResolveContext<'_>,
    ) -> Result<VersionRecord, PublishError> {
        let template =
            non_empty(context.version_template).ok_or(PublishError::MissingVersionTemplate)?;
        let candidate = format!("{}.{}", template, context.run_number);
        let parsed: AppVersion = candidate.parse().map_err(|e| {
            debug!(%candidate, error = %e, "template produced an invalid version");
            PublishError::IncorrectVersions
        })?;

        let current = self.current_version(context.identity).await?;
        if let Some(current) = &current {
            let current: AppVersion =
                current.parse().map_err(|_| PublishError::IncorrectVersions)?;
            if !parsed.is_newer_than(&current) {
                return Err(PublishError::IncorrectVersions);
            }
        }

        Ok(VersionRecord::new(current.unwrap_or_default(), candidate))
    }

    async fn resolve_detect(context: &ResolveContext<'_>) -> Result<VersionRecord, PublishError> {
        let (Some(sys_id), Some(scope)) = (context.identity.sys_id(), context.identity.scope())
        else {
            return Err(PublishError::DetectRequiresIdentity);
        };
        if context.repository_root.as_os_str().is_empty() {
            return Err(PublishError::RepositoryRootMissing);
        }

        let version = read_repo_version(context.repository_root, scope, sys_id).await?;
        Ok(VersionRecord::new(version.clone(), version))
    }

    async fn resolve_auto_detect(
        &self,
        context: &ResolveContext<'_>,
    ) -> Result<VersionRecord, PublishError> {
        let version = self
            .current_version(context.identity)
            .await?
            .ok_or(PublishError::VersionNotFound)?;

        Ok(VersionRecord::new(version.clone(), version))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
