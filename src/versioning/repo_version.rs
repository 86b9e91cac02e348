//! Version lookup in the committed application sources
//!
//! The source-control integration writes the application record to
//! `<root>/<scope>/sys_app_<sys_id>.xml`. Only the `<version>` element is
//! needed, so the file is searched with a pattern instead of being parsed.

use crate::core::error::PublishError;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

lazy_static! {
    static ref VERSION_ELEMENT: Regex =
        Regex::new(r"<version>([^<]+)</version>").expect("version pattern is valid");
}

/// Path of the application record file
pub fn app_record_path(root: &Path, scope: &str, sys_id: &str) -> PathBuf {
    root.join(scope).join(format!("sys_app_{}.xml", sys_id))
}

/// Content of the first `<version>` element, if any
pub fn extract_version(content: &str) -> Option<&str> {
    VERSION_ELEMENT
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
}

/// Read the application version from the repository checkout
pub async fn read_repo_version(
    root: &Path,
    scope: &str,
    sys_id: &str,
) -> Result<String, PublishError> {
    info!("Looking in {}", root.join(scope).display());

    let path = app_record_path(root, scope, sys_id);
    let not_found = || PublishError::VersionNotFoundInRepo {
        path: path.display().to_string(),
    };

    let content = fs::read_to_string(&path).await.map_err(|_| not_found())?;
    extract_version(&content)
        .map(str::to_string)
        .ok_or_else(not_found)
}
