pub mod repo_version;
pub mod version_resolver;

pub use repo_version::{app_record_path, extract_version, read_repo_version};
pub use version_resolver::{ResolveContext, VersionResolver};
