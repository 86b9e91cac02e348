//! Output reporters
//!
//! `ConsoleReporter` prints everything to stdout. `GitHubOutputReporter`
//! appends step outputs to the file named by `GITHUB_OUTPUT` so later
//! workflow steps can read them.

use crate::core::error::PublishError;
use crate::core::traits::OutputReporter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Prints outputs and progress lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl OutputReporter for ConsoleReporter {
    fn set_output(&self, name: &str, value: &str) -> Result<(), PublishError> {
        println!("{}: {}", name, value);
        Ok(())
    }

    fn progress(&self, message: &str) {
        println!("{}", message);
    }
}

/// Appends `name=value` lines to the GitHub Actions output file
#[derive(Debug)]
pub struct GitHubOutputReporter {
    output_file: Option<PathBuf>,
    console: ConsoleReporter,
}

impl GitHubOutputReporter {
    /// Without an output file, outputs are printed to the console instead
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self {
            output_file: output_file.filter(|path| !path.as_os_str().is_empty()),
            console: ConsoleReporter,
        }
    }

    /// Use the file named by `GITHUB_OUTPUT`, if set
    pub fn from_env() -> Self {
        Self::new(std::env::var_os(GITHUB_OUTPUT_ENV).map(PathBuf::from))
    }
}

impl OutputReporter for GitHubOutputReporter {
    fn set_output(&self, name: &str, value: &str) -> Result<(), PublishError> {
        let Some(path) = &self.output_file else {
            return self.console.set_output(name, value);
        };

        let failed = |e: std::io::Error| PublishError::OutputFailed {
            name: name.to_string(),
            message: e.to_string(),
        };

        let entry = output_entry(name, value)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(failed)?;
        file.write_all(entry.as_bytes()).map_err(failed)?;

        debug!(name, value, path = %path.display(), "step output written");
        Ok(())
    }

    fn progress(&self, message: &str) {
        self.console.progress(message);
    }
}

/// One entry of the output file
///
/// Multi-line values use the `name<<delimiter` form so that a line break
/// in the value cannot start another output.
fn output_entry(name: &str, value: &str) -> Result<String, PublishError> {
    let rejected = |message: &str| PublishError::OutputFailed {
        name: name.to_string(),
        message: message.to_string(),
    };

    if name.is_empty() || name.contains(['\n', '\r', '=']) {
        return Err(rejected("output names must be a single line without '='"));
    }

    if !value.contains(['\n', '\r']) {
        return Ok(format!("{}={}\n", name, value));
    }

    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    if value.contains(&delimiter) {
        return Err(rejected("value contains the output delimiter"));
    }
    Ok(format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter))
}
