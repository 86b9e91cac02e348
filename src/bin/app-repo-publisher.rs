//! App Repo Publisher CLI
//!
//! Publishes or installs an application through the instance's app repository
//! API and waits for the remote job to finish.

use anyhow::{Context, Result};
use app_repo_publisher::{
    ActionInputs, AppPublisher, AppRepoClient, ConfigLoadOptions, ConfigLoader,
    GitHubOutputReporter, GitHubTagClient, PublishError, PublishReport, RunMode, TokioSleeper,
    github::tag_client::DEFAULT_API_URL,
};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use std::collections::HashMap;
use std::process;
use tracing_subscriber::EnvFilter;

/// Publish applications to the app repository from CI
#[derive(Parser)]
#[command(name = "app-repo-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Publish applications to the app repository from CI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the version, publish it and wait for the job
    Publish {
        /// Version policy (exact, template, detect, autodetect)
        #[arg(long, env = "INPUT_VERSIONFORMAT")]
        version_format: Option<String>,

        /// Version for the exact policy
        #[arg(long, env = "INPUT_VERSION")]
        version: Option<String>,

        /// Major.minor prefix for the template policy
        #[arg(long, env = "INPUT_VERSIONTEMPLATE")]
        version_template: Option<String>,

        /// Developer notes attached to the published version
        #[arg(long, env = "INPUT_DEVNOTES")]
        dev_notes: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Install the application from the app repository and wait for the job
    Install {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Push a tag to the GitHub repository
    Tag {
        /// Tag name, usually the published version
        #[arg(value_name = "TAG")]
        tag: String,

        /// Create an annotated tag object
        #[arg(long, env = "INPUT_ANNOTATED")]
        annotated: bool,

        /// Commit to tag
        #[arg(long, env = "GITHUB_SHA")]
        sha: String,

        /// Repository as owner/name
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repository: String,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Treat the application as a customization (requires appSysID only)
    #[arg(long, env = "INPUT_ISAPPCUSTOMIZATION")]
    is_app_customization: bool,

    /// Pause between progress checks in milliseconds
    #[arg(long, env = "INPUT_POLLINTERVALMS")]
    poll_interval_ms: Option<u64>,

    /// Give up after this many progress checks
    #[arg(long, env = "INPUT_MAXPOLLS")]
    max_polls: Option<u32>,

    /// Attempts per progress check on network errors
    #[arg(long, env = "INPUT_TRANSPORTRETRIES")]
    transport_retries: Option<u32>,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            version_format,
            version,
            version_template,
            dev_notes,
            common,
        } => {
            let inputs = ActionInputs {
                version_format,
                version,
                version_template,
                dev_notes,
                ..common.into_inputs()
            };
            repo_command(RunMode::Publish, inputs).await
        }
        Commands::Install { common } => repo_command(RunMode::Install, common.into_inputs()).await,
        Commands::Tag {
            tag,
            annotated,
            sha,
            repository,
            token,
            api_url,
        } => tag_command(tag, annotated, sha, repository, token, api_url).await,
    }
}

impl CommonArgs {
    fn into_inputs(self) -> ActionInputs {
        ActionInputs {
            is_app_customization: self.is_app_customization,
            poll_interval_ms: self.poll_interval_ms,
            max_polls: self.max_polls,
            transport_retries: self.transport_retries,
            ..ActionInputs::default()
        }
    }
}

async fn repo_command(mode: RunMode, inputs: ActionInputs) -> Result<i32> {
    let options = ConfigLoadOptions {
        env: std::env::vars().collect::<HashMap<_, _>>(),
        inputs,
        mode,
    };

    let config = match ConfigLoader::load(options).await {
        Ok(config) => config,
        Err(e) => return Ok(report_failure(&e)),
    };

    let client = AppRepoClient::new(&config.base_url(), config.credentials.clone())
        .context("Failed to create HTTP client")?;
    let reporter = GitHubOutputReporter::from_env();
    let sleeper = TokioSleeper;
    let publisher = AppPublisher::new(&client, &reporter, &sleeper);

    let result = match mode {
        RunMode::Publish => publisher.publish(&config).await,
        RunMode::Install => publisher.install(&config).await,
    };

    match result {
        Ok(report) => {
            print_report(&report);
            Ok(0)
        }
        Err(e) => Ok(report_failure(&e)),
    }
}

async fn tag_command(
    tag: String,
    annotated: bool,
    sha: String,
    repository: String,
    token: String,
    api_url: String,
) -> Result<i32> {
    let client = GitHubTagClient::new(SecretString::from(token), &repository, &api_url)
        .context("Failed to create GitHub client")?;

    if client.list_tags().await?.iter().any(|t| t.name == tag) {
        eprintln!("⚠️  Tag {} already exists", tag);
        return Ok(1);
    }

    client.create_tag(&tag, annotated, &sha).await?;
    println!("✅ Tag {} created", tag);
    Ok(0)
}

fn print_report(report: &PublishReport) {
    println!("\n✅ {} completed", report.operation.as_str());
    if let Some(versions) = &report.versions {
        println!("  Version: {} (rollback: {})", versions.new, versions.rollback);
    }
    println!("  Job: {}", report.job_id);
    println!(
        "  Finished: {} ({} ms)",
        report.finished_at.to_rfc3339(),
        report.duration
    );
}

fn report_failure(error: &PublishError) -> i32 {
    eprintln!("\n❌ {}", error);
    let actions = error.suggested_actions();
    if !actions.is_empty() {
        eprintln!("\nSuggested actions:");
        for action in actions {
            eprintln!("  - {}", action);
        }
    }
    1
}
