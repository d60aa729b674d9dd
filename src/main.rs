use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use backup_git::config::Overrides;
use backup_git::{
    mirror_list, mirror_starred, BatchStatus, BatchSummary, Config, GitClient, GitHubClient,
    GitLabClient, Layout, Mirrorer,
};

#[derive(Parser)]
#[command(name = "backup-git")]
#[command(about = "Backup a list of remote git repositories")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to the XDG config location, then /etc)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List of repository urls
    #[arg(long, value_name = "FILE.LST")]
    list: Option<PathBuf>,

    /// Backup all starred GitHub repositories
    #[arg(long, value_name = "USER")]
    gh_starred: Option<String>,

    /// Backup all starred GitLab repositories
    #[arg(long, value_name = "USER")]
    gl_starred: Option<String>,

    /// Directory that mirrors are created under
    #[arg(short = 'C', long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Mirror directory layout
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Show what would be cloned or refreshed without running git
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// List of repository urls (same as --list)
    #[arg(value_name = "FILE.LST", conflicts_with = "list")]
    list_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(status) => status.exit_code(),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<BatchStatus> {
    // Logging needs the config's level, and config loading wants to log
    let config = Config::load_or_default(cli.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level)?;

    let mut config = config?;
    config.apply(Overrides {
        list: cli.list.or(cli.list_file),
        gh_starred: cli.gh_starred,
        gl_starred: cli.gl_starred,
        base_directory: cli.base_dir,
        layout: cli.layout,
    });

    if !config.has_work() {
        warn!("Nothing to do: pass --list, --gh-starred or --gl-starred (or set them in the config file)");
        return Ok(BatchStatus::Clean);
    }

    let status = mirror_all(&config, cli.dry_run).await?;

    info!("done");
    Ok(status)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let default_level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Run every requested batch in order and combine their statuses
async fn mirror_all(config: &Config, dry_run: bool) -> Result<BatchStatus> {
    let mut mirrorer = Mirrorer::from_config(GitClient::new(config), config).dry_run(dry_run);
    let mut status = BatchStatus::Clean;

    if let Some(list) = &config.list {
        let summary = mirror_list(&mut mirrorer, Path::new(list))
            .await
            .context("Cannot process list file")?;
        status = status.worst(summary.status());
    }

    if let Some(user) = &config.gh_starred {
        let summary = match GitHubClient::new(config) {
            Ok(client) => mirror_starred(&mut mirrorer, &client, user).await,
            Err(e) => {
                let mut summary = BatchSummary::new(format!("GitHub stars of {}", user));
                summary.abort(&e);
                summary
            }
        };
        status = status.worst(summary.status());
    }

    if let Some(user) = &config.gl_starred {
        let summary = match GitLabClient::new(config) {
            Ok(client) => mirror_starred(&mut mirrorer, &client, user).await,
            Err(e) => {
                let mut summary = BatchSummary::new(format!("GitLab stars of {}", user));
                summary.abort(&e);
                summary
            }
        };
        status = status.worst(summary.status());
    }

    Ok(status)
}
