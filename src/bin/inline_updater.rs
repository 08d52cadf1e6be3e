//! CLI for inspecting what the updater would do.
//!
//! `check` resolves the newest eligible release once and prints the result as
//! JSON. `validate` runs option validation and prints the resolved config.
//! Tracing output goes to stderr so stdout stays machine-readable.

use clap::{Parser, Subcommand};
use inline_updater::{
    Platform, ReleaseResolver, UpdaterConfig, UpdaterOptions, release::GITHUB_API_BASE, version,
};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Poll GitHub releases the way the embedded updater does.
#[derive(Parser)]
#[command(name = "inline-updater", version, about)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Resolve the newest eligible release and compare it to a version.
    Check {
        /// GitHub account owning the repository.
        #[arg(long)]
        user: String,
        /// GitHub repository name.
        #[arg(long)]
        repo: String,
        /// Version of the running application.
        #[arg(long)]
        current: String,
        /// Platform to match assets for (windows, macos). Defaults to this OS.
        #[arg(long)]
        platform: Option<Platform>,
        /// Releases API base.
        #[arg(long, default_value = GITHUB_API_BASE)]
        api_base: String,
    },
    /// Validate updater options.
    Validate {
        /// TOML file with updater options.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory holding package.json or Cargo.toml for repository inference.
        #[arg(long, default_value = ".")]
        app_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("inline_updater=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            user,
            repo,
            current,
            platform,
            api_base,
        } => check(&user, &repo, &current, platform, &api_base).await,
        Command::Validate { config, app_path } => validate(config, &app_path),
    }
}

async fn check(
    user: &str,
    repo: &str,
    current: &str,
    platform: Option<Platform>,
    api_base: &str,
) -> anyhow::Result<()> {
    let platform = platform.unwrap_or_else(Platform::current);
    let resolver = ReleaseResolver::new(platform.clone())?.with_api_base(api_base);

    let report = match resolver.resolve(user, repo).await? {
        Some(release) => {
            let up_to_date = version::is_up_to_date(current, &release.version)?;
            json!({
                "platform": platform.to_string(),
                "current": current,
                "latest": release.version,
                "download_url": release.download_url,
                "update_available": !up_to_date,
                "notes": release.notes,
            })
        }
        None => json!({
            "platform": platform.to_string(),
            "current": current,
            "latest": null,
            "update_available": false,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate(config: Option<PathBuf>, app_path: &std::path::Path) -> anyhow::Result<()> {
    let options = match config {
        Some(path) => UpdaterOptions::from_file(&path)?,
        None => UpdaterOptions::default(),
    };
    let config = UpdaterConfig::from_options(&options, app_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
