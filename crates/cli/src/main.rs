use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use domain::FilterConfig;
use pipeline::FilterPipeline;
use runner::{load_run_config, BatchRunner, DryRunAppender, FilterEvaluator, FilterOutcome, RunSummary};
use sources::PlaylistAppender;
use spotify_client::{authorize_url, exchange_code, http_client, Credentials, SpotifyClient};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Copies matching podcast episodes into Spotify playlists
#[derive(Parser)]
#[command(name = "podcast-filter")]
#[command(about = "Filter podcast episodes by title and add new matches to playlists", long_about = None)]
struct Cli {
    /// Debug logging for the filter crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read environment variables from this file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every filter and append new matches
    Run {
        /// Path to the TOML configuration
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// Classify and report, but never modify a playlist
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration without touching the network
    Check {
        /// Path to the TOML configuration
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Print the URL that grants this app access to your playlists
    AuthorizeUrl,

    /// Exchange the code from the redirect for a refresh token
    ExchangeCode {
        /// The `code` query parameter of the redirect
        #[arg(long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let env_loaded = load_env(cli.env_file.as_deref());

    // Initialize tracing
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new(
            "info,domain=debug,sources=debug,pipeline=debug,runner=debug,spotify_client=debug",
        )
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match env_loaded {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => return Err(e),
    }

    match cli.command {
        Commands::Run {
            config,
            dry_run,
            json,
        } => handle_run(&config, dry_run, json).await,
        Commands::Check { config } => handle_check(&config),
        Commands::AuthorizeUrl => handle_authorize_url(),
        Commands::ExchangeCode { code } => handle_exchange_code(&code).await,
    }
}

/// Load variables from a dotenv file. Variables already set are kept.
///
/// Without an explicit path a missing `.env` is fine; an explicit path that
/// cannot be read is an error.
fn load_env(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}

/// Handle the 'run' command
async fn handle_run(config_path: &Path, dry_run: bool, json: bool) -> Result<ExitCode> {
    let config = load_run_config(config_path)?;
    let client = Arc::new(SpotifyClient::from_env().context("Failed to set up Spotify client")?);

    let evaluator = if dry_run {
        let recorder = Arc::new(DryRunAppender::new(client.max_batch_size()));
        FilterEvaluator::from_parts(client.clone(), client.clone(), recorder)
    } else {
        FilterEvaluator::new(client)
    };
    let runner = BatchRunner::new(evaluator, config.settings.into());

    // Ctrl-C lets the filter in flight finish, then stops
    let stop = runner.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current filter");
            stop.raise();
        }
    });

    let start = Instant::now();
    let summary = runner.run(&config.filters).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    } else {
        print_summary(&summary, dry_run);
        println!("Finished in {:?}", start.elapsed());
    }

    if summary.has_failures() {
        Ok(ExitCode::FAILURE)
    } else if summary.stopped {
        Ok(ExitCode::from(130))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Handle the 'check' command
fn handle_check(config_path: &Path) -> Result<ExitCode> {
    let config = load_run_config(config_path)?;

    println!(
        "{}",
        format!("Checking {}", config_path.display()).bold().blue()
    );
    println!(
        "{}continue_on_error: {}",
        "• ".cyan(),
        config.settings.continue_on_error
    );
    println!(
        "{}max_concurrent_playlists: {}",
        "• ".cyan(),
        config.settings.max_concurrent_playlists
    );

    let mut problems = 0;
    for filter in &config.filters {
        match check_filter(filter) {
            Ok((show, playlist)) => println!(
                "{} {}: show {} -> playlist {} (max {})",
                "✓".green(),
                filter.name().bold(),
                show,
                playlist,
                filter.max_episodes()
            ),
            Err(e) => {
                problems += 1;
                println!("{} {}: {}", "✗".red(), filter.name().bold(), e);
            }
        }
    }

    if problems == 0 {
        println!("{} {} filters OK", "✓".green(), config.filters.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} {} of {} filters have problems", "✗".red(), problems, config.filters.len());
        Ok(ExitCode::FAILURE)
    }
}

fn check_filter(filter: &FilterConfig) -> Result<(String, String)> {
    let show = filter.resolve_show_id()?;
    let playlist = filter.resolve_playlist_id()?;
    FilterPipeline::for_config(filter)?;
    Ok((show, playlist))
}

/// Handle the 'authorize-url' command
fn handle_authorize_url() -> Result<ExitCode> {
    let credentials = Credentials::from_env()?;
    let url = authorize_url(&credentials)?;

    println!("{}", "Open this URL and approve access:".bold().blue());
    println!("{}", url);
    println!(
        "Then run `podcast-filter exchange-code --code <code>` with the code from {}",
        credentials.redirect_uri
    );
    Ok(ExitCode::SUCCESS)
}

/// Handle the 'exchange-code' command
async fn handle_exchange_code(code: &str) -> Result<ExitCode> {
    let credentials = Credentials::from_env()?;
    let http = http_client()?;

    let tokens = exchange_code(&http, &credentials, code)
        .await
        .context("Failed to exchange authorization code")?;
    let refresh_token = tokens
        .refresh_token
        .ok_or_else(|| anyhow!("Token response did not include a refresh token"))?;

    println!("{} Authorization complete", "✓".green());
    println!("Store this as SPOTIFY_REFRESH_TOKEN:");
    println!("{}", refresh_token.bold());
    if let Some(scope) = tokens.scope {
        println!("{}Granted scopes: {}", "• ".cyan(), scope);
    }
    Ok(ExitCode::SUCCESS)
}

/// Helper function to format and print a run summary
fn print_summary(summary: &RunSummary, dry_run: bool) {
    let header = if dry_run {
        "Run summary (dry run, nothing was written):"
    } else {
        "Run summary:"
    };
    println!("{}", header.bold().blue());

    for outcome in &summary.outcomes {
        print_outcome(outcome);
    }

    println!(
        "{}/{} filters succeeded, {} matched, {} added",
        summary.filters_succeeded.to_string().green(),
        summary.filters_total,
        summary.total_matched,
        summary.total_added.to_string().green()
    );
    if let Some(aborted) = &summary.aborted {
        println!("{} {}", "✗".red(), aborted.to_string().red());
    }
    if summary.stopped {
        println!("{} Stopped before all filters ran", "!".yellow());
    }
}

fn print_outcome(outcome: &FilterOutcome) {
    let mark = if outcome.is_success() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!(
        "{} {}: checked {}, matched {}, added {}",
        mark,
        outcome.filter_name.bold(),
        outcome.episodes_checked,
        outcome.episodes_matched,
        outcome.episodes_added.len()
    );
    if let Some(show) = &outcome.show_name {
        println!("    {}Show: {}", "→ ".cyan(), show);
    }
    for episode in &outcome.episodes_added {
        println!("    {}{} ({})", "+ ".green(), episode.title, episode.id);
    }
    if let Some(error) = &outcome.error {
        println!("    {}", error.to_string().red());
    }
}
