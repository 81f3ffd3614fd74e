//! pagewatch CLI
//!
//! Runs the watcher with its status surface, or single operations for
//! local checks.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagewatch::{
    config::load_config,
    error::Result,
    models::Config,
    pipeline::{self, Scheduler},
    server::{self, AppState, render_summary},
    storage::{LocalStorage, StateStorage},
};

/// pagewatch - PDF page change watcher
#[derive(Parser, Debug)]
#[command(
    name = "pagewatch",
    version,
    about = "Watches web pages for new PDF documents"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "pagewatch.toml")]
    config: PathBuf,

    /// Override the state file location
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch targets forever and serve the status surface
    Serve,

    /// Run a single cycle and print the status summary
    Check,

    /// Validate configuration
    Validate,

    /// Show stored baselines
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    log::info!("Shutdown signal received");
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("pagewatch starting...");

    let config = load_config(&cli.config, cli.state_file.clone()).inspect_err(|e| {
        log::error!("{}", e);
    })?;
    log::info!(
        "Watching {} targets, state in {}",
        config.monitor.targets.len(),
        config.storage.state_file.display()
    );

    match cli.command {
        Command::Serve => serve(&config).await?,

        Command::Check => {
            let runner = pipeline::build_runner(&config).await?;
            let report = runner.run_isolated().await?;
            println!("{}", render_summary(&runner.status().snapshot().await));
            log::info!(
                "Check complete: {} changed, {} failed",
                report.changed_count(),
                report.failure_count()
            );
        }

        Command::Validate => {
            log::info!("✓ Config OK ({} targets)", config.monitor.targets.len());
        }

        Command::Info => info(&config).await?,
    }

    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let runner = pipeline::build_runner(config).await?;

    Scheduler::new(runner.clone(), config.monitor.interval()).spawn();

    let state = AppState { runner };
    server::serve(&config.server.bind_addr(), state, shutdown_signal()).await?;

    log::info!("Done!");
    Ok(())
}

async fn info(config: &Config) -> Result<()> {
    let storage = LocalStorage::new(&config.storage.state_file);
    log::info!("State file: {}", storage.path().display());

    let state = storage.load().await?;
    if state.is_empty() {
        log::info!("No baselines stored yet.");
        return Ok(());
    }

    for (target, fp) in &state {
        println!("{target}");
        println!("    kind: {:?}", fp.kind);
        println!("    documents: {}", fp.document_count());
        println!("    digest: {}", fp.digest);
    }
    Ok(())
}
