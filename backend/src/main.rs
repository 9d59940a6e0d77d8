// =============================================================================
// Sentiment Lens: Main Entry Point
// =============================================================================
//
// `process` runs the batch over the configured price and headline files and
// writes every derived table to the output directory. `serve` exposes that
// directory to the dashboard as JSON. `keywords` prints the most frequent
// terms of the headline corpus.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod correlation;
mod error;
mod indicators;
mod market_data;
mod metrics;
mod pipeline;
mod pipeline_config;
mod sentiment;
mod store;
mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::pipeline_config::{PipelineConfig, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "sentiment-lens")]
#[command(about = "News sentiment vs. stock performance pipeline")]
struct Cli {
    /// Path to the JSON pipeline config
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators, sentiment and correlations, then write all tables
    Process {
        /// Override the price data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Override the headline CSV
        #[arg(long)]
        news_file: Option<PathBuf>,

        /// Override the output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Serve the output directory as a JSON API for the dashboard
    Serve {
        /// Listen address (defaults to the configured one)
        #[arg(short, long)]
        bind: Option<String>,

        /// Run the batch once before starting the server
        #[arg(long)]
        process_first: bool,
    },
    /// Print the most common keywords of the headline corpus
    Keywords {
        #[arg(short = 'n', long, default_value_t = 20)]
        top_n: usize,

        /// Tokens per n-gram
        #[arg(long, default_value_t = 1)]
        ngram: usize,
    },
    /// Write the default config to `--config`
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::load(path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        PipelineConfig::default()
    });
    config.apply_env_overrides();
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            data_dir,
            news_file,
            output_dir,
        } => {
            let mut config = load_config(&cli.config);
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(file) = news_file {
                config.news_file = file;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            run_process(config).await?;
        }
        Commands::Serve {
            bind,
            process_first,
        } => {
            let mut config = load_config(&cli.config);
            if let Some(addr) = bind {
                config.bind_addr = addr;
            }
            if process_first {
                run_process(config.clone()).await?;
            }
            serve(config).await?;
        }
        Commands::Keywords { top_n, ngram } => {
            let config = load_config(&cli.config);
            let top = tokio::task::spawn_blocking(move || pipeline::keywords_for(&config, top_n, ngram))
                .await
                .context("keyword task panicked")?;
            if top.is_empty() {
                info!("No keywords found");
            }
            for (rank, (term, count)) in top.iter().enumerate() {
                println!("{:>3}. {term:<30} {count}", rank + 1);
            }
        }
        Commands::InitConfig { force } => {
            if cli.config.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    cli.config.display()
                );
            }
            PipelineConfig::default().save(&cli.config)?;
        }
    }

    Ok(())
}

async fn run_process(config: PipelineConfig) -> anyhow::Result<()> {
    info!(
        data_dir = %config.data_dir.display(),
        news_file = %config.news_file.display(),
        output_dir = %config.output_dir.display(),
        "Starting batch"
    );
    let report = tokio::task::spawn_blocking(move || pipeline::run_batch(&config))
        .await
        .context("batch task panicked")?
        .context("batch failed")?;

    for (ticker, reason) in &report.skipped {
        warn!(ticker = %ticker, reason = %reason, "stage skipped");
    }
    info!(
        processed = ?report.processed,
        correlated = ?report.correlated,
        "Batch summary"
    );
    Ok(())
}

async fn serve(config: PipelineConfig) -> anyhow::Result<()> {
    let output_dir = config.output_dir.clone();
    let state = Arc::new(
        tokio::task::spawn_blocking(move || AppState::new(output_dir))
            .await
            .context("initial load panicked")?,
    );
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("Data service shut down complete.");
    Ok(())
}
