//! reanalyzer CLI
//!
//! Consumes module change events from the local spool and re-runs analysis.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use reanalyzer::{
    error::Result,
    models::{ChangeEvent, Config},
    pipeline,
    queue::SpoolQueue,
};

/// reanalyzer - re-analyzes modules as change events arrive
#[derive(Parser, Debug)]
#[command(
    name = "reanalyzer",
    version,
    about = "Consumes module change events and re-runs analysis and scoring"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "reanalyzer.toml", global = true)]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consume change events and analyze the affected modules
    Consume {
        /// Number of modules processed concurrently (default: consumer.concurrency)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Exit once no delivery is available instead of polling
        #[arg(long)]
        drain: bool,
    },

    /// Enqueue a change event for a module
    Publish {
        /// Module name
        name: String,

        /// Push time in RFC 3339 (default: now)
        #[arg(long)]
        pushed_at: Option<DateTime<Utc>>,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize logging; `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config {}: {}", cli.config.display(), e);
            return Err(e);
        }
    };

    match cli.command {
        Command::Consume { concurrency, drain } => {
            if let Some(concurrency) = concurrency {
                config.consumer.concurrency = concurrency;
            }
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            let stats = pipeline::run_consumer(&config, drain).await?;
            log::info!(
                "Summary: {} analyzed, {} already fresh, {} blacklisted, {} unrecoverable",
                stats.analyzed,
                stats.fresh,
                stats.blacklisted,
                stats.unrecoverable
            );
        }

        Command::Publish { name, pushed_at } => {
            let event = ChangeEvent::new(name, pushed_at.unwrap_or_else(Utc::now));
            let queue = SpoolQueue::from_config(&config.queue);
            queue.init().await?;

            let delivery = queue.publish(event).await?;
            log::info!(
                "Enqueued {} as delivery {} (pushed at {})",
                delivery.event.name,
                delivery.id,
                delivery.event.pushed_at
            );
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!("    concurrency: {}", config.consumer.concurrency);
            log::info!("    spool: {}", config.queue.spool_dir.display());
            log::info!("    store: {}/{}", config.store.url, config.store.database);
            log::info!("    index: {}/{}", config.index.url, config.index.index);
            log::info!("    analyzer: {}", config.analyzer.url);
            log::info!("    scorer: {}", config.scorer.url);
            log::info!("    blacklisted modules: {}", config.blacklist.len());
            log::info!("    github tokens: {}", config.github.tokens.len());
            log::info!("    ref overrides: {}", config.refs.len());
        }
    }

    Ok(())
}
