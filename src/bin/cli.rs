//! OKR Crawler CLI
//!
//! One-shot execution entry point, intended to be invoked by an external
//! scheduler. Each `crawl` run produces a fresh timestamped snapshot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use okr_crawler::{
    config::Credentials,
    error::Result,
    models::Config,
    pipeline,
    storage::LocalStorage,
};

/// okr-crawler - Goals (OKR) hierarchy crawler
#[derive(Parser, Debug)]
#[command(
    name = "okr-crawler",
    version,
    about = "Crawls the Atlassian Goals (OKR) hierarchy into CSV snapshots"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one crawl and write a snapshot
    Crawl {
        /// Override the snapshot output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Load credentials from a config.env style file instead of the
        /// environment
        #[arg(long)]
        env_file: Option<PathBuf>,
    },

    /// Validate configuration files
    Validate,

    /// Show the latest run's statistics
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("OKR crawler starting...");

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Crawl {
            output_dir,
            env_file,
        } => {
            config.validate()?;

            let credentials = match env_file {
                Some(path) => Credentials::from_env_file(path)?,
                None => Credentials::from_env()?,
            };

            let root_dir =
                output_dir.unwrap_or_else(|| PathBuf::from(&config.output.root_dir));
            let storage = LocalStorage::new(root_dir, config.output.prefix.clone());

            let stats = pipeline::run_crawl(&config, &credentials, &storage).await?;

            log::info!(
                "Crawl complete: {} goals visited in batch {}",
                stats.visited_count,
                stats.batch
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (api identifiers, crawler limits, output)");

            log::info!("All validations passed!");
        }

        Command::Info => {
            let storage =
                LocalStorage::new(PathBuf::from(&config.output.root_dir), config.output.prefix.clone());

            match storage.load_stats().await? {
                Some(stats) => {
                    log::info!("Latest batch: {}", stats.batch);
                    log::info!(
                        "Visited {} goals from {} roots ({} failures, {} archived skipped)",
                        stats.visited_count,
                        stats.root_count,
                        stats.failure_count,
                        stats.skipped_archived_count
                    );
                    log::info!(
                        "Run {}",
                        if stats.aborted {
                            "aborted early"
                        } else {
                            "completed"
                        }
                    );
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
