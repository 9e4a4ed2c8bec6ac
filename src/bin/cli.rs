//! Miner CLI
//!
//! Mines delivery-job records from the courier dispatch portal, one date
//! at a time, and exports them as JSON for downstream processing.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use miner::{
    error::{AppError, Result},
    models::{Config, ExtractionProfile},
    pipeline::Miner,
    services::{PortalClient, RecordAssembler},
    storage::{self, CachePolicy, JobCache},
};

/// miner - Courier Job Miner
#[derive(Parser, Debug)]
#[command(name = "miner", version, about = "Courier portal job miner")]
struct Cli {
    /// Path to storage directory containing config, cache and output
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine job records for one or more dates
    Mine {
        /// Date(s) to mine, YYYY-MM-DD
        #[arg(long, required = true)]
        date: Vec<NaiveDate>,

        /// Re-fetch every document, overwriting cache entries
        #[arg(long, conflicts_with = "offline")]
        refresh: bool,

        /// Mine cached documents only, no network
        #[arg(long)]
        offline: bool,

        /// Portal username (or MINER_USERNAME)
        #[arg(long)]
        username: Option<String>,

        /// Portal password (or MINER_PASSWORD)
        #[arg(long)]
        password: Option<String>,
    },

    /// Validate configuration and compile the extraction profile
    Validate,

    /// Show cache contents for a date
    Info {
        /// Date to inspect, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// A credential from a flag or the environment.
fn credential(flag: Option<String>, env_var: &str) -> Result<String> {
    flag.or_else(|| std::env::var(env_var).ok())
        .ok_or_else(|| AppError::config(format!("missing credential: set {env_var} or pass a flag")))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    match cli.command {
        Command::Mine {
            date,
            refresh,
            offline,
            username,
            password,
        } => {
            config.validate()?;

            let policy = if offline {
                CachePolicy::NeverFetch
            } else if refresh {
                CachePolicy::AlwaysFetch
            } else {
                CachePolicy::FetchIfAbsent
            };

            let cache = JobCache::new(cli.storage_dir.join(&config.storage.cache_dir));
            let assembler =
                RecordAssembler::new(ExtractionProfile::compile(&config.profile)?);
            let portal = PortalClient::new(&config.portal)?;

            if !offline {
                let username = credential(username, "MINER_USERNAME")?;
                let password = credential(password, "MINER_PASSWORD")?;
                portal.login(&username, &password)?;
            }

            let miner = Miner::new(&portal, &cache, &assembler, &config.portal)?;
            let output_dir = cli.storage_dir.join(&config.storage.output_dir);

            let mut failed_dates = 0;
            for date in &date {
                // A failed date (discovery error) is logged and skipped;
                // the remaining dates are still mined.
                let outcome = match miner.mine(*date, policy) {
                    Ok(outcome) => outcome,
                    Err(error) => {
                        log::error!("{date}: skipped: {error}");
                        failed_dates += 1;
                        continue;
                    }
                };

                for diagnostic in outcome.diagnostics() {
                    log::warn!("{date}: {}", diagnostic.message);
                }

                let path = storage::write_outcome(&output_dir, &outcome)?;
                log::info!(
                    "{date}: wrote {} record(s) and {} failure(s) to {}",
                    outcome.jobs.len(),
                    outcome.failures.len(),
                    path.display()
                );
            }

            if failed_dates == date.len() {
                return Err(AppError::discovery("every requested date failed"));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("Config OK (portal, blueprints and anchors compile)");
        }

        Command::Info { date } => {
            let cache = JobCache::new(cli.storage_dir.join(&config.storage.cache_dir));
            let entries = cache.entries(date)?;
            log::info!("Cache directory: {}", cache.root().display());
            log::info!("{date}: {} cached document(s)", entries.len());
            for uuid in entries {
                log::info!("  {uuid}");
            }
        }
    }

    Ok(())
}
