//! Command-line entry point
//!
//! Usage: `nayade-harvest [config.json] [first_code] [last_code]`
//!
//! Loads the configuration (defaults if the file is absent), reads the
//! attribution snapshot, runs the harvest with a progress line on stderr and
//! writes the latest, history and log payloads to the configured paths.

use clap::Parser;
use nayade_harvest::progress::PROGRESS_INTERVAL;
use nayade_harvest::{AttributionStore, Error, HarvestConfig, Harvester, Result, TerminalProgress};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nayade-harvest")]
#[command(about = "Harvests bathing-water quality data from the Náyade portal into CSV files")]
#[command(version)]
struct Cli {
    #[arg(default_value = "config.json", help = "Path to the JSON configuration file")]
    config: PathBuf,
    #[arg(help = "First zone code to harvest, overrides the configuration")]
    first: Option<u32>,
    #[arg(help = "Last zone code to harvest, overrides the configuration")]
    last: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::TransportExhausted { url, attempts, .. }) => {
            eprintln!(
                "Error: the portal did not answer {} after {} attempts, try again later",
                url, attempts
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;

    let mut config = if config_path.exists() {
        HarvestConfig::from_json_file(&config_path)?
    } else {
        tracing::warn!(path = %config_path.display(), "Config file not found, using defaults");
        HarvestConfig::default()
    };

    // Optional code range override, mostly for trying a handful of zones
    if let Some(first) = cli.first {
        config.first_code = first;
    }
    if let Some(last) = cli.last {
        config.last_code = last;
    }
    config.validate()?;

    let attribution = load_attribution(&config)?;
    let output = config.output.clone();

    let harvester = Harvester::new(config, attribution)?
        .with_progress(Box::new(TerminalProgress), PROGRESS_INTERVAL);

    let cancel = harvester.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, stopping workers");
            cancel.cancel();
        }
    });

    let result = harvester.run().await?;

    write_payload(&output.latest, &result.latest_csv()?).await?;
    write_payload(&output.history, &result.history_csv()?).await?;
    write_payload(&output.log, &result.log_text()).await?;

    tracing::info!(
        latest = %output.latest.display(),
        history = %output.history.display(),
        log = %output.log.display(),
        "Wrote payloads"
    );
    Ok(())
}

fn load_attribution(config: &HarvestConfig) -> Result<AttributionStore> {
    let path = &config.output.attribution;
    if path.exists() {
        let store = AttributionStore::from_path(path, config.default_owner.clone())?;
        tracing::info!(path = %path.display(), attributions = store.len(), "Loaded attribution snapshot");
        Ok(store)
    } else {
        tracing::warn!(path = %path.display(), "Attribution snapshot not found, every point gets the default owner");
        Ok(AttributionStore::empty(config.default_owner.clone()))
    }
}

async fn write_payload(path: &Path, contents: &str) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        })
}
