use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use routinely_host::config::{ConfigLoadError, RoutinelyConfig};
use routinely_host::{init_logging, shutdown_on_ctrl_c, RoutineHost};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enables debug mode (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Config file to load instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Override the configured tick interval
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Also write logs to the data directory
    #[arg(long)]
    log_file: bool,

    /// Write an example config and exit
    #[arg(long)]
    init: bool,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        match self.debug {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Load the config, falling back to defaults only when the default location
/// has no file. A missing explicit `--config` path is an error.
fn load_config(path: &Path, explicit: bool) -> Result<(RoutinelyConfig, bool)> {
    match RoutinelyConfig::load_from(path) {
        Ok(config) => Ok((config, false)),
        Err(ConfigLoadError::NotFound(_)) if !explicit => Ok((RoutinelyConfig::default(), true)),
        Err(err) => Err(err).context("Failed to load config"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(RoutinelyConfig::config_path);

    if cli.init {
        RoutinelyConfig::write_example(&config_path)?;
        eprintln!("Config file created at: {}", config_path.display());
        eprintln!("Edit the routines in it, then run routinely again.");
        return Ok(());
    }

    let (mut config, missing) = load_config(&config_path, cli.config.is_some())?;
    if let Some(ms) = cli.tick_interval_ms {
        config.scheduler.tick_interval_ms = ms;
    }

    let _guard = init_logging("routinely", cli.log_file || config.logging.file, cli.log_level())
        .context("Failed to initialize logging")?;

    if missing {
        info!(
            "No config at {}, running with defaults. Use --init to create one.",
            config_path.display()
        );
    }

    let mut host = RoutineHost::new(&config);
    host.initialize()?;

    let ticks = host.run(cli.ticks, shutdown_on_ctrl_c()).await;
    host.deinitialize();
    info!("Done after {} tick(s)", ticks);

    Ok(())
}
