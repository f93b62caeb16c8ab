//! # EnOcean Gateway
//!
//! Receive EnOcean radio telegrams from an ESP3 transceiver and log decoded
//! sensor readings.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use enocean_gateway::config::{Config, LoggingConfig};
use enocean_gateway::pipeline::{run_consumer, run_reader, ConsumerStats, FrameProcessor};
use enocean_gateway::serial::EnoceanSerial;
use enocean_gateway::telemetry::sink_from_config;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the daily application log
const APP_LOG_PREFIX: &str = "enocean-gateway.log";

/// Main entry point for the EnOcean gateway
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (`enocean-gateway [CONFIG_PATH]`)
///    - Set up logging with tracing subscriber
///    - Open the transceiver serial port (configured path, then defaults)
///
/// 2. **Run**
///    - Reader task: serial bytes → frames → bounded channel
///    - Consumer task: frames → telegrams → readings → sink
///
/// 3. **Shutdown**
///    - Ctrl+C; read errors and empty reads are retried, never fatal
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be loaded or is invalid
/// - Serial port cannot be opened
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path(std::env::args().skip(1));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let _log_guard = init_logging(&config.logging)?;

    info!("EnOcean Gateway v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Loaded {} device(s) from {}",
        config.devices.len(),
        config_path.display()
    );

    let serial = EnoceanSerial::open_preferred(&config.serial.port, config.serial.baud_rate)
        .context("Failed to open EnOcean transceiver")?;
    info!("EnOcean serial port opened at: {}", serial.device_path());

    let sink = sink_from_config(&config.telemetry);

    let (tx, rx) = mpsc::channel(config.gateway.channel_capacity);
    let processor = FrameProcessor::new(config.device_directory());
    let retry_interval = Duration::from_millis(config.serial.retry_interval_ms);

    let mut reader = tokio::spawn(run_reader(serial, tx, retry_interval));
    let consumer = tokio::spawn(run_consumer(rx, processor, sink));

    info!("Press Ctrl+C to exit");

    tokio::select! {
        // The reader only returns once the consumer has gone away
        result = &mut reader => {
            match result {
                Ok(Ok(())) => warn!("Serial reader stopped: frame consumer is gone"),
                Ok(Err(e)) => error!("Serial reader stopped: {}", e),
                Err(e) => error!("Serial reader task failed: {}", e),
            }
            match consumer.await {
                Ok(stats) => log_totals(stats),
                Err(e) => error!("Frame consumer task failed: {}", e),
            }
        }

        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            reader.abort();
            if let Ok(stats) = consumer.await {
                log_totals(stats);
            }
        }
    }

    Ok(())
}

fn log_totals(stats: ConsumerStats) {
    info!(
        "Processed {} frame(s): {} reading(s), {} rejected, {} ignored",
        stats.frames, stats.readings, stats.rejected, stats.ignored
    );
}

/// First command line argument, or the default config path
fn config_path<I: Iterator<Item = String>>(mut args: I) -> PathBuf {
    args.next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Stdout logging, plus a daily file when `log_dir` is set
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must be held for the lifetime of the process to flush the file writer.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Invalid log filter")?;

    let (file_layer, guard) = if config.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.log_dir, APP_LOG_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
