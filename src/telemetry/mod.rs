//! # Telemetry Module
//!
//! Hands decoded readings to the outside world.
//!
//! This module handles:
//! - The `ReadingSink` boundary the pipeline writes to
//! - Formatting readings as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;
pub mod types;

pub use logger::JsonlLogger;
pub use types::ReadingRecord;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::pipeline::SensorEvent;

/// Destination for decoded readings
#[cfg_attr(test, mockall::automock)]
pub trait ReadingSink: Send {
    fn record(&mut self, event: &SensorEvent) -> Result<()>;
}

/// Sink that only logs the JSONL row; used when telemetry files are disabled
#[derive(Debug, Default)]
pub struct TracingSink;

impl ReadingSink for TracingSink {
    fn record(&mut self, event: &SensorEvent) -> Result<()> {
        let row = serde_json::to_string(&ReadingRecord::from_event(event, Utc::now()))?;
        debug!(target: "enocean_gateway::readings", "{}", row);
        Ok(())
    }
}

impl<S: ReadingSink + ?Sized> ReadingSink for Box<S> {
    fn record(&mut self, event: &SensorEvent) -> Result<()> {
        (**self).record(event)
    }
}

/// Pick the reading sink for the telemetry settings
///
/// A reading log directory that cannot be created is not fatal: the
/// gateway keeps running with `TracingSink`.
pub fn sink_from_config(config: &TelemetryConfig) -> Box<dyn ReadingSink> {
    if !config.enabled {
        info!("Reading log disabled");
        return Box::new(TracingSink);
    }

    match JsonlLogger::from_config(config) {
        Ok(logger) => Box::new(logger),
        Err(e) => {
            warn!(
                "Cannot write readings to {}: {}; logging them only",
                config.log_dir, e
            );
            Box::new(TracingSink)
        }
    }
}
