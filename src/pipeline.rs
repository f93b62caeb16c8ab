//! # Frame Pipeline
//!
//! Two tasks joined by one bounded channel:
//!
//! ```text
//! serial port → reader (FrameAssembler) → mpsc<RawFrame> → consumer
//!     consumer: parse_envelope → parse_telegram → DeviceDirectory → decode → ReadingSink
//! ```
//!
//! The channel is bounded and the reader blocks when it is full. While
//! blocked, the reader stops pulling bytes off the port, so bursts are
//! absorbed by the OS serial buffer rather than by unbounded memory here.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::device::{DeviceDirectory, ResolvedDevice};
use crate::eep::{self, Reading};
use crate::error::{GatewayError, Result};
use crate::esp3::{parse_envelope, parse_telegram, FrameAssembler, RawFrame, Telegram};
use crate::serial::port_trait::SerialPortIO;
use crate::telemetry::ReadingSink;

/// Bytes requested from the port per read
const READ_CHUNK_SIZE: usize = 256;

/// A telegram from a known device, decoded into a reading
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub device: ResolvedDevice,
    pub telegram: Telegram,
    pub reading: Reading,
}

/// Turns raw frames into sensor events; holds only the immutable device directory
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    directory: DeviceDirectory,
}

impl FrameProcessor {
    pub fn new(directory: DeviceDirectory) -> Self {
        Self { directory }
    }

    /// Run one frame through envelope, telegram, lookup and profile decoding
    ///
    /// # Errors
    ///
    /// Any `EnvelopeError`, `TelegramError` or `DecodeError`, wrapped in
    /// `GatewayError`. All of them concern this frame only.
    pub fn process(&self, frame: &RawFrame) -> Result<SensorEvent> {
        let envelope = parse_envelope(frame)?;
        let telegram = parse_telegram(&envelope)?;
        let device = self.directory.resolve(&telegram.originator_id)?;
        let reading = eep::decode(device.profile, &telegram)?;

        Ok(SensorEvent {
            device,
            telegram,
            reading,
        })
    }
}

/// Counters kept by the consumer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStats {
    pub frames: u64,
    pub readings: u64,
    /// Envelope/telegram errors and corrupt data
    pub rejected: u64,
    /// Telegrams from devices that are not monitored
    pub ignored: u64,
    pub sink_errors: u64,
}

/// Reader task: pull bytes, assemble frames, push them to the consumer
///
/// Runs until the consumer is gone, then returns `Ok`. Read errors and
/// empty reads are logged and retried after `retry_interval`; the port is
/// never given up on.
pub async fn run_reader<P: SerialPortIO>(
    mut port: P,
    tx: mpsc::Sender<RawFrame>,
    retry_interval: Duration,
) -> Result<()> {
    let mut assembler = FrameAssembler::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];

    info!("Starting serial reader");

    loop {
        let read = tokio::select! {
            biased;
            _ = tx.closed() => {
                warn!("Frame consumer stopped, ending reader");
                return Ok(());
            }
            read = port.read(&mut buf) => read,
        };

        let n = match read {
            Ok(0) => {
                let stats = assembler.stats();
                debug!(
                    frames = stats.frames,
                    discarded = stats.discarded_bytes,
                    "Empty serial read, retrying in {:?}",
                    retry_interval
                );
                tokio::time::sleep(retry_interval).await;
                continue;
            }
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Serial read failed, retrying in {:?}", retry_interval);
                tokio::time::sleep(retry_interval).await;
                continue;
            }
        };

        for &byte in &buf[..n] {
            if let Some(frame) = assembler.assemble(byte) {
                debug!(len = frame.len(), frame = ?frame.as_bytes(), "Received ESP3 frame");
                if tx.send(frame).await.is_err() {
                    warn!("Frame consumer stopped, ending reader");
                    return Ok(());
                }
            }
        }
    }
}

/// Consumer task: process frames in arrival order until the channel closes
pub async fn run_consumer<S: ReadingSink>(
    mut rx: mpsc::Receiver<RawFrame>,
    processor: FrameProcessor,
    mut sink: S,
) -> ConsumerStats {
    let mut stats = ConsumerStats::default();

    info!("Starting frame consumer");

    while let Some(frame) = rx.recv().await {
        stats.frames += 1;
        handle_frame(&processor, &mut sink, &frame, &mut stats);
    }

    info!(
        frames = stats.frames,
        readings = stats.readings,
        rejected = stats.rejected,
        ignored = stats.ignored,
        "Frame consumer finished"
    );
    stats
}

fn handle_frame<S: ReadingSink>(
    processor: &FrameProcessor,
    sink: &mut S,
    frame: &RawFrame,
    stats: &mut ConsumerStats,
) {
    match processor.process(frame) {
        Ok(event) => {
            info!(
                id = %event.device.id,
                model = %event.device.model,
                kind = %event.telegram.kind,
                dbm = event.telegram.signal_strength_dbm,
                "{}",
                event.reading
            );
            stats.readings += 1;
            if let Err(e) = sink.record(&event) {
                warn!(error = %e, "Failed to record reading");
                stats.sink_errors += 1;
            }
        }
        Err(GatewayError::Decode(e)) if e.is_expected_gap() => {
            info!("Dropping telegram: {}", e);
            stats.ignored += 1;
        }
        Err(e) => {
            warn!(frame = ?frame.as_bytes(), "Rejected frame: {}", e);
            stats.rejected += 1;
        }
    }
}
