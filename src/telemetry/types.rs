//! JSONL row layout

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::eep::{Profile, Reading};
use crate::esp3::protocol::hex_id;
use crate::pipeline::SensorEvent;

/// One line of the reading log
#[derive(Debug, Clone, Serialize)]
pub struct ReadingRecord {
    pub timestamp: DateTime<Utc>,
    pub originator_id: String,
    pub device_model: String,
    pub profile: Profile,
    pub telegram_kind: &'static str,
    /// Raw data bytes as hex
    pub data: String,
    pub signal_strength_dbm: i16,
    pub reading: Reading,
}

impl ReadingRecord {
    pub fn from_event(event: &SensorEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            originator_id: event.device.id.clone(),
            device_model: event.device.model.clone(),
            profile: event.device.profile,
            telegram_kind: event.telegram.kind.label(),
            data: hex_id(&event.telegram.data),
            signal_strength_dbm: event.telegram.signal_strength_dbm,
            reading: event.reading.clone(),
        }
    }
}
