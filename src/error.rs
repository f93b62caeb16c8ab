//! # Error Types
//!
//! Custom error types for the EnOcean gateway using `thiserror`.
//!
//! Each protocol layer has its own error enum so a rejected frame can be
//! reported with the exact reason. All of them are frame-local: the pipeline
//! logs the error, drops the frame and keeps going.

use thiserror::Error;

use crate::eep::Profile;

/// Errors raised while validating the ESP3 envelope of a complete frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("frame too short: {len} bytes, need at least 6")]
    TooShort { len: usize },

    #[error("invalid sync byte: 0x{0:02X}")]
    BadSync(u8),

    #[error("header CRC8 mismatch: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    HeaderChecksumMismatch { expected: u8, calculated: u8 },

    #[error("unsupported packet type: {0}")]
    UnsupportedPacketType(u8),

    #[error("frame length mismatch: header announces {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("frame of {0} bytes exceeds the ESP3 maximum")]
    OversizedFrame(usize),
}

/// Errors raised while decomposing an ERP2 radio telegram
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelegramError {
    #[error("unsupported ERP2 layout for data length {0} (need more than 6 bytes)")]
    UnsupportedShortTelegram(u16),

    #[error("unsupported address control: 0b{0:03b}")]
    UnsupportedAddressControl(u8),

    #[error("unsupported telegram kind: 0b{kind:04b} (extended kind {extended_kind:?})")]
    UnsupportedTelegramKind { kind: u8, extended_kind: Option<u8> },

    #[error("data CRC8 mismatch: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    DataChecksumMismatch { expected: u8, calculated: u8 },

    #[error("trailer CRC8 mismatch: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    OptionalChecksumMismatch { expected: u8, calculated: u8 },

    #[error("telegram truncated: need {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },
}

/// Errors raised while turning a telegram into a sensor reading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("profile {profile} needs data byte {index}, telegram carries {len}")]
    MissingDataByte {
        profile: Profile,
        index: usize,
        len: usize,
    },

    #[error("device id {0} is not in the device list")]
    UnmappedDevice(String),

    #[error("unsupported device model {model} (id {id})")]
    UnsupportedModel { id: String, model: String },
}

impl DecodeError {
    /// True for the expected gaps (devices we do not monitor) as opposed to corrupt data
    pub fn is_expected_gap(&self) -> bool {
        matches!(
            self,
            DecodeError::UnmappedDevice(_) | DecodeError::UnsupportedModel { .. }
        )
    }
}

/// Main error type for the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// ESP3 envelope errors
    #[error("ESP3 envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// ERP2 telegram errors
    #[error("ERP2 telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Profile decoding and device dispatch errors
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Reading sink errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_gaps() {
        assert!(DecodeError::UnmappedDevice("0400abcd".into()).is_expected_gap());
        assert!(DecodeError::UnsupportedModel {
            id: "0400abcd".into(),
            model: "FOO".into(),
        }
        .is_expected_gap());
        assert!(!DecodeError::MissingDataByte {
            profile: Profile::TemperatureSetPoint,
            index: 2,
            len: 1,
        }
        .is_expected_gap());
    }

    #[test]
    fn test_error_messages() {
        let err = EnvelopeError::BadSync(0xAA);
        assert_eq!(err.to_string(), "invalid sync byte: 0xAA");

        let err = TelegramError::UnsupportedAddressControl(0b101);
        assert_eq!(err.to_string(), "unsupported address control: 0b101");

        let err: GatewayError = TelegramError::UnsupportedShortTelegram(6).into();
        assert!(err.to_string().contains("data length 6"));
    }
}
