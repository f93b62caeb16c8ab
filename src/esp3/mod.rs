//! # ESP3 Protocol Module
//!
//! Implementation of the EnOcean Serial Protocol 3 receive path.
//!
//! This module handles:
//! - Frame synchronization on the raw serial byte stream
//! - ESP3 envelope validation (header CRC8, packet type, lengths)
//! - RADIO_ERP2 telegram decoding (addressing, telegram type, data, RSSI)
//! - CRC8 checksum calculation

pub mod protocol;
pub mod assembler;
pub mod envelope;
pub mod telegram;
pub mod crc;

pub use assembler::FrameAssembler;
pub use envelope::parse_envelope;
pub use protocol::{Envelope, RawFrame, Telegram, TelegramKind};
pub use telegram::parse_telegram;
