//! # ESP3 Envelope Parser
//!
//! Validates a complete frame from the assembler and splits it into its
//! header fields, data section and optional section.

use super::crc::crc8;
use super::protocol::*;
use crate::error::EnvelopeError;

/// Decode and validate a complete ESP3 frame
///
/// # Arguments
///
/// * `frame` - Complete ESP3 frame (sync, header, CRC8H, data, optional, CRC8D)
///
/// # Returns
///
/// * `Result<Envelope, EnvelopeError>` - Decoded envelope, or why it was rejected
///
/// # Errors
///
/// Checks run in this order, the first failure wins:
/// - Frame shorter than the 6-byte header
/// - Sync byte is not 0x55
/// - CRC8H over the length and type fields does not match
/// - Packet type is not RADIO_ERP2
/// - Frame length disagrees with the header
/// - Frame exceeds the ESP3 maximum size
///
/// The trailing CRC8D is not checked here; the telegram parser owns it.
pub fn parse_envelope(frame: &RawFrame) -> Result<Envelope, EnvelopeError> {
    let bytes = frame.as_bytes();

    if bytes.len() < ESP3_HEADER_SIZE {
        return Err(EnvelopeError::TooShort { len: bytes.len() });
    }

    if bytes[0] != ESP3_SYNC_BYTE {
        return Err(EnvelopeError::BadSync(bytes[0]));
    }

    let data_length = u16::from_be_bytes([bytes[1], bytes[2]]);
    let optional_length = bytes[3];
    let packet_type = bytes[4];
    let header_checksum = bytes[5];

    let calculated = crc8(&bytes[1..5]);
    if calculated != header_checksum {
        return Err(EnvelopeError::HeaderChecksumMismatch {
            expected: header_checksum,
            calculated,
        });
    }

    if packet_type != ESP3_PACKET_TYPE_RADIO_ERP2 {
        return Err(EnvelopeError::UnsupportedPacketType(packet_type));
    }

    let expected = frame_length(data_length, optional_length);
    if bytes.len() != expected {
        return Err(EnvelopeError::LengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    if bytes.len() > ESP3_MAX_PACKET_SIZE {
        return Err(EnvelopeError::OversizedFrame(bytes.len()));
    }

    let trailer_checksum = bytes[bytes.len() - 1];
    let body = frame.bytes().slice(ESP3_HEADER_SIZE..bytes.len() - 1);

    Ok(Envelope {
        data_length,
        optional_length,
        packet_type,
        header_checksum,
        trailer_checksum,
        body,
    })
}
