//! # ESP3 / ERP2 Protocol Constants and Types
//!
//! Core protocol definitions for the EnOcean Serial Protocol 3 envelope and
//! the EnOcean Radio Protocol 2 telegram carried inside it.

use bytes::Bytes;
use std::fmt;

/// ESP3 frame sync byte (always 0x55)
pub const ESP3_SYNC_BYTE: u8 = 0x55;

/// ESP3 header size: sync(1) + data length(2) + optional length(1) + type(1) + CRC8H(1)
pub const ESP3_HEADER_SIZE: usize = 6;

/// Maximum size of a transferred ESP3 packet
pub const ESP3_MAX_PACKET_SIZE: usize = 65_535;

/// Packet type 10: RADIO_ERP2
pub const ESP3_PACKET_TYPE_RADIO_ERP2: u8 = 10;

/// ERP2 payloads of this many bytes or fewer use a different layout
pub const ERP2_SHORT_TELEGRAM_MAX: u16 = 6;

/// ERP2 header: address control (top 3 bits)
pub const ERP2_HEADER_ADDRESS_CONTROL_MASK: u8 = 0b1110_0000;

/// ERP2 header: extended header available flag
pub const ERP2_HEADER_EXTENDED_HEADER_FLAG: u8 = 0b0001_0000;

/// ERP2 header: telegram type (low 4 bits)
pub const ERP2_HEADER_TELEGRAM_KIND_MASK: u8 = 0b0000_1111;

/// Telegram type value meaning "extended telegram type byte follows"
pub const ERP2_TELEGRAM_KIND_EXTENDED: u8 = 0b0000_1111;

/// Total frame length announced by a header
///
/// sync(1) + lengths/type(4) + CRC8H(1) + data + optional + CRC8D(1)
pub fn frame_length(data_length: u16, optional_length: u8) -> usize {
    ESP3_HEADER_SIZE + data_length as usize + optional_length as usize + 1
}

/// A complete, length-consistent ESP3 frame as cut from the byte stream
///
/// Nothing beyond the sync byte and the length fields has been validated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Bytes);

impl RawFrame {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn bytes(&self) -> &Bytes {
        &self.0
    }
}

impl From<Vec<u8>> for RawFrame {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Validated ESP3 envelope
///
/// `body` holds the data section immediately followed by the optional
/// section, which is exactly the span covered by the trailing CRC8D.
/// Only `parse_envelope` builds one, so the lengths always match `body`.
///
/// Fields are read-only outside the crate:
///
/// ```compile_fail
/// use enocean_gateway::esp3::{parse_envelope, RawFrame};
///
/// let frame = RawFrame::from(vec![0x55u8, 0x00, 0x07, 0x00, 0x0A, 0x00]);
/// if let Ok(mut envelope) = parse_envelope(&frame) {
///     envelope.data_length = 0;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub(crate) data_length: u16,
    pub(crate) optional_length: u8,
    pub(crate) packet_type: u8,
    pub(crate) header_checksum: u8,
    pub(crate) trailer_checksum: u8,
    pub(crate) body: Bytes,
}

impl Envelope {
    pub fn data_length(&self) -> u16 {
        self.data_length
    }

    pub fn optional_length(&self) -> u8 {
        self.optional_length
    }

    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    /// CRC8H as received
    pub fn header_checksum(&self) -> u8 {
        self.header_checksum
    }

    /// CRC8D as received
    pub fn trailer_checksum(&self) -> u8 {
        self.trailer_checksum
    }

    /// Data section (`data_length` bytes)
    pub fn payload(&self) -> &[u8] {
        &self.body[..self.data_length as usize]
    }

    /// Optional section (`optional_length` bytes)
    pub fn optional(&self) -> &[u8] {
        &self.body[self.data_length as usize..]
    }

    /// Data and optional sections together
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// ERP2 addressing layout selected by the top three header bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressControl {
    /// 24-bit originator, no destination
    Originator24,
    /// 32-bit originator, no destination
    Originator32,
    /// 32-bit originator and 32-bit destination
    Originator32Destination32,
    /// 48-bit originator, no destination
    Originator48,
}

impl AddressControl {
    /// Decode the 3-bit selector (already shifted down)
    pub fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            0b000 => Some(AddressControl::Originator24),
            0b001 => Some(AddressControl::Originator32),
            0b010 => Some(AddressControl::Originator32Destination32),
            0b011 => Some(AddressControl::Originator48),
            _ => None,
        }
    }

    pub fn originator_len(self) -> usize {
        match self {
            AddressControl::Originator24 => 3,
            AddressControl::Originator32 | AddressControl::Originator32Destination32 => 4,
            AddressControl::Originator48 => 6,
        }
    }

    pub fn destination_len(self) -> usize {
        match self {
            AddressControl::Originator32Destination32 => 4,
            _ => 0,
        }
    }
}

/// ERP2 telegram type (R-ORG family) understood by this gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelegramKind {
    /// Repeated switch communication (rocker switches)
    Rps,
    /// 1-byte communication (contacts)
    OneByte,
    /// 4-byte communication (sensors)
    FourByte,
}

impl TelegramKind {
    pub fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            0 => Some(TelegramKind::Rps),
            1 => Some(TelegramKind::OneByte),
            2 => Some(TelegramKind::FourByte),
            _ => None,
        }
    }

    /// Number of data bytes carried by this kind
    pub fn data_len(self) -> usize {
        match self {
            TelegramKind::Rps | TelegramKind::OneByte => 1,
            TelegramKind::FourByte => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TelegramKind::Rps => "RPS",
            TelegramKind::OneByte => "1BS",
            TelegramKind::FourByte => "4BS",
        }
    }
}

impl fmt::Display for TelegramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded ERP2 header fields
///
/// The extended header and extended telegram type bytes are kept verbatim;
/// nothing in the gateway interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelegramHeader {
    pub address_control: AddressControl,
    pub extended_header: Option<u8>,
    pub kind_selector: u8,
    pub extended_kind: Option<u8>,
}

/// Decoded ERP2 radio telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    pub header: TelegramHeader,
    pub originator_id: Bytes,
    pub destination_id: Option<[u8; 4]>,
    pub kind: TelegramKind,
    pub data: Bytes,
    pub subtelegram_count: u8,
    pub signal_strength_dbm: i16,
}

/// Lowercase hex rendering used for device ids in logs and the device list
pub fn hex_id(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(ESP3_SYNC_BYTE, 0x55);
        assert_eq!(ESP3_HEADER_SIZE, 6);
        assert_eq!(ESP3_PACKET_TYPE_RADIO_ERP2, 10);
        assert_eq!(ESP3_MAX_PACKET_SIZE, 65_535);
    }

    #[test]
    fn test_frame_length() {
        assert_eq!(frame_length(0, 0), 7);
        assert_eq!(frame_length(10, 2), 19);
        assert_eq!(frame_length(u16::MAX, u8::MAX), 65_535 + 255 + 7);
    }

    #[test]
    fn test_address_control_layouts() {
        let ac = AddressControl::from_selector(0b000).unwrap();
        assert_eq!((ac.originator_len(), ac.destination_len()), (3, 0));
        let ac = AddressControl::from_selector(0b001).unwrap();
        assert_eq!((ac.originator_len(), ac.destination_len()), (4, 0));
        let ac = AddressControl::from_selector(0b010).unwrap();
        assert_eq!((ac.originator_len(), ac.destination_len()), (4, 4));
        let ac = AddressControl::from_selector(0b011).unwrap();
        assert_eq!((ac.originator_len(), ac.destination_len()), (6, 0));

        for selector in 0b100..=0b111 {
            assert!(AddressControl::from_selector(selector).is_none());
        }
    }

    #[test]
    fn test_telegram_kind() {
        assert_eq!(TelegramKind::from_selector(0), Some(TelegramKind::Rps));
        assert_eq!(TelegramKind::from_selector(1), Some(TelegramKind::OneByte));
        assert_eq!(TelegramKind::from_selector(2), Some(TelegramKind::FourByte));
        assert_eq!(TelegramKind::from_selector(ERP2_TELEGRAM_KIND_EXTENDED), None);

        assert_eq!(TelegramKind::Rps.data_len(), 1);
        assert_eq!(TelegramKind::OneByte.data_len(), 1);
        assert_eq!(TelegramKind::FourByte.data_len(), 4);
        assert_eq!(TelegramKind::FourByte.to_string(), "4BS");
    }

    #[test]
    fn test_hex_id() {
        assert_eq!(hex_id(&[0x04, 0x00, 0xAB, 0xCD]), "0400abcd");
        assert_eq!(hex_id(&[]), "");
    }

    #[test]
    fn test_envelope_sections() {
        let envelope = Envelope {
            data_length: 3,
            optional_length: 2,
            packet_type: ESP3_PACKET_TYPE_RADIO_ERP2,
            header_checksum: 0,
            trailer_checksum: 0,
            body: Bytes::from_static(&[1, 2, 3, 4, 5]),
        };
        assert_eq!(envelope.payload(), &[1, 2, 3]);
        assert_eq!(envelope.optional(), &[4, 5]);
        assert_eq!(envelope.body(), &[1, 2, 3, 4, 5]);
    }
}
