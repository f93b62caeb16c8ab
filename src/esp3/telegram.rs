//! # ERP2 Telegram Parser
//!
//! Decomposes the data section of a RADIO_ERP2 envelope into addressing,
//! telegram type and data, and checks the telegram CRC and the trailing
//! data+optional CRC.

use bytes::Bytes;
use tracing::trace;

use super::crc::crc8;
use super::protocol::*;
use crate::error::TelegramError;

/// Read position over the envelope body (data section then optional section)
struct Cursor<'a> {
    body: &'a Bytes,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(body: &'a Bytes) -> Self {
        Self { body, offset: 0 }
    }

    fn take(&mut self, n: usize) -> Result<Bytes, TelegramError> {
        let end = self.offset + n;
        if end > self.body.len() {
            return Err(TelegramError::Truncated {
                needed: end,
                available: self.body.len(),
            });
        }
        let out = self.body.slice(self.offset..end);
        self.offset = end;
        Ok(out)
    }

    fn byte(&mut self) -> Result<u8, TelegramError> {
        Ok(self.take(1)?[0])
    }

    fn consumed(&self) -> &[u8] {
        &self.body[..self.offset]
    }
}

/// Decode the bit-packed ERP2 header byte and its optional extension bytes
fn parse_header(cursor: &mut Cursor<'_>) -> Result<TelegramHeader, TelegramError> {
    let header = cursor.byte()?;

    let selector = (header & ERP2_HEADER_ADDRESS_CONTROL_MASK) >> 5;
    let extended = header & ERP2_HEADER_EXTENDED_HEADER_FLAG != 0;
    let kind_selector = header & ERP2_HEADER_TELEGRAM_KIND_MASK;

    let extended_header = if extended { Some(cursor.byte()?) } else { None };
    let extended_kind = if kind_selector == ERP2_TELEGRAM_KIND_EXTENDED {
        Some(cursor.byte()?)
    } else {
        None
    };

    let address_control = AddressControl::from_selector(selector)
        .ok_or(TelegramError::UnsupportedAddressControl(selector))?;

    Ok(TelegramHeader {
        address_control,
        extended_header,
        kind_selector,
        extended_kind,
    })
}

/// Decode the ERP2 telegram carried by an envelope
///
/// # Arguments
///
/// * `envelope` - Validated RADIO_ERP2 envelope
///
/// # Returns
///
/// * `Result<Telegram, TelegramError>` - Decoded telegram
///
/// # Errors
///
/// Returns error if:
/// - The data section is 6 bytes or shorter (short ERP2 layout, not supported)
/// - The address control or telegram type is not one we understand
/// - The telegram CRC8 or the data+optional CRC8D does not match
/// - The layout announced by the header runs past the received bytes
pub fn parse_telegram(envelope: &Envelope) -> Result<Telegram, TelegramError> {
    if envelope.data_length() <= ERP2_SHORT_TELEGRAM_MAX {
        return Err(TelegramError::UnsupportedShortTelegram(envelope.data_length()));
    }

    let mut cursor = Cursor::new(&envelope.body);
    let header = parse_header(&mut cursor)?;
    trace!(?header, "ERP2 header");

    let originator_id = cursor.take(header.address_control.originator_len())?;
    let destination_id = match header.address_control.destination_len() {
        0 => None,
        _ => {
            let d = cursor.take(4)?;
            Some([d[0], d[1], d[2], d[3]])
        }
    };

    let kind = TelegramKind::from_selector(header.kind_selector).ok_or(
        TelegramError::UnsupportedTelegramKind {
            kind: header.kind_selector,
            extended_kind: header.extended_kind,
        },
    )?;
    let data = cursor.take(kind.data_len())?;

    // CRC over everything read from the data section so far
    let calculated = crc8(cursor.consumed());
    let data_crc = cursor.byte()?;
    if calculated != data_crc {
        return Err(TelegramError::DataChecksumMismatch {
            expected: data_crc,
            calculated,
        });
    }

    let subtelegram_count = cursor.byte()?;
    let signal_raw = cursor.byte()?;

    let calculated = crc8(envelope.body());
    if calculated != envelope.trailer_checksum() {
        return Err(TelegramError::OptionalChecksumMismatch {
            expected: envelope.trailer_checksum(),
            calculated,
        });
    }

    Ok(Telegram {
        header,
        originator_id,
        destination_id,
        kind,
        data,
        subtelegram_count,
        signal_strength_dbm: -(signal_raw as i16),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp3::envelope::parse_envelope;
    use crate::esp3::testing::{build_erp2_payload, build_frame, seal_payload};

    const ID4: [u8; 4] = [0x04, 0x00, 0xAB, 0xCD];
    const DATA_4BS: [u8; 4] = [0x00, 0x98, 0xC1, 0x08];

    fn envelope_for(payload: &[u8], optional: &[u8]) -> Envelope {
        let frame = build_frame(payload, optional);
        parse_envelope(&RawFrame::from(frame)).unwrap()
    }

    #[test]
    fn test_parse_4bs_id32() {
        let payload = build_erp2_payload(0b0010_0010, &ID4, &DATA_4BS);
        let telegram = parse_telegram(&envelope_for(&payload, &[0x01, 0x3C])).unwrap();

        assert_eq!(telegram.header.address_control, AddressControl::Originator32);
        assert_eq!(telegram.originator_id.as_ref(), &ID4);
        assert_eq!(telegram.destination_id, None);
        assert_eq!(telegram.kind, TelegramKind::FourByte);
        assert_eq!(telegram.data.as_ref(), &DATA_4BS);
        assert_eq!(telegram.subtelegram_count, 1);
        assert_eq!(telegram.signal_strength_dbm, -60);
        assert_eq!(telegram.header.extended_header, None);
        assert_eq!(telegram.header.extended_kind, None);
    }

    #[test]
    fn test_parse_rps_id32() {
        let payload = build_erp2_payload(0b0010_0000, &ID4, &[0b1000_0101]);
        let telegram = parse_telegram(&envelope_for(&payload, &[0x03, 0x50])).unwrap();

        assert_eq!(telegram.originator_id.as_ref(), &ID4);
        assert_eq!(telegram.kind, TelegramKind::Rps);
        assert_eq!(telegram.data.as_ref(), &[0b1000_0101]);
        assert_eq!(telegram.subtelegram_count, 3);
        assert_eq!(telegram.signal_strength_dbm, -80);
    }

    #[test]
    fn test_parse_4bs_id24() {
        let payload = build_erp2_payload(0b0000_0010, &[0x01, 0x02, 0x03], &DATA_4BS);
        let telegram = parse_telegram(&envelope_for(&payload, &[0x01, 0x50])).unwrap();

        assert_eq!(telegram.header.address_control, AddressControl::Originator24);
        assert_eq!(telegram.originator_id.as_ref(), &[0x01, 0x02, 0x03]);
        assert_eq!(telegram.destination_id, None);
        assert_eq!(telegram.data.as_ref(), &DATA_4BS);
    }

    #[test]
    fn test_rps_with_24bit_id_is_short_layout() {
        // header + 3-byte id + 1 data + CRC is exactly 6 bytes
        let payload = build_erp2_payload(0b0000_0000, &[0x01, 0x02, 0x03], &[0x10]);
        assert_eq!(payload.len(), 6);
        let result = parse_telegram(&envelope_for(&payload, &[0x01, 0x50]));
        assert_eq!(result, Err(TelegramError::UnsupportedShortTelegram(6)));
    }

    #[test]
    fn test_parse_1bs_id48() {
        let id = [0x00, 0x00, 0x04, 0x01, 0x02, 0x03];
        let payload = build_erp2_payload(0b0110_0001, &id, &[0b0000_1000]);
        let telegram = parse_telegram(&envelope_for(&payload, &[0x01, 0xFF])).unwrap();

        assert_eq!(telegram.header.address_control, AddressControl::Originator48);
        assert_eq!(telegram.originator_id.as_ref(), &id);
        assert_eq!(telegram.destination_id, None);
        assert_eq!(telegram.kind, TelegramKind::OneByte);
        assert_eq!(telegram.signal_strength_dbm, -255);
    }

    #[test]
    fn test_destination_only_for_selector_010() {
        let mut ids = ID4.to_vec();
        ids.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFE]);
        let payload = build_erp2_payload(0b0100_0010, &ids, &DATA_4BS);
        let telegram = parse_telegram(&envelope_for(&payload, &[0x01, 0x40])).unwrap();

        assert_eq!(telegram.header.address_control, AddressControl::Originator32Destination32);
        assert_eq!(telegram.originator_id.as_ref(), &ID4);
        assert_eq!(telegram.destination_id, Some([0xFF, 0xFF, 0xFF, 0xFE]));
        assert_eq!(telegram.data.as_ref(), &DATA_4BS);
    }

    #[test]
    fn test_extended_header_is_retained() {
        let mut raw = vec![0b0011_0010, 0xA7];
        raw.extend_from_slice(&ID4);
        raw.extend_from_slice(&DATA_4BS);
        let payload = seal_payload(&raw);

        let telegram = parse_telegram(&envelope_for(&payload, &[0x01, 0x3C])).unwrap();
        assert_eq!(telegram.header.extended_header, Some(0xA7));
        assert_eq!(telegram.originator_id.as_ref(), &ID4);
        assert_eq!(telegram.data.as_ref(), &DATA_4BS);
    }

    #[test]
    fn test_extended_kind_is_unsupported_but_retained() {
        let mut raw = vec![0b0010_1111, 0x30];
        raw.extend_from_slice(&ID4);
        raw.extend_from_slice(&DATA_4BS);
        let payload = seal_payload(&raw);

        let result = parse_telegram(&envelope_for(&payload, &[0x01, 0x3C]));
        assert_eq!(
            result,
            Err(TelegramError::UnsupportedTelegramKind {
                kind: 0b1111,
                extended_kind: Some(0x30),
            })
        );
    }

    #[test]
    fn test_unsupported_kind() {
        let payload = build_erp2_payload(0b0010_0101, &ID4, &DATA_4BS);
        let result = parse_telegram(&envelope_for(&payload, &[0x01, 0x3C]));
        assert_eq!(
            result,
            Err(TelegramError::UnsupportedTelegramKind {
                kind: 5,
                extended_kind: None
            })
        );
    }

    #[test]
    fn test_unsupported_address_control() {
        for header in [0b1000_0010u8, 0b1010_0010, 0b1100_0010, 0b1110_0010] {
            let payload = build_erp2_payload(header, &ID4, &DATA_4BS);
            let result = parse_telegram(&envelope_for(&payload, &[0x01, 0x3C]));
            assert_eq!(
                result,
                Err(TelegramError::UnsupportedAddressControl(header >> 5))
            );
        }
    }

    #[test]
    fn test_short_telegram_rejected() {
        let payload = [0x20, 0x01, 0x02, 0x03, 0x04, 0x08];
        let result = parse_telegram(&envelope_for(&payload, &[0x01, 0x3C]));
        assert_eq!(result, Err(TelegramError::UnsupportedShortTelegram(6)));
    }

    #[test]
    fn test_data_checksum_mismatch() {
        let mut payload = build_erp2_payload(0b0010_0010, &ID4, &DATA_4BS);
        let last = payload.len() - 1;
        payload[last] ^= 0x01;

        // build_frame recomputes CRC8D, so only the telegram CRC is wrong
        let result = parse_telegram(&envelope_for(&payload, &[0x01, 0x3C]));
        assert!(matches!(result, Err(TelegramError::DataChecksumMismatch { .. })));
    }

    #[test]
    fn test_optional_checksum_mismatch() {
        let payload = build_erp2_payload(0b0010_0010, &ID4, &DATA_4BS);
        let mut frame = build_frame(&payload, &[0x01, 0x3C]);
        let last = frame.len() - 1;
        frame[last] ^= 0x01;

        let envelope = parse_envelope(&RawFrame::from(frame)).unwrap();
        let result = parse_telegram(&envelope);
        assert!(matches!(result, Err(TelegramError::OptionalChecksumMismatch { .. })));
    }

    #[test]
    fn test_layout_past_end_is_truncated() {
        // Header claims a 4BS telegram with a 6-byte id: needs 12 bytes, only 9 sent
        let payload = [0b0110_0010, 1, 2, 3, 4, 5, 6, 7, 8];
        let result = parse_telegram(&envelope_for(&payload, &[]));
        assert!(matches!(result, Err(TelegramError::Truncated { .. })));
    }

    #[test]
    fn test_missing_trailer_is_truncated() {
        let payload = build_erp2_payload(0b0010_0010, &ID4, &DATA_4BS);
        let result = parse_telegram(&envelope_for(&payload, &[0x01]));
        assert_eq!(
            result,
            Err(TelegramError::Truncated {
                needed: 12,
                available: 11
            })
        );
    }

    #[test]
    fn test_parse_is_pure() {
        let payload = build_erp2_payload(0b0010_0010, &ID4, &DATA_4BS);
        let envelope = envelope_for(&payload, &[0x01, 0x3C]);
        let first = parse_telegram(&envelope).unwrap();
        let second = parse_telegram(&envelope).unwrap();
        assert_eq!(first, second);
    }
}
