//! # ESP3 Frame Assembler
//!
//! Cuts the continuous serial byte stream into complete ESP3 frames.
//!
//! The assembler only looks at the sync byte and the length fields. Checksums
//! are left to the envelope parser, so a frame with a damaged header CRC is
//! still emitted (and then rejected) and the stream stays aligned.

use bytes::BytesMut;
use tracing::{debug, warn};

use super::protocol::{frame_length, RawFrame, ESP3_MAX_PACKET_SIZE, ESP3_SYNC_BYTE};

/// Assembler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitSync,
    ReadLenHi,
    ReadLenLo { hi: u8 },
    ReadOptLen { data_length: u16 },
    ReadBody { total_length: usize },
}

/// Framing counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FramingStats {
    /// Complete frames emitted
    pub frames: u64,
    /// Bytes dropped while hunting for a sync byte
    pub discarded_bytes: u64,
    /// Headers announcing more than the ESP3 maximum
    pub oversized: u64,
}

/// Byte-at-a-time ESP3 frame assembler
#[derive(Debug)]
pub struct FrameAssembler {
    state: State,
    buffer: BytesMut,
    stats: FramingStats,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            state: State::WaitSync,
            buffer: BytesMut::with_capacity(64),
            stats: FramingStats::default(),
        }
    }

    /// Consume one byte; returns a frame when this byte completes one
    ///
    /// # Examples
    ///
    /// ```
    /// use enocean_gateway::esp3::assembler::FrameAssembler;
    ///
    /// let mut assembler = FrameAssembler::new();
    /// // Noise before the sync byte is skipped
    /// assert!(assembler.assemble(0x00).is_none());
    /// assert!(assembler.assemble(0x55).is_none());
    /// ```
    pub fn assemble(&mut self, byte: u8) -> Option<RawFrame> {
        match self.state {
            State::WaitSync => {
                if byte == ESP3_SYNC_BYTE {
                    self.buffer.clear();
                    self.buffer.extend_from_slice(&[byte]);
                    self.state = State::ReadLenHi;
                } else {
                    self.stats.discarded_bytes += 1;
                }
                None
            }
            State::ReadLenHi => {
                self.buffer.extend_from_slice(&[byte]);
                self.state = State::ReadLenLo { hi: byte };
                None
            }
            State::ReadLenLo { hi } => {
                self.buffer.extend_from_slice(&[byte]);
                self.state = State::ReadOptLen {
                    data_length: u16::from_be_bytes([hi, byte]),
                };
                None
            }
            State::ReadOptLen { data_length } => {
                self.buffer.extend_from_slice(&[byte]);
                let total_length = frame_length(data_length, byte);

                if total_length > ESP3_MAX_PACKET_SIZE {
                    warn!(
                        total_length,
                        "ESP3 header exceeds max packet length, resynchronizing"
                    );
                    self.stats.oversized += 1;
                    self.stats.discarded_bytes += self.buffer.len() as u64;
                    self.reset();
                    return None;
                }

                self.buffer.reserve(total_length - self.buffer.len());
                self.state = State::ReadBody { total_length };
                None
            }
            State::ReadBody { total_length } => {
                self.buffer.extend_from_slice(&[byte]);
                if self.buffer.len() < total_length {
                    return None;
                }

                let frame = RawFrame::new(self.buffer.split().freeze());
                self.state = State::WaitSync;
                self.stats.frames += 1;
                debug!(len = frame.len(), "ESP3 frame assembled");
                Some(frame)
            }
        }
    }

    /// Consume a chunk of bytes, returning every frame it completes
    pub fn feed(&mut self, data: &[u8]) -> Vec<RawFrame> {
        data.iter().filter_map(|&b| self.assemble(b)).collect()
    }

    /// True while no partial frame is buffered
    pub fn is_idle(&self) -> bool {
        self.state == State::WaitSync
    }

    pub fn stats(&self) -> FramingStats {
        self.stats
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::WaitSync;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp3::testing::{build_erp2_payload, build_frame};

    fn sample_frame() -> Vec<u8> {
        let payload = build_erp2_payload(
            0x22,
            &[0x04, 0x00, 0xAB, 0xCD],
            &[0x00, 0x98, 0xC1, 0x08],
        );
        build_frame(&payload, &[0x01, 0x3C])
    }

    #[test]
    fn test_single_frame_byte_by_byte() {
        let frame = sample_frame();
        let mut assembler = FrameAssembler::new();

        let (last, head) = frame.split_last().unwrap();
        for &b in head {
            assert!(assembler.assemble(b).is_none());
        }
        let emitted = assembler.assemble(*last).expect("frame should complete");
        assert_eq!(emitted.as_bytes(), frame.as_slice());
        assert!(assembler.is_idle());
        assert_eq!(assembler.stats().frames, 1);
    }

    #[test]
    fn test_split_at_every_boundary() {
        let frame = sample_frame();

        for split in 0..=frame.len() {
            let mut assembler = FrameAssembler::new();
            let mut frames = assembler.feed(&frame[..split]);
            frames.extend(assembler.feed(&frame[split..]));

            assert_eq!(frames.len(), 1, "split at {}", split);
            assert_eq!(frames[0].as_bytes(), frame.as_slice());
        }
    }

    #[test]
    fn test_three_way_split() {
        let frame = sample_frame();
        let mut assembler = FrameAssembler::new();

        let mut frames = assembler.feed(&frame[..2]);
        frames.extend(assembler.feed(&frame[2..9]));
        frames.extend(assembler.feed(&frame[9..]));

        assert_eq!(frames, vec![RawFrame::from(frame)]);
    }

    #[test]
    fn test_garbage_before_sync_is_discarded() {
        let frame = sample_frame();
        let mut stream = vec![0x00, 0xFF, 0x12, 0xAA, 0x54];
        stream.extend_from_slice(&frame);

        let mut assembler = FrameAssembler::new();
        let frames = assembler.feed(&stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), frame.as_slice());
        assert_eq!(assembler.stats().discarded_bytes, 5);
    }

    #[test]
    fn test_back_to_back_frames() {
        let frame = sample_frame();
        let mut stream = frame.clone();
        stream.extend_from_slice(&frame);

        let mut assembler = FrameAssembler::new();
        let frames = assembler.feed(&stream);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.as_bytes() == frame.as_slice()));
    }

    #[test]
    fn test_oversized_header_resynchronizes() {
        // 0xFFFF data + 0xFF optional + 7 > 65535
        let mut stream = vec![ESP3_SYNC_BYTE, 0xFF, 0xFF, 0xFF];
        let frame = sample_frame();
        stream.extend_from_slice(&frame);

        let mut assembler = FrameAssembler::new();
        let frames = assembler.feed(&stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), frame.as_slice());
        assert_eq!(assembler.stats().oversized, 1);
    }

    #[test]
    fn test_largest_allowed_header_keeps_reading() {
        // 65528 + 0 + 7 == 65535 is still acceptable
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[ESP3_SYNC_BYTE, 0xFF, 0xF8, 0x00]);
        assert!(!assembler.is_idle());
        assert_eq!(assembler.stats().oversized, 0);
    }

    #[test]
    fn test_minimal_frame() {
        // data length 0, optional length 0: 7 bytes total
        let stream = [ESP3_SYNC_BYTE, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00];
        let mut assembler = FrameAssembler::new();
        let frames = assembler.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 7);
    }
}
