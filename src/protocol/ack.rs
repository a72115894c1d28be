//! Inbound acknowledgment accumulation
//!
//! The sensor link is a continuous byte stream. The receive path keeps the
//! last six bytes seen and, whenever they equal the packet header, zeroes
//! the acknowledgment window and starts filling it again. The header's last
//! byte (`0xFF`) therefore lands at offset 0 and the reply is laid out as:
//!
//! ```text
//! offset  0     1        2..3         4          5..6       7..8
//!         0xFF  ident    length (BE)  confirm    data word  score (search)
//! ```
//!
//! Bytes past the end of the window are dropped, never wrapped.

use crate::config::protocol::{ACK_BUFFER_SIZE, ACK_PACKET_ID, HEADER};

/// Number of bytes before the confirmation code (0xFF, ident, length)
const PREAMBLE_LEN: usize = 4;

/// Snapshot of the acknowledgment window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckFrame {
    bytes: [u8; ACK_BUFFER_SIZE],
}

impl AckFrame {
    /// Wrap a raw window
    pub const fn from_bytes(bytes: [u8; ACK_BUFFER_SIZE]) -> Self {
        Self { bytes }
    }

    /// An all-zero window, what the buffer holds before any reply
    pub const fn empty() -> Self {
        Self::from_bytes([0; ACK_BUFFER_SIZE])
    }

    /// Raw window contents
    pub fn as_bytes(&self) -> &[u8; ACK_BUFFER_SIZE] {
        &self.bytes
    }

    /// Packet identifier (offset 1)
    pub fn packet_id(&self) -> u8 {
        self.bytes[1]
    }

    /// True if this window holds an acknowledge packet
    pub fn is_ack(&self) -> bool {
        self.packet_id() == ACK_PACKET_ID
    }

    /// Packet length field (offsets 2-3)
    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.bytes[2], self.bytes[3]])
    }

    /// Confirmation code (offset 4)
    pub fn confirmation_code(&self) -> u8 {
        self.bytes[4]
    }

    /// Auxiliary data word (offsets 5-6): matched page on a search, template
    /// count on a template-count query
    pub fn data_word(&self) -> u16 {
        u16::from_be_bytes([self.bytes[5], self.bytes[6]])
    }

    /// Match score of a search reply (offsets 7-8)
    pub fn match_score(&self) -> u16 {
        u16::from_be_bytes([self.bytes[7], self.bytes[8]])
    }

    /// Number of window bytes the frame occupies according to its length
    /// field, capped at the window size
    pub fn frame_len(&self) -> usize {
        core::cmp::min(PREAMBLE_LEN + self.length() as usize, ACK_BUFFER_SIZE)
    }

    /// Verify the trailing checksum.
    ///
    /// Returns `None` when the frame is longer than the window, since the
    /// checksum bytes were dropped.
    pub fn checksum_ok(&self) -> Option<bool> {
        let total = PREAMBLE_LEN + self.length() as usize;
        if total > ACK_BUFFER_SIZE {
            return None;
        }
        if self.length() < 2 {
            return Some(false);
        }

        let expected = u16::from_be_bytes([self.bytes[total - 2], self.bytes[total - 1]]);
        Some(crate::protocol::packet::checksum(&self.bytes[1..total - 2]) == expected)
    }

    /// Build a well-formed acknowledge reply (test helper)
    #[cfg(test)]
    pub fn reply(code: u8, data: &[u8]) -> Self {
        let mut bytes = [0u8; ACK_BUFFER_SIZE];
        let length = (data.len() + 3) as u16;
        bytes[0] = 0xFF;
        bytes[1] = ACK_PACKET_ID;
        bytes[2..4].copy_from_slice(&length.to_be_bytes());
        bytes[4] = code;
        bytes[5..5 + data.len()].copy_from_slice(data);

        let end = 5 + data.len();
        let sum = crate::protocol::packet::checksum(&bytes[1..end]);
        bytes[end..end + 2].copy_from_slice(&sum.to_be_bytes());
        Self { bytes }
    }
}

impl Default for AckFrame {
    fn default() -> Self {
        Self::empty()
    }
}

/// Header-synchronised accumulator driven one byte at a time from the
/// receive interrupt.
pub struct AckAccumulator {
    recent: [u8; HEADER.len()],
    seen: usize,
    buffer: [u8; ACK_BUFFER_SIZE],
    index: usize,
    synced: bool,
    delivered: bool,
}

impl AckAccumulator {
    /// Create an empty accumulator
    pub const fn new() -> Self {
        Self {
            recent: [0; HEADER.len()],
            seen: 0,
            buffer: [0; ACK_BUFFER_SIZE],
            index: 0,
            synced: false,
            delivered: false,
        }
    }

    /// Push one received byte.
    ///
    /// Returns `Some(frame)` exactly once per reply, when the number of
    /// bytes announced by its length field has arrived (or the window is
    /// full). Frames whose checksum does not match are dropped.
    pub fn push(&mut self, byte: u8) -> Option<AckFrame> {
        self.recent.copy_within(1.., 0);
        self.recent[HEADER.len() - 1] = byte;
        if self.seen < HEADER.len() {
            self.seen += 1;
        }

        if self.seen == HEADER.len() && self.recent == HEADER {
            self.buffer = [0; ACK_BUFFER_SIZE];
            self.index = 0;
            self.synced = true;
            self.delivered = false;
        }

        if self.index < ACK_BUFFER_SIZE {
            self.buffer[self.index] = byte;
            self.index += 1;
        }

        if !self.synced || self.delivered || self.index < PREAMBLE_LEN {
            return None;
        }

        let frame = AckFrame::from_bytes(self.buffer);
        if self.index < frame.frame_len() {
            return None;
        }

        self.delivered = true;
        match frame.checksum_ok() {
            Some(false) => {
                log::warn!("Sensor reply checksum mismatch: {:02x?}", frame.as_bytes());
                None
            }
            _ => Some(frame),
        }
    }

    /// Current window contents, complete or not
    pub fn snapshot(&self) -> AckFrame {
        AckFrame::from_bytes(self.buffer)
    }

    /// Number of bytes stored in the window
    pub fn len(&self) -> usize {
        self.index
    }

    /// True if nothing has been stored since the last header
    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    /// Forget everything, including header synchronisation
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for AckAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
