//! Outbound packet encoding for the AS608 command protocol
//!
//! Every packet on the wire looks like:
//! ```text
//! [EF 01][FF FF FF FF][ident: u8][length: u16 BE][instruction][params...][checksum: u16 BE]
//! ```
//!
//! The fixed six bytes (start code plus the default module address) are
//! written by [`PacketWriter::write_header`]. Everything after the header is
//! a command table: the precomputed tables in [`crate::sensor::commands`]
//! already carry their checksum, only the Store command computes one at
//! runtime.

use crate::config::protocol::{HEADER, MAX_PACKET_SIZE};
use heapless::Vec;

/// Errors that can occur while encoding a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Command table does not fit in a single packet
    TooLong,
}

/// A complete outbound packet, header included
pub type Packet = Vec<u8, MAX_PACKET_SIZE>;

/// Builds packets for the sensor.
///
/// A writer is always created with the header already in place, so no
/// packet can leave without it.
pub struct PacketWriter {
    buffer: Packet,
}

impl PacketWriter {
    /// Create a writer holding just the header
    pub fn new() -> Self {
        let mut writer = Self { buffer: Vec::new() };
        writer.write_header();
        writer
    }

    /// Write the fixed header, discarding anything written so far
    pub fn write_header(&mut self) {
        self.buffer.clear();
        // HEADER is shorter than MAX_PACKET_SIZE, this cannot fail
        let _ = self.buffer.extend_from_slice(&HEADER);
    }

    /// Append a command table verbatim
    pub fn write_command(&mut self, table: &[u8]) -> Result<(), EncodeError> {
        self.buffer
            .extend_from_slice(table)
            .map_err(|_| EncodeError::TooLong)
    }

    /// Finish and return the packet
    pub fn finish(self) -> Packet {
        self.buffer
    }
}

impl Default for PacketWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Packet consisting of the header alone
pub fn send_header() -> Packet {
    PacketWriter::new().finish()
}

/// Encode a command table into a complete packet
pub fn encode_command(table: &[u8]) -> Result<Packet, EncodeError> {
    let mut writer = PacketWriter::new();
    writer.write_command(table)?;
    Ok(writer.finish())
}

/// Additive checksum used by the protocol: the sum of every byte after the
/// header, truncated to 16 bits.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}
