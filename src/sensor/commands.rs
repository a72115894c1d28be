//! The sensor command catalogue
//!
//! Each command is a fixed table sent after the packet header:
//! ```text
//! [ident: 0x01][length: u16 BE][instruction][params...][checksum: u16 BE]
//! ```
//!
//! All tables except Store are constant and already carry their checksum.
//! Store embeds the target slot, so its checksum is computed per call.

use crate::config::protocol::{MAX_COMMAND_SIZE, SEARCH_PAGE_COUNT};
use crate::config::timing::{ACK_TIMEOUT_MS, SEARCH_ACK_TIMEOUT_MS};
use crate::protocol::packet::{encode_command, Packet};
use heapless::Vec;

/// Capture a fingerprint image (GenImg, 0x01)
pub const GET_IMAGE: [u8; 6] = [0x01, 0x00, 0x03, 0x01, 0x00, 0x05];

/// Extract features from the image into character buffer 1 (Img2Tz, 0x02)
pub const CREATE_CHAR_FILE_1: [u8; 7] = [0x01, 0x00, 0x04, 0x02, 0x01, 0x00, 0x08];

/// Extract features from the image into character buffer 2 (Img2Tz, 0x02)
pub const CREATE_CHAR_FILE_2: [u8; 7] = [0x01, 0x00, 0x04, 0x02, 0x02, 0x00, 0x09];

/// Merge both character buffers into a template (RegModel, 0x05)
pub const CREATE_TEMPLATE: [u8; 6] = [0x01, 0x00, 0x03, 0x05, 0x00, 0x09];

/// Clear the whole template library (Empty, 0x0D)
pub const DELETE_ALL: [u8; 6] = [0x01, 0x00, 0x03, 0x0D, 0x00, 0x11];

/// Search buffer 1 against pages 0..SEARCH_PAGE_COUNT (Search, 0x04)
pub const SEARCH: [u8; 11] = [
    0x01,
    0x00,
    0x08,
    0x04,
    0x01,
    0x00,
    0x00,
    (SEARCH_PAGE_COUNT >> 8) as u8,
    SEARCH_PAGE_COUNT as u8,
    0x00,
    0x4E,
];

/// Number of stored templates (TempleteNum, 0x1D)
pub const TEMPLATE_COUNT: [u8; 6] = [0x01, 0x00, 0x03, 0x1D, 0x00, 0x21];

/// Prefix of the Store (0x06) table: ident, length, instruction, buffer 1, page high byte
const STORE_PREFIX: [u8; 6] = [0x01, 0x00, 0x06, 0x06, 0x01, 0x00];

/// Character buffer targeted by feature extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharBuffer {
    One,
    Two,
}

/// Commands understood by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    GetImage,
    CreateCharFile(CharBuffer),
    CreateTemplate,
    DeleteAll,
    Search,
    TemplateCount,
    Store { slot: u8 },
}

impl SensorCommand {
    /// The command table sent after the header
    pub fn table(&self) -> Vec<u8, MAX_COMMAND_SIZE> {
        let mut table = Vec::new();
        // Every table is at most MAX_COMMAND_SIZE bytes
        let _ = match self {
            Self::GetImage => table.extend_from_slice(&GET_IMAGE),
            Self::CreateCharFile(CharBuffer::One) => table.extend_from_slice(&CREATE_CHAR_FILE_1),
            Self::CreateCharFile(CharBuffer::Two) => table.extend_from_slice(&CREATE_CHAR_FILE_2),
            Self::CreateTemplate => table.extend_from_slice(&CREATE_TEMPLATE),
            Self::DeleteAll => table.extend_from_slice(&DELETE_ALL),
            Self::Search => table.extend_from_slice(&SEARCH),
            Self::TemplateCount => table.extend_from_slice(&TEMPLATE_COUNT),
            Self::Store { slot } => table.extend_from_slice(&store_table(*slot)),
        };
        table
    }

    /// Complete packet, header included
    pub fn packet(&self) -> Packet {
        // Tables never exceed MAX_COMMAND_SIZE, so encoding cannot fail
        encode_command(&self.table()).unwrap_or_default()
    }

    /// How long to wait for the sensor to acknowledge
    pub fn reply_timeout_ms(&self) -> u32 {
        match self {
            Self::Search => SEARCH_ACK_TIMEOUT_MS,
            _ => ACK_TIMEOUT_MS,
        }
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::GetImage => "GetImage",
            Self::CreateCharFile(CharBuffer::One) => "CreateCharFile1",
            Self::CreateCharFile(CharBuffer::Two) => "CreateCharFile2",
            Self::CreateTemplate => "CreateTemplate",
            Self::DeleteAll => "DeleteAll",
            Self::Search => "Search",
            Self::TemplateCount => "TemplateCount",
            Self::Store { .. } => "Store",
        }
    }
}

/// Store checksum: low byte of the sum of every table byte before it.
///
/// The sensor is sent `0x00` as the checksum high byte regardless of the
/// sum, matching what deployed units expect.
pub fn store_checksum(slot: u8) -> u8 {
    STORE_PREFIX
        .iter()
        .fold(slot, |sum, &byte| sum.wrapping_add(byte))
}

/// Store the merged template into `slot`
pub fn store_table(slot: u8) -> [u8; 9] {
    let mut table = [0u8; 9];
    table[..6].copy_from_slice(&STORE_PREFIX);
    table[6] = slot;
    table[7] = 0x00;
    table[8] = store_checksum(slot);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::protocol::HEADER;
    use crate::protocol::packet::checksum;

    #[test]
    fn test_golden_tables() {
        let cases: [(SensorCommand, &[u8]); 7] = [
            (SensorCommand::GetImage, &[0x01, 0x00, 0x03, 0x01, 0x00, 0x05]),
            (
                SensorCommand::CreateCharFile(CharBuffer::One),
                &[0x01, 0x00, 0x04, 0x02, 0x01, 0x00, 0x08],
            ),
            (
                SensorCommand::CreateCharFile(CharBuffer::Two),
                &[0x01, 0x00, 0x04, 0x02, 0x02, 0x00, 0x09],
            ),
            (SensorCommand::CreateTemplate, &[0x01, 0x00, 0x03, 0x05, 0x00, 0x09]),
            (SensorCommand::DeleteAll, &[0x01, 0x00, 0x03, 0x0D, 0x00, 0x11]),
            (
                SensorCommand::Search,
                &[0x01, 0x00, 0x08, 0x04, 0x01, 0x00, 0x00, 0x00, 0x40, 0x00, 0x4E],
            ),
            (SensorCommand::TemplateCount, &[0x01, 0x00, 0x03, 0x1D, 0x00, 0x21]),
        ];

        for (command, expected) in cases {
            let packet = command.packet();
            assert_eq!(&packet[..6], &HEADER, "{}", command.label());
            assert_eq!(&packet[6..], expected, "{}", command.label());
        }
    }

    #[test]
    fn test_precomputed_checksums_are_consistent() {
        for command in [
            SensorCommand::GetImage,
            SensorCommand::CreateCharFile(CharBuffer::One),
            SensorCommand::CreateCharFile(CharBuffer::Two),
            SensorCommand::CreateTemplate,
            SensorCommand::DeleteAll,
            SensorCommand::Search,
            SensorCommand::TemplateCount,
        ] {
            let table = command.table();
            let body = &table[..table.len() - 2];
            let trailer = u16::from_be_bytes([table[table.len() - 2], table[table.len() - 1]]);
            assert_eq!(checksum(body), trailer, "{}", command.label());
        }
    }

    #[test]
    fn test_store_table() {
        let packet = SensorCommand::Store { slot: 5 }.packet();
        assert_eq!(
            &packet[6..],
            &[0x01, 0x00, 0x06, 0x06, 0x01, 0x00, 0x05, 0x00, 0x13]
        );
    }

    #[test]
    fn test_store_checksum_all_slots() {
        for slot in 0..=255u8 {
            let expected = ((0x01u32 + 0x00 + 0x06 + 0x06 + 0x01 + 0x00 + slot as u32) % 256) as u8;
            assert_eq!(store_checksum(slot), expected, "slot {}", slot);

            let table = store_table(slot);
            assert_eq!(table[6], slot);
            assert_eq!(table[7], 0x00);
            assert_eq!(table[8], expected);
        }
    }

    #[test]
    fn test_packets_within_limit() {
        for command in [SensorCommand::Search, SensorCommand::Store { slot: 0xFF }] {
            assert!(command.packet().len() <= HEADER.len() + MAX_COMMAND_SIZE);
        }
    }

    #[test]
    fn test_reply_timeouts() {
        assert_eq!(SensorCommand::Search.reply_timeout_ms(), 5000);
        assert_eq!(SensorCommand::GetImage.reply_timeout_ms(), 2000);
        assert_eq!(SensorCommand::Store { slot: 1 }.reply_timeout_ms(), 2000);
    }
}
