//! Hardware configuration constants for the ESP32-S3 fingerprint terminal

/// Status output pin (found/not-found indicator, active low)
pub mod status {
    pub const PIN: u8 = 48;
}

/// UART pins for the fingerprint sensor link
pub mod sensor_pins {
    pub const TX: u8 = 17;
    pub const RX: u8 = 18;
}

/// UART pins for the control channel (host side selects mode/slot)
pub mod control_pins {
    pub const TX: u8 = 43;
    pub const RX: u8 = 44;
}

/// 4x4 keypad matrix pins
pub mod keypad_pins {
    pub const ROWS: [u8; 4] = [4, 5, 6, 7];
    pub const COLS: [u8; 4] = [15, 16, 8, 9];
}

/// Serial configuration (both links)
pub mod serial {
    /// AS608 factory default baud rate
    pub const BAUD_RATE: u32 = 57600;
    pub const RX_CHUNK_SIZE: usize = 16;
}

/// Sensor protocol constants
pub mod protocol {
    /// Start code plus the default module address
    pub const HEADER: [u8; 6] = [0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF];

    /// Packet identifier of an acknowledge packet
    pub const ACK_PACKET_ID: u8 = 0x07;

    /// Length field (low byte) carried by a search reply
    pub const SEARCH_REPLY_LENGTH: u8 = 0x07;

    /// Size of the acknowledgment window filled by the receive path
    pub const ACK_BUFFER_SIZE: usize = 16;

    /// Largest command payload sent after the header
    pub const MAX_COMMAND_SIZE: usize = 11;

    /// Largest complete packet (header + payload)
    pub const MAX_PACKET_SIZE: usize = HEADER.len() + MAX_COMMAND_SIZE;

    /// Number of template slots covered by a search (0x0040)
    pub const SEARCH_PAGE_COUNT: u16 = 0x0040;
}

/// Reply wait times
pub mod timing {
    /// Default time allowed for the sensor to acknowledge a command
    pub const ACK_TIMEOUT_MS: u32 = 2000;

    /// Searching the template library takes considerably longer
    pub const SEARCH_ACK_TIMEOUT_MS: u32 = 5000;

    /// How long a search result stays on the feedback channel
    pub const RESULT_HOLD_MS: u64 = 1000;

    /// Keypad scan period in name-entry mode
    pub const KEYPAD_POLL_MS: u64 = 200;
}

/// User name table dimensions
pub mod users {
    pub const MAX_USERS: usize = 100;
    pub const MAX_NAME_LENGTH: usize = 16;
}

/// Control channel byte values
pub mod control {
    /// Bytes below this select enrollment into that slot, bytes above select search
    pub const MODE_THRESHOLD: u8 = 99;
}

/// Time of day the clock counts from after reset
pub mod clock {
    pub const BASE_HOUR: u8 = 15;
    pub const BASE_MINUTE: u8 = 31;
    pub const BASE_SECOND: u8 = 0;
}
