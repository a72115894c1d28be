//! Keypad scanning
//!
//! A 4x4 matrix with rows driven low one at a time and pulled-up columns.
//! Presses are queued on [`KEY_CHANNEL`] and read by the terminal through
//! [`ChannelKeypad`].

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{with_timeout, Duration, Timer};
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::timing::KEYPAD_POLL_MS;
use crate::keymap::{key_at, KeyDebouncer, Keypad};

/// Interval between matrix scans
const SCAN_INTERVAL_MS: u64 = 20;

/// Channel for key presses
pub static KEY_CHANNEL: Channel<CriticalSectionRawMutex, u8, 4> = Channel::new();

/// Type alias for the key channel sender
pub type KeySender = Sender<'static, CriticalSectionRawMutex, u8, 4>;

/// Type alias for the key channel receiver
pub type KeyReceiver = Receiver<'static, CriticalSectionRawMutex, u8, 4>;

/// 4x4 key matrix
pub struct MatrixKeypad<Row: OutputPin, Col: InputPin> {
    rows: [Row; 4],
    cols: [Col; 4],
}

impl<Row: OutputPin, Col: InputPin> MatrixKeypad<Row, Col> {
    pub fn new(mut rows: [Row; 4], cols: [Col; 4]) -> Self {
        for row in rows.iter_mut() {
            let _ = row.set_high();
        }
        Self { rows, cols }
    }

    /// Scan the whole matrix once, returning the first pressed key
    pub async fn scan(&mut self) -> Option<u8> {
        let mut pressed = None;

        for r in 0..self.rows.len() {
            let _ = self.rows[r].set_low();
            // Let the column lines settle
            Timer::after(Duration::from_micros(10)).await;

            for (c, col) in self.cols.iter_mut().enumerate() {
                if pressed.is_none() && col.is_low().unwrap_or(false) {
                    pressed = key_at(r, c);
                }
            }
            let _ = self.rows[r].set_high();
        }

        pressed
    }
}

/// Task that scans the matrix and queues key presses
pub async fn keypad_task<Row: OutputPin, Col: InputPin>(
    mut keypad: MatrixKeypad<Row, Col>,
    sender: KeySender,
) {
    let mut debouncer = KeyDebouncer::new();

    loop {
        if let Some(key) = debouncer.update(keypad.scan().await) {
            log::debug!("Key {}", key);
            // Drop presses nobody is reading
            let _ = sender.try_send(key);
        }
        Timer::after(Duration::from_millis(SCAN_INTERVAL_MS)).await;
    }
}

/// [`Keypad`] reading presses queued by [`keypad_task`]
pub struct ChannelKeypad {
    receiver: KeyReceiver,
}

impl ChannelKeypad {
    pub fn new(receiver: KeyReceiver) -> Self {
        Self { receiver }
    }
}

impl Keypad for ChannelKeypad {
    async fn poll_key(&mut self) -> Option<u8> {
        with_timeout(Duration::from_millis(KEYPAD_POLL_MS), self.receiver.receive())
            .await
            .ok()
    }
}
