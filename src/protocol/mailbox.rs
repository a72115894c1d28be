//! Shared acknowledgment mailbox between the sensor receive interrupt and
//! the sequencing loop.
//!
//! The interrupt side pushes raw bytes with [`AckMailbox::on_byte`]. Once a
//! complete, length-validated reply has been accumulated it is published
//! through a signal; the consumer clears stale frames before sending a
//! command and then waits for the signal (with a timeout on hardware).

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::protocol::ack::{AckAccumulator, AckFrame};

/// Receive state plus frame-ready flag, safe to share with an interrupt
pub struct AckMailbox {
    accumulator: Mutex<CriticalSectionRawMutex, RefCell<AckAccumulator>>,
    ready: Signal<CriticalSectionRawMutex, AckFrame>,
}

impl AckMailbox {
    /// Create an empty mailbox (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            accumulator: Mutex::new(RefCell::new(AckAccumulator::new())),
            ready: Signal::new(),
        }
    }

    /// Feed one received byte (interrupt context)
    pub fn on_byte(&self, byte: u8) {
        let frame = self
            .accumulator
            .lock(|cell| cell.borrow_mut().push(byte));

        if let Some(frame) = frame {
            self.ready.signal(frame);
        }
    }

    /// Feed a chunk of received bytes
    pub fn on_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.on_byte(byte);
        }
    }

    /// Discard any frame published but not yet consumed
    pub fn clear(&self) {
        self.ready.reset();
    }

    /// Wait for the next complete frame
    pub async fn wait(&self) -> AckFrame {
        self.ready.wait().await
    }

    /// Raw window contents regardless of completeness
    pub fn snapshot(&self) -> AckFrame {
        self.accumulator.lock(|cell| cell.borrow().snapshot())
    }
}

impl Default for AckMailbox {
    fn default() -> Self {
        Self::new()
    }
}
