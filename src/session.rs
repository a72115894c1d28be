//! Terminal mode and the latched enrollment slot
//!
//! The control channel selects what the terminal does next with single
//! bytes: anything below [`MODE_THRESHOLD`] selects enrollment into that
//! slot, anything above it selects search, and the threshold itself is
//! ignored. The terminal loop reads the mode once per iteration, so a
//! change made mid-flow takes effect when the current flow finishes.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::config::control::MODE_THRESHOLD;

/// What the terminal loop does on its next iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Identify whoever touches the sensor
    #[default]
    Search,
    /// Enroll a new fingerprint into the latched slot
    Import,
    /// Edit the name of the slot just enrolled
    CreateName,
}

/// Mode plus latched slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    mode: Mode,
    /// Target slot for enrollment and name entry, 0 when none
    slot: u8,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Search,
            slot: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Latched slot, if one has been chosen
    pub fn slot(&self) -> Option<u8> {
        if self.slot == 0 {
            None
        } else {
            Some(self.slot)
        }
    }

    /// Apply one control byte and return the resulting mode
    pub fn apply_control_byte(&mut self, byte: u8) -> Mode {
        if byte < MODE_THRESHOLD {
            self.mode = Mode::Import;
            self.slot = byte;
        } else if byte > MODE_THRESHOLD {
            self.mode = Mode::Search;
            self.slot = 0;
        }
        self.mode
    }

    /// A template has been stored into `slot`; start naming it.
    ///
    /// The slot is latched again so name entry edits the slot that was
    /// stored, even if the control channel picked another one mid-flow.
    pub fn enrollment_done(&mut self, slot: u8) {
        self.slot = slot;
        self.mode = Mode::CreateName;
    }

    /// Name entry finished; forget the slot and go back to search
    pub fn finish(&mut self) {
        self.slot = 0;
        self.mode = Mode::Search;
    }
}

/// [`Session`] shared between the control receive task and the terminal loop
pub struct SharedSession {
    session: Mutex<CriticalSectionRawMutex, RefCell<Session>>,
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl SharedSession {
    /// Create a session in search mode (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            session: Mutex::new(RefCell::new(Session::new())),
            changed: Signal::new(),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Session {
        self.session.lock(|cell| *cell.borrow())
    }

    pub fn mode(&self) -> Mode {
        self.snapshot().mode()
    }

    pub fn slot(&self) -> Option<u8> {
        self.snapshot().slot()
    }

    fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let result = self.session.lock(|cell| f(&mut *cell.borrow_mut()));
        self.changed.signal(());
        result
    }

    /// Apply one byte received on the control channel
    pub fn apply_control_byte(&self, byte: u8) -> Mode {
        let mode = self.update(|session| session.apply_control_byte(byte));
        log::info!("Control byte {} -> {:?}", byte, mode);
        mode
    }

    pub fn enrollment_done(&self, slot: u8) {
        self.update(|session| session.enrollment_done(slot));
    }

    pub fn finish(&self) {
        self.update(Session::finish);
    }

    /// Wait until a nonzero slot is latched for enrollment.
    ///
    /// Returns `None` if the mode leaves `Import` first.
    pub async fn wait_for_slot(&self) -> Option<u8> {
        loop {
            let session = self.snapshot();
            if session.mode() != Mode::Import {
                return None;
            }
            if let Some(slot) = session.slot() {
                return Some(slot);
            }
            self.changed.wait().await;
        }
    }
}

impl Default for SharedSession {
    fn default() -> Self {
        Self::new()
    }
}
