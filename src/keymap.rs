//! Keypad mapping for name entry
//!
//! Keys are numbered 1-16 row by row; 0 means no key is pressed.
//! ```text
//!  1  2  3  4
//!  5  6  7  8
//!  9 10 11 12
//! 13 14 15 16
//! ```

use core::future::Future;

/// Source of key presses
pub trait Keypad {
    /// Next pressed key (1-16), or `None` if nothing was pressed within
    /// one poll period
    fn poll_key(&mut self) -> impl Future<Output = Option<u8>>;
}

/// What a key does while a name is being entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameEntryAction {
    /// Append a character
    Push(char),
    /// Remove the last character
    Backspace,
    /// Erase the whole name
    ClearName,
    /// Erase every template stored in the sensor
    DeleteAllFingerprints,
    /// Accept the name and return to search
    Finish,
}

/// Action for a key in number mode.
///
/// Key 4 toggles character mode on keypads that support it and does
/// nothing here, as does any key outside 1-16.
pub fn action_for_key(key: u8) -> Option<NameEntryAction> {
    use NameEntryAction::*;

    match key {
        1 => Some(Push('1')),
        2 => Some(Push('2')),
        3 => Some(Push('3')),
        5 => Some(Push('4')),
        6 => Some(Push('5')),
        7 => Some(Push('6')),
        8 => Some(Push(' ')),
        9 => Some(Push('7')),
        10 => Some(Push('8')),
        11 => Some(Push('9')),
        12 => Some(ClearName),
        13 => Some(DeleteAllFingerprints),
        14 => Some(Push('0')),
        15 => Some(Finish),
        16 => Some(Backspace),
        _ => None,
    }
}

/// Key number for a pressed `(row, column)` pair, both zero based
pub fn key_at(row: usize, column: usize) -> Option<u8> {
    if row < 4 && column < 4 {
        Some((row * 4 + column + 1) as u8)
    } else {
        None
    }
}

/// Turns repeated scans into single key presses
#[derive(Debug, Default)]
pub struct KeyDebouncer {
    held: Option<u8>,
}

impl KeyDebouncer {
    pub const fn new() -> Self {
        Self { held: None }
    }

    /// Feed one scan result; returns the key on the scan where it goes down
    pub fn update(&mut self, scanned: Option<u8>) -> Option<u8> {
        let pressed = match scanned {
            Some(key) if self.held != Some(key) => Some(key),
            _ => None,
        };
        self.held = scanned;
        pressed
    }
}

#[cfg(test)]
pub mod mock {
    //! Scripted keypad for testing

    use super::*;
    use core::cell::RefCell;
    use heapless::Deque;

    /// Replays queued key presses, then reports no key
    pub struct MockKeypad {
        keys: RefCell<Deque<u8, 32>>,
    }

    impl MockKeypad {
        pub fn new() -> Self {
            Self {
                keys: RefCell::new(Deque::new()),
            }
        }

        /// Queue presses to be returned by poll_key()
        pub fn press(&self, keys: &[u8]) {
            let mut queue = self.keys.borrow_mut();
            for &key in keys {
                let _ = queue.push_back(key);
            }
        }
    }

    impl Default for MockKeypad {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Keypad for MockKeypad {
        async fn poll_key(&mut self) -> Option<u8> {
            self.keys.borrow_mut().pop_front()
        }
    }
}
