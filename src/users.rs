//! User name table
//!
//! One name per fingerprint slot, held in RAM only. Names are edited one
//! character at a time from the keypad while the terminal is in name-entry
//! mode and read back by slot when a search finds a match.

use heapless::String;

use crate::config::users::{MAX_NAME_LENGTH, MAX_USERS};

/// A single user name
pub type UserName = String<MAX_NAME_LENGTH>;

/// Names present after every reset
const SEEDED_USERS: [(u16, &str); 3] = [(1, "MEN"), (2, "THINH"), (3, "VU")];

/// Errors from the user table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserError {
    /// Slot is not below the table size
    SlotOutOfRange,
}

/// Names indexed by fingerprint slot
pub struct UserTable {
    names: [UserName; MAX_USERS],
}

impl UserTable {
    /// Table with every slot empty
    pub fn new() -> Self {
        Self {
            names: core::array::from_fn(|_| String::new()),
        }
    }

    /// Table with the factory names filled in
    pub fn seeded() -> Self {
        let mut table = Self::new();
        for (slot, name) in SEEDED_USERS {
            // Seeds are in range and short enough
            let _ = table.set(slot, name);
        }
        table
    }

    fn entry(&self, slot: u16) -> Result<&UserName, UserError> {
        self.names
            .get(usize::from(slot))
            .ok_or(UserError::SlotOutOfRange)
    }

    fn entry_mut(&mut self, slot: u16) -> Result<&mut UserName, UserError> {
        self.names
            .get_mut(usize::from(slot))
            .ok_or(UserError::SlotOutOfRange)
    }

    /// Name stored for `slot`, empty if never set
    pub fn name(&self, slot: u16) -> Result<&str, UserError> {
        self.entry(slot).map(|name| name.as_str())
    }

    /// Name for a search report: `None` if the slot is out of range or unnamed
    pub fn lookup(&self, slot: u16) -> Option<&str> {
        self.name(slot).ok().filter(|name| !name.is_empty())
    }

    /// Replace the name for `slot`, truncating to the maximum length
    pub fn set(&mut self, slot: u16, name: &str) -> Result<(), UserError> {
        let entry = self.entry_mut(slot)?;
        entry.clear();
        for ch in name.chars() {
            if entry.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Append one character to the name for `slot`.
    ///
    /// When the name is already full the name is cleared instead and the
    /// character is dropped, so entry starts over at the first position.
    pub fn push_char(&mut self, slot: u16, ch: char) -> Result<&str, UserError> {
        let entry = self.entry_mut(slot)?;
        if entry.push(ch).is_err() {
            log::debug!("Name for slot {} full, clearing", slot);
            entry.clear();
        }
        Ok(entry.as_str())
    }

    /// Remove the last character of the name for `slot`
    pub fn backspace(&mut self, slot: u16) -> Result<&str, UserError> {
        let entry = self.entry_mut(slot)?;
        entry.pop();
        Ok(entry.as_str())
    }

    /// Erase the name for `slot`
    pub fn clear(&mut self, slot: u16) -> Result<(), UserError> {
        self.entry_mut(slot)?.clear();
        Ok(())
    }

    /// Number of slots with a name
    pub fn named_count(&self) -> usize {
        self.names.iter().filter(|name| !name.is_empty()).count()
    }
}

impl Default for UserTable {
    fn default() -> Self {
        Self::seeded()
    }
}
