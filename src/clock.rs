//! Wall clock derived from uptime
//!
//! The terminal has no battery-backed clock. Time of day is a fixed base
//! plus the seconds elapsed since boot.

use core::fmt;

use crate::config::clock::{BASE_HOUR, BASE_MINUTE, BASE_SECOND};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Hours, minutes and seconds within one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// Time of day from seconds since midnight, wrapping past 24 h
    pub fn from_seconds(seconds: u64) -> Self {
        let seconds = seconds % SECONDS_PER_DAY;
        Self {
            hour: (seconds / 3600) as u8,
            minute: ((seconds / 60) % 60) as u8,
            second: (seconds % 60) as u8,
        }
    }

    /// Seconds since midnight
    pub fn as_seconds(&self) -> u64 {
        u64::from(self.hour) * 3600 + u64::from(self.minute) * 60 + u64::from(self.second)
    }

    /// Configured time of day at boot
    pub fn base() -> Self {
        Self {
            hour: BASE_HOUR,
            minute: BASE_MINUTE,
            second: BASE_SECOND,
        }
    }

    /// Time of day after `elapsed_secs` of uptime
    pub fn since_boot(elapsed_secs: u64) -> Self {
        Self::from_seconds(Self::base().as_seconds().wrapping_add(elapsed_secs))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}
