//! Parsing of the feedback lines written by the firmware.

/// Time stamp prefixed to search lines, e.g. `[15:31:07]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// One feedback line, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    SearchPrompt,
    Found { slot: u16, name: Option<String> },
    NotFound,
    AwaitingSlot,
    Stored { slot: u8 },
    NameCreated { slot: u8 },
    DatabaseCleared,
    /// Anything else (progress messages, diagnostics)
    Other(String),
}

/// A received line plus its time stamp, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub stamp: Option<Stamp>,
    pub line: Line,
}

fn parse_stamp(text: &str) -> Option<(Stamp, &str)> {
    let rest = text.strip_prefix('[')?;
    let (time, rest) = rest.split_once("] ")?;
    let mut fields = time.split(':').map(|f| f.parse::<u8>().ok());
    let stamp = Stamp {
        hour: fields.next()??,
        minute: fields.next()??,
        second: fields.next()??,
    };
    if fields.next().is_some() || stamp.hour > 23 || stamp.minute > 59 || stamp.second > 59 {
        return None;
    }
    Some((stamp, rest))
}

/// Parse one line, without its trailing newline.
///
/// Leading progress dots are dropped; they share a line with whatever
/// message follows them.
pub fn parse(raw: &str) -> Feedback {
    let text = raw.trim_end_matches(['\r', '\n']).trim_start_matches('.');
    let (stamp, text) = match parse_stamp(text) {
        Some((stamp, rest)) => (Some(stamp), rest),
        None => (None, text),
    };

    let line = if text == "Press your finger to search" {
        Line::SearchPrompt
    } else if text == "NOT FOUND" {
        Line::NotFound
    } else if text == "Give ID to store finger" {
        Line::AwaitingSlot
    } else if text == "CLEAR ALL FINGER" {
        Line::DatabaseCleared
    } else if let Some(rest) = text.strip_prefix("Found ") {
        let (slot, name) = match rest.split_once(": ") {
            Some((slot, name)) => (slot, Some(name.to_string())),
            None => (rest, None),
        };
        match slot.parse() {
            Ok(slot) => Line::Found { slot, name },
            Err(_) => Line::Other(text.to_string()),
        }
    } else if let Some(Ok(slot)) = text.strip_prefix("Stored in slot ").map(str::parse) {
        Line::Stored { slot }
    } else if let Some(Ok(slot)) = text.strip_prefix("CREATED NAME ").map(str::parse) {
        Line::NameCreated { slot }
    } else {
        Line::Other(text.to_string())
    };

    Feedback { stamp, line }
}

/// Split received text into complete lines; the unfinished tail is returned
/// separately.
pub fn split_lines(text: &str) -> (Vec<&str>, &str) {
    match text.rfind('\n') {
        Some(end) => (text[..end].split('\n').collect(), &text[end + 1..]),
        None => (Vec::new(), text),
    }
}
