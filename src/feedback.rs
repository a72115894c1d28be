//! Operator feedback
//!
//! Flows report progress as [`FeedbackEvent`]s. On hardware the events are
//! queued to a writer task that renders each one as a text line on the
//! control serial link and drives the status pin.

use core::fmt::Write;
use core::future::Future;

use heapless::String;

use crate::clock::TimeOfDay;
use crate::sensor::commands::CharBuffer;
use crate::sensor::response::ResponseCode;
use crate::sequencer::states::FlowState;
use crate::users::UserName;

/// Longest rendered feedback line
pub const MAX_LINE_LENGTH: usize = 64;

/// A rendered feedback line
pub type FeedbackLine = String<MAX_LINE_LENGTH>;

/// Something the operator should be told
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// Search is waiting for a finger
    SearchPrompt,
    /// One more capture attempt
    ProgressDot,
    /// The sensor captured an image
    ImageCaptured,
    /// Features extracted, about to search
    FeaturesReady,
    /// Search command sent
    Searching,
    /// A stored template matched
    Found { slot: u16, name: Option<UserName> },
    /// No stored template matched
    NotFound,
    /// Enrollment is waiting for a slot from the control channel
    AwaitingSlot,
    /// Enrollment wants the first capture
    PlaceFinger,
    /// Enrollment wants the second capture
    PlaceFingerAgain,
    CreatingCharFile(CharBuffer),
    CharFileCreated(CharBuffer),
    /// Finger must be lifted before the next capture
    RemoveFinger,
    CreatingTemplate,
    TemplateCreated,
    Storing,
    Stored { slot: u8 },
    /// A sensor command failed with this code
    Diagnostic(ResponseCode),
    /// The name being entered changed
    NameChanged(UserName),
    /// Name entry finished for `slot`
    NameCreated { slot: u8 },
    /// Every stored template was erased
    DatabaseCleared,
    /// Number of templates in the sensor library
    TemplateCount(u16),
    /// A flow gave up under a bounded retry policy
    GaveUp(FlowState),
}

impl FeedbackEvent {
    /// Whether the line is terminated with a newline
    pub fn ends_line(&self) -> bool {
        !matches!(self, Self::ProgressDot)
    }

    /// Level to drive the status pin to, if the event changes it.
    ///
    /// The pin is wired active low: low signals a match.
    pub fn status_level_high(&self) -> Option<bool> {
        match self {
            Self::Found { .. } => Some(false),
            Self::NotFound | Self::SearchPrompt | Self::Searching => Some(true),
            _ => None,
        }
    }

    /// Whether the result should stay visible before the loop continues
    pub fn holds_result(&self) -> bool {
        matches!(self, Self::Found { .. } | Self::NotFound | Self::NameCreated { .. } | Self::DatabaseCleared)
    }

    /// Whether the line is stamped with the time of day
    fn is_timestamped(&self) -> bool {
        matches!(
            self,
            Self::SearchPrompt
                | Self::ImageCaptured
                | Self::FeaturesReady
                | Self::Searching
                | Self::Found { .. }
                | Self::NotFound
        )
    }
}

fn buffer_number(buffer: CharBuffer) -> u8 {
    match buffer {
        CharBuffer::One => 1,
        CharBuffer::Two => 2,
    }
}

/// Write the text for `event` into `out`
fn write_event<W: Write>(out: &mut W, event: &FeedbackEvent) -> core::fmt::Result {
    use FeedbackEvent::*;

    match event {
        SearchPrompt => out.write_str("Press your finger to search"),
        ProgressDot => out.write_str("."),
        ImageCaptured => out.write_str("Receiving your finger image"),
        FeaturesReady => out.write_str("Received your finger image"),
        Searching => out.write_str("Searching finger"),
        Found { slot, name: Some(name) } => write!(out, "Found {}: {}", slot, name),
        Found { slot, name: None } => write!(out, "Found {}", slot),
        NotFound => out.write_str("NOT FOUND"),
        AwaitingSlot => out.write_str("Give ID to store finger"),
        PlaceFinger => out.write_str("Press your finger"),
        PlaceFingerAgain => out.write_str("Press your finger again"),
        CreatingCharFile(buffer) => write!(out, "Creating char file {}", buffer_number(*buffer)),
        CharFileCreated(buffer) => write!(out, "Created char file {}", buffer_number(*buffer)),
        RemoveFinger => out.write_str("Remove your finger"),
        CreatingTemplate => out.write_str("Creating template model"),
        TemplateCreated => out.write_str("Created template model"),
        Storing => out.write_str("Storing"),
        Stored { slot } => write!(out, "Stored in slot {}", slot),
        Diagnostic(code) => out.write_str(code.name()),
        NameChanged(name) => write!(out, "Name: {}", name),
        NameCreated { slot } => write!(out, "CREATED NAME {}", slot),
        DatabaseCleared => out.write_str("CLEAR ALL FINGER"),
        TemplateCount(count) => write!(out, "Templates stored: {}", count),
        GaveUp(state) => write!(out, "Gave up in {}", state),
    }
}

/// Render `event` as the text sent on the control link.
///
/// A time stamp is prefixed to search lines when `time` is given. Text that
/// does not fit is truncated.
pub fn render(event: &FeedbackEvent, time: Option<TimeOfDay>) -> FeedbackLine {
    let mut line = FeedbackLine::new();

    if let Some(time) = time.filter(|_| event.is_timestamped()) {
        let _ = write!(line, "[{}] ", time);
    }
    let _ = write_event(&mut line, event);
    if event.ends_line() && line.push('\n').is_err() {
        line.pop();
        let _ = line.push('\n');
    }
    line
}

/// Sink for feedback events
pub trait Feedback {
    /// Report one event. May wait, e.g. to hold a result on screen.
    fn emit(&mut self, event: FeedbackEvent) -> impl Future<Output = ()>;
}
