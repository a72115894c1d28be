//! Feedback writer task
//!
//! The terminal queues [`FeedbackEvent`]s on [`FEEDBACK_CHANNEL`]; this task
//! renders them onto the control UART and drives the status pin.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::OutputPin;
use embedded_io_async::Write;

use crate::clock::TimeOfDay;
use crate::config::timing::RESULT_HOLD_MS;
use crate::feedback::{render, Feedback, FeedbackEvent};

/// Depth of the feedback queue
const FEEDBACK_QUEUE_DEPTH: usize = 8;

/// Channel for feedback events
pub static FEEDBACK_CHANNEL: Channel<CriticalSectionRawMutex, FeedbackEvent, FEEDBACK_QUEUE_DEPTH> =
    Channel::new();

/// Type alias for the feedback channel sender
pub type FeedbackSender = Sender<'static, CriticalSectionRawMutex, FeedbackEvent, FEEDBACK_QUEUE_DEPTH>;

/// Type alias for the feedback channel receiver
pub type FeedbackReceiver = Receiver<'static, CriticalSectionRawMutex, FeedbackEvent, FEEDBACK_QUEUE_DEPTH>;

/// [`Feedback`] sink that queues events for the writer task
pub struct ChannelFeedback {
    sender: FeedbackSender,
}

impl ChannelFeedback {
    pub fn new(sender: FeedbackSender) -> Self {
        Self { sender }
    }
}

impl Feedback for ChannelFeedback {
    async fn emit(&mut self, event: FeedbackEvent) {
        let hold = event.holds_result();
        self.sender.send(event).await;
        if hold {
            Timer::after(Duration::from_millis(RESULT_HOLD_MS)).await;
        }
    }
}

/// Task that writes feedback lines and drives the status pin
pub async fn feedback_writer_task<W: Write, P: OutputPin>(
    mut writer: W,
    mut status: P,
    receiver: FeedbackReceiver,
) {
    loop {
        let event = receiver.receive().await;

        match event.status_level_high() {
            Some(true) => {
                let _ = status.set_high();
            }
            Some(false) => {
                let _ = status.set_low();
            }
            None => {}
        }

        let time = TimeOfDay::since_boot(Instant::now().as_secs());
        let line = render(&event, Some(time));
        if writer.write_all(line.as_bytes()).await.is_err() {
            log::warn!("Dropped feedback line: {:?}", event);
        }
    }
}
