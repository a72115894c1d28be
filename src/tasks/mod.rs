//! Embassy tasks module
//!
//! Contains the hardware-facing async tasks, organised by peripheral.

pub mod control;
pub mod feedback;
pub mod keypad;
pub mod sensor;

pub use control::control_rx_task;
pub use feedback::{feedback_writer_task, ChannelFeedback, FeedbackReceiver, FeedbackSender, FEEDBACK_CHANNEL};
pub use keypad::{keypad_task, ChannelKeypad, KeyReceiver, KeySender, MatrixKeypad, KEY_CHANNEL};
pub use sensor::sensor_rx_task;
