//! Search and enrollment flows

pub mod runner;
pub mod states;

pub use runner::{EnrollOutcome, SearchReport, SequenceError, Sequencer};
pub use states::{EdgeKind, EnrollState, FlowState, RetryPolicy, SearchState, Transition};
