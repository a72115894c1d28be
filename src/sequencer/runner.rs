//! Drives the search and enrollment flows against the sensor
//!
//! The runner walks the transition tables in [`states`](super::states),
//! issuing each state's command and following the edge its outcome
//! selects. Operator feedback is emitted along the way.

use crate::feedback::{Feedback, FeedbackEvent};
use crate::sensor::commands::{CharBuffer, SensorCommand};
use crate::sensor::driver::{Fingerprint, SearchReply};
use crate::sensor::response::ResponseCode;
use crate::sensor::traits::SensorLink;
use crate::sequencer::states::{EnrollState, FlowState, RetryBudget, RetryPolicy, SearchState};
use crate::session::SharedSession;

/// Errors that end a flow early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// A bounded retry policy ran out while in `state`
    RetriesExhausted { state: FlowState },
}

/// Result of a completed search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchReport {
    /// A stored template matched
    Found { slot: u16, score: u16 },
    /// The search command failed with this code
    NotFound { code: ResponseCode },
}

/// Result of an enrollment flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// The template was stored into `slot`
    Stored { slot: u8 },
    /// The mode left `Import` before a slot was chosen
    Cancelled,
}

/// Runs flows on a sensor, reporting to a feedback sink
pub struct Sequencer<L, F> {
    sensor: Fingerprint<L>,
    feedback: F,
    policy: RetryPolicy,
}

impl<L: SensorLink, F: Feedback> Sequencer<L, F> {
    /// Create a sequencer that retries forever
    pub fn new(sensor: Fingerprint<L>, feedback: F) -> Self {
        Self::with_policy(sensor, feedback, RetryPolicy::default())
    }

    pub fn with_policy(sensor: Fingerprint<L>, feedback: F, policy: RetryPolicy) -> Self {
        Self {
            sensor,
            feedback,
            policy,
        }
    }

    pub fn sensor_mut(&mut self) -> &mut Fingerprint<L> {
        &mut self.sensor
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut F {
        &mut self.feedback
    }

    pub fn into_parts(self) -> (Fingerprint<L>, F) {
        (self.sensor, self.feedback)
    }

    async fn emit(&mut self, event: FeedbackEvent) {
        self.feedback.emit(event).await;
    }

    /// Capture a finger, extract features and search the library
    pub async fn search(&mut self) -> Result<SearchReport, SequenceError> {
        let mut budget = RetryBudget::new(self.policy);
        let mut state = SearchState::AwaitImage;
        let mut reply: Option<SearchReply> = None;

        self.emit(FeedbackEvent::SearchPrompt).await;

        // Terminal states issue no command
        while let Some(command) = state.command() {
            if state == SearchState::AwaitImage {
                self.emit(FeedbackEvent::ProgressDot).await;
            }

            let ok = if command == SensorCommand::Search {
                self.emit(FeedbackEvent::Searching).await;
                let result = self.sensor.search().await;
                reply = Some(result);
                result.code.is_ok()
            } else {
                let code = self.sensor.run(command).await;
                match state {
                    SearchState::AwaitImage => {
                        if code.is_ok() {
                            self.emit(FeedbackEvent::ImageCaptured).await;
                        }
                        code.is_ok()
                    }
                    _ => self.report(code, FeedbackEvent::FeaturesReady).await,
                }
            };

            let edge = state.next(ok);
            if edge.is_retry() && !budget.spend() {
                let state = FlowState::Search(state);
                log::warn!("Giving up in {} after {} retries", state, budget.spent() - 1);
                self.emit(FeedbackEvent::GaveUp(state)).await;
                return Err(SequenceError::RetriesExhausted { state });
            }
            if edge.next == SearchState::AwaitImage && state != SearchState::AwaitImage {
                self.emit(FeedbackEvent::SearchPrompt).await;
            }
            state = edge.next;
        }

        let report = match (state, reply) {
            (SearchState::Found, Some(reply)) => SearchReport::Found {
                slot: reply.page_id,
                score: reply.score,
            },
            (_, reply) => SearchReport::NotFound {
                code: reply.map_or(ResponseCode::UndefinedError, |reply| reply.code),
            },
        };
        log::info!("Search finished: {:?}", report);
        Ok(report)
    }

    /// Enroll a fingerprint into the slot latched in `session`.
    ///
    /// Waits for a nonzero slot first. On success the session moves on to
    /// name entry.
    pub async fn enroll(&mut self, session: &SharedSession) -> Result<EnrollOutcome, SequenceError> {
        self.emit(FeedbackEvent::AwaitingSlot).await;
        let slot = match session.wait_for_slot().await {
            Some(slot) => slot,
            None => {
                log::info!("Enrollment cancelled before a slot was chosen");
                return Ok(EnrollOutcome::Cancelled);
            }
        };
        log::info!("Enrolling into slot {}", slot);

        let mut budget = RetryBudget::new(self.policy);
        let mut state = EnrollState::WaitForId.next(true).next;
        self.on_enter(state).await;

        while !state.is_terminal() {
            let ok = self.step(state, slot).await;

            let edge = state.next(ok);
            if edge.is_retry() && !budget.spend() {
                let state = FlowState::Enroll(state);
                log::warn!("Giving up in {} after {} retries", state, budget.spent() - 1);
                self.emit(FeedbackEvent::GaveUp(state)).await;
                return Err(SequenceError::RetriesExhausted { state });
            }
            if edge.next != state {
                self.on_enter(edge.next).await;
            }
            state = edge.next;
        }

        session.enrollment_done(slot);
        Ok(EnrollOutcome::Stored { slot })
    }

    /// Prompt shown when a state is entered
    async fn on_enter(&mut self, state: EnrollState) {
        let event = match state {
            EnrollState::Image1 => FeedbackEvent::PlaceFinger,
            EnrollState::Image2 => FeedbackEvent::PlaceFingerAgain,
            EnrollState::Char1 => FeedbackEvent::CreatingCharFile(CharBuffer::One),
            EnrollState::Char2 => FeedbackEvent::CreatingCharFile(CharBuffer::Two),
            EnrollState::BuildTemplate => FeedbackEvent::CreatingTemplate,
            EnrollState::Store => FeedbackEvent::Storing,
            _ => return,
        };
        self.emit(event).await;
    }

    /// Run the command for one enrollment state and report the outcome
    async fn step(&mut self, state: EnrollState, slot: u8) -> bool {
        let Some(command) = state.command(slot) else {
            return true;
        };
        if matches!(state, EnrollState::Image1 | EnrollState::Image2) {
            self.emit(FeedbackEvent::ProgressDot).await;
        }

        let code = self.sensor.run(command).await;
        match state {
            EnrollState::WaitRemoveFinger1 | EnrollState::WaitRemoveFinger2 => {
                let present = code.is_ok();
                if present {
                    self.emit(FeedbackEvent::RemoveFinger).await;
                }
                present
            }
            EnrollState::Char1 => self.report(code, FeedbackEvent::CharFileCreated(CharBuffer::One)).await,
            EnrollState::Char2 => self.report(code, FeedbackEvent::CharFileCreated(CharBuffer::Two)).await,
            EnrollState::BuildTemplate => self.report(code, FeedbackEvent::TemplateCreated).await,
            EnrollState::Store => self.report(code, FeedbackEvent::Stored { slot }).await,
            _ => code.is_ok(),
        }
    }

    async fn report(&mut self, code: ResponseCode, success: FeedbackEvent) -> bool {
        if code.is_ok() {
            self.emit(success).await;
        } else {
            self.emit(FeedbackEvent::Diagnostic(code)).await;
        }
        code.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::mock::RecordingFeedback;
    use crate::protocol::AckFrame;
    use crate::sensor::traits::mock::MockSensorLink;
    use crate::sensor::traits::LinkError;
    use crate::session::Mode;

    const OK: u8 = 0x00;
    const NO_FINGER: u8 = 0x02;
    const IMAGE_TOO_BLURRY: u8 = 0x05;
    const MERGE_FAIL: u8 = 0x0A;

    fn sequencer(link: MockSensorLink) -> Sequencer<MockSensorLink, RecordingFeedback> {
        Sequencer::new(Fingerprint::new(link), RecordingFeedback::new())
    }

    fn search_hit(slot: u8) -> AckFrame {
        AckFrame::reply(OK, &[0x00, slot, 0x00, 0x64])
    }

    #[test]
    fn test_search_finds_slot_after_retries() {
        let link = MockSensorLink::new();
        link.queue_code(NO_FINGER);
        link.queue_code(NO_FINGER);
        link.queue_code(OK);
        link.queue_code(OK);
        link.queue_reply(Ok(search_hit(5)));
        let mut seq = sequencer(link);

        let report = futures::executor::block_on(seq.search());
        assert_eq!(report, Ok(SearchReport::Found { slot: 5, score: 0x64 }));

        let (sensor, feedback) = seq.into_parts();
        let link = sensor.into_inner();
        assert_eq!(link.remaining(), 0);
        assert_eq!(link.sent_instructions().as_slice(), &[0x01, 0x01, 0x01, 0x02, 0x04]);
        assert_eq!(feedback.count(&FeedbackEvent::ProgressDot), 3);
        assert_eq!(feedback.count(&FeedbackEvent::SearchPrompt), 1);
    }

    #[test]
    fn test_search_not_found_terminates() {
        let link = MockSensorLink::new();
        link.queue_code(OK);
        link.queue_code(OK);
        link.queue_reply(Ok(AckFrame::reply(0x09, &[0x00, 0x00, 0x00, 0x00])));
        let mut seq = sequencer(link);

        let report = futures::executor::block_on(seq.search());
        assert_eq!(
            report,
            Ok(SearchReport::NotFound {
                code: ResponseCode::NoSearch
            })
        );
    }

    #[test]
    fn test_search_timeout_is_not_found() {
        let link = MockSensorLink::new();
        link.queue_code(OK);
        link.queue_code(OK);
        link.queue_reply(Err(LinkError::Timeout));
        let mut seq = sequencer(link);

        let report = futures::executor::block_on(seq.search());
        assert_eq!(
            report,
            Ok(SearchReport::NotFound {
                code: ResponseCode::UndefinedError
            })
        );
    }

    #[test]
    fn test_search_feature_failure_reimages() {
        let link = MockSensorLink::new();
        link.queue_code(OK);
        link.queue_code(IMAGE_TOO_BLURRY);
        link.queue_code(OK);
        link.queue_code(OK);
        link.queue_reply(Ok(search_hit(2)));
        let mut seq = sequencer(link);

        let report = futures::executor::block_on(seq.search());
        assert_eq!(report, Ok(SearchReport::Found { slot: 2, score: 0x64 }));

        let (sensor, feedback) = seq.into_parts();
        assert_eq!(
            sensor.link().sent_instructions().as_slice(),
            &[0x01, 0x02, 0x01, 0x02, 0x04]
        );
        assert_eq!(feedback.count(&FeedbackEvent::SearchPrompt), 2);
        assert_eq!(
            feedback.count(&FeedbackEvent::Diagnostic(ResponseCode::ImageTooBlurry)),
            1
        );
    }

    #[test]
    fn test_search_bounded_policy_escalates() {
        let link = MockSensorLink::new();
        for _ in 0..3 {
            link.queue_code(NO_FINGER);
        }
        let mut seq = Sequencer::with_policy(
            Fingerprint::new(link),
            RecordingFeedback::new(),
            RetryPolicy::Limited(2),
        );

        let result = futures::executor::block_on(seq.search());
        let state = FlowState::Search(SearchState::AwaitImage);
        assert_eq!(result, Err(SequenceError::RetriesExhausted { state }));
        assert_eq!(seq.feedback().last(), Some(&FeedbackEvent::GaveUp(state)));
    }

    /// One pass from Image1 through Char2, then the template attempt if given
    fn queue_round(link: &MockSensorLink, char2: u8, template: Option<u8>) {
        link.queue_code(OK); // Image1
        link.queue_code(OK); // Char1
        link.queue_code(NO_FINGER); // finger lifted
        link.queue_code(OK); // Image2
        link.queue_code(char2);
        if let Some(template) = template {
            link.queue_code(NO_FINGER); // finger lifted
            link.queue_code(template);
        }
    }

    #[test]
    fn test_enroll_discards_both_captures() {
        let link = MockSensorLink::new();
        queue_round(&link, IMAGE_TOO_BLURRY, None);
        queue_round(&link, OK, Some(MERGE_FAIL));
        queue_round(&link, OK, Some(OK));
        link.queue_code(OK); // Store

        let session = SharedSession::new();
        session.apply_control_byte(5);
        let mut seq = sequencer(link);

        let outcome = futures::executor::block_on(seq.enroll(&session));
        assert_eq!(outcome, Ok(EnrollOutcome::Stored { slot: 5 }));
        assert_eq!(session.mode(), Mode::CreateName);
        assert_eq!(session.slot(), Some(5));

        let (sensor, feedback) = seq.into_parts();
        let link = sensor.into_inner();
        assert_eq!(link.remaining(), 0);

        let round1: &[u8] = &[0x01, 0x02, 0x01, 0x01, 0x02];
        let round2: &[u8] = &[0x01, 0x02, 0x01, 0x01, 0x02, 0x01, 0x05];
        let round3: &[u8] = &[0x01, 0x02, 0x01, 0x01, 0x02, 0x01, 0x05, 0x06];
        let expected: std::vec::Vec<u8> = [round1, round2, round3].concat();
        assert_eq!(link.sent_instructions().as_slice(), expected.as_slice());

        // Three first captures, each announced
        assert_eq!(feedback.count(&FeedbackEvent::PlaceFinger), 3);
        assert_eq!(feedback.count(&FeedbackEvent::CharFileCreated(CharBuffer::One)), 3);
        assert_eq!(feedback.last(), Some(&FeedbackEvent::Stored { slot: 5 }));

        let sent = link.sent();
        assert_eq!(&sent[sent.len() - 1][12..], &[0x05, 0x00, 0x13]);
    }

    #[test]
    fn test_enroll_waits_for_finger_lift() {
        let link = MockSensorLink::new();
        link.queue_code(OK); // Image1
        link.queue_code(OK); // Char1
        link.queue_code(OK); // still present
        link.queue_code(OK); // still present
        link.queue_code(NO_FINGER);
        link.queue_code(OK); // Image2
        link.queue_code(OK); // Char2
        link.queue_code(NO_FINGER);
        link.queue_code(OK); // CreateTemplate
        link.queue_code(0x18); // Store fails
        link.queue_code(OK); // Store

        let session = SharedSession::new();
        session.apply_control_byte(9);
        let mut seq = Sequencer::with_policy(
            Fingerprint::new(link),
            RecordingFeedback::new(),
            RetryPolicy::Limited(1),
        );

        // Finger-lift polling is not a retry; the failed Store is the only one
        let outcome = futures::executor::block_on(seq.enroll(&session));
        assert_eq!(outcome, Ok(EnrollOutcome::Stored { slot: 9 }));
        assert_eq!(seq.feedback().count(&FeedbackEvent::RemoveFinger), 2);
        assert_eq!(
            seq.feedback().count(&FeedbackEvent::Diagnostic(ResponseCode::FlashError)),
            1
        );
    }

    #[test]
    fn test_enroll_cancelled_without_slot() {
        let session = SharedSession::new();
        session.apply_control_byte(0);
        session.apply_control_byte(150);
        let mut seq = sequencer(MockSensorLink::new());

        let outcome = futures::executor::block_on(seq.enroll(&session));
        assert_eq!(outcome, Ok(EnrollOutcome::Cancelled));
        assert_eq!(session.mode(), Mode::Search);

        let (sensor, _) = seq.into_parts();
        assert!(sensor.link().sent().is_empty());
    }

    #[test]
    fn test_enroll_bounded_policy_escalates() {
        let link = MockSensorLink::new();
        link.queue_code(OK); // Image1
        link.queue_code(IMAGE_TOO_BLURRY); // Char1
        link.queue_code(NO_FINGER); // Image1

        let session = SharedSession::new();
        session.apply_control_byte(3);
        let mut seq = Sequencer::with_policy(
            Fingerprint::new(link),
            RecordingFeedback::new(),
            RetryPolicy::Limited(1),
        );

        let result = futures::executor::block_on(seq.enroll(&session));
        assert_eq!(
            result,
            Err(SequenceError::RetriesExhausted {
                state: FlowState::Enroll(EnrollState::Image1)
            })
        );
        // Still enrolling; the terminal decides what happens next
        assert_eq!(session.mode(), Mode::Import);
    }
}
