//! The terminal loop
//!
//! One iteration reads the current mode and runs one unit of work for it:
//! a search, an enrollment, or a single name-entry key press.

use crate::feedback::{Feedback, FeedbackEvent};
use crate::keymap::{action_for_key, Keypad, NameEntryAction};
use crate::sensor::commands::SensorCommand;
use crate::sensor::traits::SensorLink;
use crate::sequencer::runner::{EnrollOutcome, SearchReport, Sequencer};
use crate::session::{Mode, SharedSession};
use crate::users::{UserName, UserTable};

/// Owns everything the main loop needs
pub struct Terminal<'a, L, F, K> {
    sequencer: Sequencer<L, F>,
    keypad: K,
    users: UserTable,
    session: &'a SharedSession,
}

impl<'a, L: SensorLink, F: Feedback, K: Keypad> Terminal<'a, L, F, K> {
    pub fn new(sequencer: Sequencer<L, F>, keypad: K, users: UserTable, session: &'a SharedSession) -> Self {
        Self {
            sequencer,
            keypad,
            users,
            session,
        }
    }

    pub fn users(&self) -> &UserTable {
        &self.users
    }

    pub fn sequencer(&self) -> &Sequencer<L, F> {
        &self.sequencer
    }

    /// Run one unit of work for the current mode and return that mode
    pub async fn run_once(&mut self) -> Mode {
        let mode = self.session.mode();

        match mode {
            Mode::Search => self.search().await,
            Mode::Import => self.enroll().await,
            Mode::CreateName => {
                if let Some(action) = self.keypad.poll_key().await.and_then(action_for_key) {
                    self.apply_action(action).await;
                }
            }
        }

        mode
    }

    /// Report the library size, then run forever
    pub async fn run(&mut self) {
        self.report_library().await;
        loop {
            self.run_once().await;
        }
    }

    async fn search(&mut self) {
        let event = match self.sequencer.search().await {
            Ok(SearchReport::Found { slot, score }) => {
                log::info!("Matched slot {} (score {})", slot, score);
                let name = self.users.lookup(slot).map(|name| {
                    let mut owned = UserName::new();
                    let _ = owned.push_str(name);
                    owned
                });
                FeedbackEvent::Found { slot, name }
            }
            Ok(SearchReport::NotFound { code }) => {
                log::info!("No match: {}", code);
                FeedbackEvent::NotFound
            }
            // Already reported by the sequencer
            Err(_) => return,
        };
        self.emit(event).await;
    }

    /// Report how many templates the sensor holds
    pub async fn report_library(&mut self) {
        match self.sequencer.sensor_mut().template_count().await {
            Ok(count) => {
                log::info!("{} templates stored, {} names known", count, self.users.named_count());
                self.emit(FeedbackEvent::TemplateCount(count)).await;
            }
            Err(code) => {
                log::warn!("Template count failed: {}", code);
                self.emit(FeedbackEvent::Diagnostic(code)).await;
            }
        }
    }

    async fn emit(&mut self, event: FeedbackEvent) {
        self.sequencer.feedback_mut().emit(event).await;
    }

    async fn enroll(&mut self) {
        match self.sequencer.enroll(self.session).await {
            // A new template starts without a name
            Ok(EnrollOutcome::Stored { slot }) => {
                if let Err(e) = self.users.clear(u16::from(slot)) {
                    log::warn!("Stored slot {} has no name entry: {:?}", slot, e);
                }
            }
            Ok(EnrollOutcome::Cancelled) => {}
            Err(e) => log::warn!("Enrollment abandoned: {:?}", e),
        }
    }

    /// Apply one name-entry action to the name of the latched slot
    pub async fn apply_action(&mut self, action: NameEntryAction) {
        let Some(slot) = self.session.slot() else {
            log::warn!("Name entry without a slot, returning to search");
            self.session.finish();
            return;
        };
        let index = u16::from(slot);

        let event = match action {
            NameEntryAction::Push(ch) => self.users.push_char(index, ch).map(name_changed),
            NameEntryAction::Backspace => self.users.backspace(index).map(name_changed),
            NameEntryAction::ClearName => self.users.clear(index).map(|()| name_changed("")),
            NameEntryAction::DeleteAllFingerprints => {
                self.delete_all().await;
                return;
            }
            NameEntryAction::Finish => {
                self.session.finish();
                log::info!("Name for slot {} is {:?}", slot, self.users.lookup(index));
                Ok(FeedbackEvent::NameCreated { slot })
            }
        };

        match event {
            Ok(event) => self.emit(event).await,
            Err(e) => log::warn!("Name entry for slot {} failed: {:?}", slot, e),
        }
    }

    /// Erase the template library; user names are kept
    async fn delete_all(&mut self) {
        let code = self.sequencer.sensor_mut().run(SensorCommand::DeleteAll).await;
        if code.is_ok() {
            log::info!("Template library cleared");
            self.emit(FeedbackEvent::DatabaseCleared).await;
            self.report_library().await;
        } else {
            self.emit(FeedbackEvent::Diagnostic(code)).await;
        }
    }
}

fn name_changed(name: &str) -> FeedbackEvent {
    let mut owned = UserName::new();
    let _ = owned.push_str(name);
    FeedbackEvent::NameChanged(owned)
}
