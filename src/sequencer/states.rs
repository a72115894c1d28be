//! Transition tables for the search and enrollment flows
//!
//! Every state has exactly two outgoing edges, one for an `Ok` outcome and
//! one for anything else. Each edge is tagged so the runner can tell a
//! retry (a failure sending the flow back) from forward progress.

use core::fmt;

use crate::sensor::commands::{CharBuffer, SensorCommand};

/// How an edge moves the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Forward progress
    Progress,
    /// A failed step sends the flow back
    Retry,
    /// Polling for something outside the sensor's control (finger lift,
    /// slot selection); never counted against a retry budget
    Wait,
}

/// Outgoing edge chosen for an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub next: S,
    pub kind: EdgeKind,
}

impl<S> Transition<S> {
    const fn progress(next: S) -> Self {
        Self {
            next,
            kind: EdgeKind::Progress,
        }
    }

    const fn retry(next: S) -> Self {
        Self {
            next,
            kind: EdgeKind::Retry,
        }
    }

    const fn wait(next: S) -> Self {
        Self {
            next,
            kind: EdgeKind::Wait,
        }
    }

    pub fn is_retry(&self) -> bool {
        self.kind == EdgeKind::Retry
    }
}

/// States of the search flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    AwaitImage,
    BuildFeatures,
    Search,
    Found,
    NotFound,
}

impl SearchState {
    /// Edge taken from this state for the given outcome
    pub fn next(self, ok: bool) -> Transition<Self> {
        use SearchState::*;

        match (self, ok) {
            (AwaitImage, true) => Transition::progress(BuildFeatures),
            (AwaitImage, false) => Transition::retry(AwaitImage),
            (BuildFeatures, true) => Transition::progress(Search),
            (BuildFeatures, false) => Transition::retry(AwaitImage),
            // Searched once, never retried
            (Search, true) => Transition::progress(Found),
            (Search, false) => Transition::progress(NotFound),
            (Found, _) => Transition::progress(Found),
            (NotFound, _) => Transition::progress(NotFound),
        }
    }

    /// Command issued in this state
    pub fn command(self) -> Option<SensorCommand> {
        match self {
            Self::AwaitImage => Some(SensorCommand::GetImage),
            Self::BuildFeatures => Some(SensorCommand::CreateCharFile(CharBuffer::One)),
            Self::Search => Some(SensorCommand::Search),
            Self::Found | Self::NotFound => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Found | Self::NotFound)
    }
}

/// States of the enrollment flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollState {
    WaitForId,
    Image1,
    Char1,
    WaitRemoveFinger1,
    Image2,
    Char2,
    WaitRemoveFinger2,
    BuildTemplate,
    Store,
    Done,
}

impl EnrollState {
    /// Edge taken from this state for the given outcome.
    ///
    /// For the finger-lift states `ok` means the sensor still captured an
    /// image, i.e. the finger is still on the glass. For `WaitForId` it
    /// means a nonzero slot has been latched.
    pub fn next(self, ok: bool) -> Transition<Self> {
        use EnrollState::*;

        match (self, ok) {
            (WaitForId, true) => Transition::progress(Image1),
            (WaitForId, false) => Transition::wait(WaitForId),
            (Image1, true) => Transition::progress(Char1),
            (Image1, false) => Transition::retry(Image1),
            (Char1, true) => Transition::progress(WaitRemoveFinger1),
            (Char1, false) => Transition::retry(Image1),
            (WaitRemoveFinger1, true) => Transition::wait(WaitRemoveFinger1),
            (WaitRemoveFinger1, false) => Transition::progress(Image2),
            (Image2, true) => Transition::progress(Char2),
            (Image2, false) => Transition::retry(Image2),
            // A bad second capture discards the first one as well
            (Char2, true) => Transition::progress(WaitRemoveFinger2),
            (Char2, false) => Transition::retry(Image1),
            (WaitRemoveFinger2, true) => Transition::wait(WaitRemoveFinger2),
            (WaitRemoveFinger2, false) => Transition::progress(BuildTemplate),
            (BuildTemplate, true) => Transition::progress(Store),
            (BuildTemplate, false) => Transition::retry(Image1),
            (Store, true) => Transition::progress(Done),
            (Store, false) => Transition::retry(Store),
            (Done, _) => Transition::progress(Done),
        }
    }

    /// Command issued in this state when storing into `slot`
    pub fn command(self, slot: u8) -> Option<SensorCommand> {
        match self {
            Self::Image1 | Self::WaitRemoveFinger1 | Self::Image2 | Self::WaitRemoveFinger2 => {
                Some(SensorCommand::GetImage)
            }
            Self::Char1 => Some(SensorCommand::CreateCharFile(CharBuffer::One)),
            Self::Char2 => Some(SensorCommand::CreateCharFile(CharBuffer::Two)),
            Self::BuildTemplate => Some(SensorCommand::CreateTemplate),
            Self::Store => Some(SensorCommand::Store { slot }),
            Self::WaitForId | Self::Done => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}

/// State of either flow, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Search(SearchState),
    Enroll(EnrollState),
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(state) => write!(f, "search/{:?}", state),
            Self::Enroll(state) => write!(f, "enroll/{:?}", state),
        }
    }
}

/// How often a flow may take a retry edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Retry until the step succeeds
    #[default]
    Forever,
    /// Give up after this many retry edges in one flow
    Limited(u32),
}

/// Retry edges taken so far in one flow
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    policy: RetryPolicy,
    spent: u32,
}

impl RetryBudget {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, spent: 0 }
    }

    /// Account for one retry edge. Returns false once the policy is exceeded.
    pub fn spend(&mut self) -> bool {
        self.spent = self.spent.saturating_add(1);
        match self.policy {
            RetryPolicy::Forever => true,
            RetryPolicy::Limited(limit) => self.spent <= limit,
        }
    }

    pub fn spent(&self) -> u32 {
        self.spent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_edges() {
        use SearchState::*;

        let cases = [
            (AwaitImage, true, BuildFeatures, EdgeKind::Progress),
            (AwaitImage, false, AwaitImage, EdgeKind::Retry),
            (BuildFeatures, true, Search, EdgeKind::Progress),
            (BuildFeatures, false, AwaitImage, EdgeKind::Retry),
            (Search, true, Found, EdgeKind::Progress),
            (Search, false, NotFound, EdgeKind::Progress),
        ];

        for (from, ok, to, kind) in cases {
            let edge = from.next(ok);
            assert_eq!(edge.next, to, "{:?} ok={}", from, ok);
            assert_eq!(edge.kind, kind, "{:?} ok={}", from, ok);
        }
    }

    #[test]
    fn test_enroll_edges() {
        use EnrollState::*;

        let cases = [
            (WaitForId, true, Image1, EdgeKind::Progress),
            (WaitForId, false, WaitForId, EdgeKind::Wait),
            (Image1, true, Char1, EdgeKind::Progress),
            (Image1, false, Image1, EdgeKind::Retry),
            (Char1, true, WaitRemoveFinger1, EdgeKind::Progress),
            (Char1, false, Image1, EdgeKind::Retry),
            (WaitRemoveFinger1, true, WaitRemoveFinger1, EdgeKind::Wait),
            (WaitRemoveFinger1, false, Image2, EdgeKind::Progress),
            (Image2, true, Char2, EdgeKind::Progress),
            (Image2, false, Image2, EdgeKind::Retry),
            (Char2, true, WaitRemoveFinger2, EdgeKind::Progress),
            (Char2, false, Image1, EdgeKind::Retry),
            (WaitRemoveFinger2, true, WaitRemoveFinger2, EdgeKind::Wait),
            (WaitRemoveFinger2, false, BuildTemplate, EdgeKind::Progress),
            (BuildTemplate, true, Store, EdgeKind::Progress),
            (BuildTemplate, false, Image1, EdgeKind::Retry),
            (Store, true, Done, EdgeKind::Progress),
            (Store, false, Store, EdgeKind::Retry),
        ];

        for (from, ok, to, kind) in cases {
            let edge = from.next(ok);
            assert_eq!(edge.next, to, "{:?} ok={}", from, ok);
            assert_eq!(edge.kind, kind, "{:?} ok={}", from, ok);
        }
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        for ok in [true, false] {
            assert_eq!(SearchState::Found.next(ok).next, SearchState::Found);
            assert_eq!(SearchState::NotFound.next(ok).next, SearchState::NotFound);
            assert_eq!(EnrollState::Done.next(ok).next, EnrollState::Done);
        }
        assert!(SearchState::Found.is_terminal());
        assert!(!SearchState::Search.is_terminal());
        assert!(EnrollState::Done.is_terminal());
    }

    #[test]
    fn test_state_commands() {
        assert_eq!(SearchState::AwaitImage.command(), Some(SensorCommand::GetImage));
        assert_eq!(SearchState::Found.command(), None);
        assert_eq!(
            EnrollState::Char2.command(7),
            Some(SensorCommand::CreateCharFile(CharBuffer::Two))
        );
        assert_eq!(
            EnrollState::Store.command(7),
            Some(SensorCommand::Store { slot: 7 })
        );
        assert_eq!(EnrollState::WaitRemoveFinger2.command(7), Some(SensorCommand::GetImage));
        assert_eq!(EnrollState::WaitForId.command(7), None);
    }

    #[test]
    fn test_retry_budget() {
        let mut forever = RetryBudget::new(RetryPolicy::default());
        for _ in 0..1000 {
            assert!(forever.spend());
        }

        let mut limited = RetryBudget::new(RetryPolicy::Limited(2));
        assert!(limited.spend());
        assert!(limited.spend());
        assert!(!limited.spend());
        assert_eq!(limited.spent(), 3);

        let mut none = RetryBudget::new(RetryPolicy::Limited(0));
        assert!(!none.spend());
    }

    #[test]
    fn test_flow_state_display() {
        assert_eq!(
            FlowState::Enroll(EnrollState::Store).to_string(),
            "enroll/Store"
        );
        assert_eq!(
            FlowState::Search(SearchState::AwaitImage).to_string(),
            "search/AwaitImage"
        );
    }
}
