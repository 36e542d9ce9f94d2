//! Failures surfaced when a process is awaited for its result.

use thiserror::Error;

/// Reason a process did not yield exactly one result.
///
/// `Failed` carries the process failure unchanged. The remaining variants
/// describe an event sequence that broke the "states, then at most one
/// result" ordering, which only a hand-built sequence passed to
/// [`Process::of`](crate::Process::of) can do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultError<E> {
    /// The process failed before producing its result.
    #[error("{0}")]
    Failed(E),
    /// The event sequence completed without a result.
    #[error("process completed without producing a result")]
    NoResult,
    /// The event sequence produced a second result.
    #[error("process produced more than one result")]
    MultipleResults,
    /// The event sequence produced a progress state after its result.
    #[error("process produced a progress state after its result")]
    StateAfterResult,
    /// The event sequence kept going after a failure, or failed after its result.
    #[error("process produced an event after it had already terminated")]
    EventAfterTerminal,
}

impl<E> ResultError<E> {
    /// Returns the process failure, if this is one.
    pub fn into_failure(self) -> Option<E> {
        match self {
            ResultError::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` when the event sequence itself was malformed.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            ResultError::MultipleResults | ResultError::StateAfterResult | ResultError::EventAfterTerminal
        )
    }
}

/// A broken event ordering detected while a run is in flight.
///
/// Carried through composed runs until a consumer turns it into the matching
/// [`ResultError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    MultipleResults,
    StateAfterResult,
    EventAfterTerminal,
}

impl Violation {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Violation::MultipleResults => "process emitted more than one result",
            Violation::StateAfterResult => "process emitted a progress state after its result",
            Violation::EventAfterTerminal => "process emitted an event after terminating",
        }
    }
}

impl<E> From<Violation> for ResultError<E> {
    fn from(violation: Violation) -> Self {
        match violation {
            Violation::MultipleResults => ResultError::MultipleResults,
            Violation::StateAfterResult => ResultError::StateAfterResult,
            Violation::EventAfterTerminal => ResultError::EventAfterTerminal,
        }
    }
}
