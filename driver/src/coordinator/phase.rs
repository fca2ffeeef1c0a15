use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::utils::error::HardwareError;

/// Where the sample-rate handshake with the host currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangePhase {
    /// Nothing outstanding
    #[default]
    Idle,

    /// The host has been asked to stop I/O and call back
    Requested,

    /// The host called back with perform; the new rate is being applied
    Performing,

    /// The host called back with abort; the request is being discarded
    Aborting,
}

impl ChangePhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Requested => "Requested",
            Self::Performing => "Performing",
            Self::Aborting => "Aborting",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseError {
    #[error("Invalid configuration change transition from {from:?} to {to:?}")]
    InvalidTransition { from: ChangePhase, to: ChangePhase },
}

pub type PhaseResult<T> = Result<T, PhaseError>;

impl From<PhaseError> for HardwareError {
    fn from(err: PhaseError) -> Self {
        HardwareError::IllegalOperation(err.to_string())
    }
}

/// Current phase, readable without locking
///
/// Transitions are serialized by the coordinator's lock; readers see the
/// last stored phase.
pub struct PhaseTracker {
    phase: ArcSwap<ChangePhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: ArcSwap::new(Arc::new(ChangePhase::Idle)),
        }
    }

    pub fn current(&self) -> ChangePhase {
        **self.phase.load()
    }

    /// Move to `to`, rejecting transitions the handshake does not allow
    pub fn transition(&self, to: ChangePhase) -> PhaseResult<()> {
        let from = self.current();
        if !Self::is_valid_transition(from, to) {
            return Err(PhaseError::InvalidTransition { from, to });
        }

        self.phase.store(Arc::new(to));
        tracing::debug!(from = from.name(), to = to.name(), "Configuration change phase");
        Ok(())
    }

    fn is_valid_transition(from: ChangePhase, to: ChangePhase) -> bool {
        use ChangePhase::*;

        matches!(
            (from, to),
            // a new request, or another rate while one is outstanding
            (Idle, Requested)
                | (Requested, Requested)
                // the host answered; Idle covers a perform nobody asked for
                | (Requested | Idle, Performing)
                | (Requested, Aborting)
                // done, possibly with other requests still outstanding
                | (Performing | Aborting, Idle)
                | (Performing | Aborting, Requested)
        )
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_perform_cycle() {
        let tracker = PhaseTracker::new();
        assert_eq!(tracker.current(), ChangePhase::Idle);

        tracker.transition(ChangePhase::Requested).unwrap();
        tracker.transition(ChangePhase::Performing).unwrap();
        tracker.transition(ChangePhase::Idle).unwrap();
        assert_eq!(tracker.current(), ChangePhase::Idle);
    }

    #[test]
    fn test_abort_cycle() {
        let tracker = PhaseTracker::new();
        tracker.transition(ChangePhase::Requested).unwrap();
        tracker.transition(ChangePhase::Aborting).unwrap();
        tracker.transition(ChangePhase::Idle).unwrap();
    }

    #[test]
    fn test_invalid_transitions() {
        let tracker = PhaseTracker::new();
        let err = tracker.transition(ChangePhase::Aborting).unwrap_err();
        assert_eq!(
            err,
            PhaseError::InvalidTransition {
                from: ChangePhase::Idle,
                to: ChangePhase::Aborting,
            }
        );
        assert_eq!(tracker.current(), ChangePhase::Idle);

        tracker.transition(ChangePhase::Performing).unwrap();
        assert!(tracker.transition(ChangePhase::Aborting).is_err());
        assert!(tracker.transition(ChangePhase::Performing).is_err());
    }

    #[test]
    fn test_phase_error_is_illegal_operation() {
        let err: HardwareError = PhaseError::InvalidTransition {
            from: ChangePhase::Idle,
            to: ChangePhase::Aborting,
        }
        .into();
        assert!(matches!(err, HardwareError::IllegalOperation(_)));
    }
}
