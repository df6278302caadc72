// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{BookingError, SubmissionState};

/// Allowed moves of a single submit attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionLifecycle;

impl SubmissionLifecycle {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_transition(
        &self,
        current: SubmissionState,
        next: SubmissionState,
    ) -> Result<(), BookingError> {
        if !self.get_valid_transitions(current).contains(&next) {
            warn!("Invalid submission transition attempted: {} -> {}", current, next);
            return Err(BookingError::InvalidTransition { from: current, to: next });
        }

        debug!("Submission transition: {} -> {}", current, next);
        Ok(())
    }

    pub fn get_valid_transitions(&self, current: SubmissionState) -> Vec<SubmissionState> {
        match current {
            SubmissionState::Idle => vec![SubmissionState::Validating],
            SubmissionState::Validating => vec![
                SubmissionState::Idle,
                SubmissionState::Exporting,
            ],
            SubmissionState::Exporting => vec![
                SubmissionState::Idle, // export failed
                SubmissionState::Submitting,
            ],
            SubmissionState::Submitting => vec![
                SubmissionState::Idle, // backend rejected, may resubmit
                SubmissionState::Done,
            ],
            // Terminal
            SubmissionState::Done => vec![],
        }
    }

    pub fn is_terminal(&self, state: SubmissionState) -> bool {
        self.get_valid_transitions(state).is_empty()
    }
}
