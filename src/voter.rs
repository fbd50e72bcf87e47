//! Stability voting.
//!
//! Per-frame recognition is noisy; a plate is only trusted once the same
//! validated text has been seen across enough consecutive cycles. A miss
//! (no validated plate this cycle) leaves the streak alone, which gives
//! resilience against occasional misreads; a different plate restarts the
//! streak at 1.

use crate::models::{ValidatedPlate, VoteState};
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoterPhase {
    Idle,
    Scanning,
    Locked,
}

/// What one cycle's observation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Keep scanning.
    Pending,
    /// Enough consecutive agreement; the plate is locked.
    Locked(String),
}

pub struct StabilityVoter {
    required_streak: u32,
    phase: VoterPhase,
    state: VoteState,
}

impl StabilityVoter {
    pub fn new(required_streak: u32) -> Self {
        Self {
            required_streak,
            phase: VoterPhase::Idle,
            state: VoteState::default(),
        }
    }

    pub fn phase(&self) -> VoterPhase {
        self.phase
    }

    pub fn state(&self) -> &VoteState {
        &self.state
    }

    /// Enter `Scanning` from `Idle`. No-op while already scanning.
    pub fn begin_scan(&mut self) {
        if self.phase == VoterPhase::Idle {
            self.phase = VoterPhase::Scanning;
        }
    }

    /// Clear all voting state and return to `Idle`. This is the only way
    /// out of `Locked`.
    pub fn reset(&mut self) {
        self.phase = VoterPhase::Idle;
        self.state = VoteState::default();
    }

    /// Feed one completed recognition cycle's validated plate (or miss)
    /// into the state machine.
    pub fn observe(&mut self, plate: Option<&ValidatedPlate>) -> VoteOutcome {
        match self.phase {
            VoterPhase::Locked => {
                // Terminal until an explicit reset.
                return VoteOutcome::Locked(
                    self.state.candidate.clone().unwrap_or_default(),
                );
            }
            VoterPhase::Idle => return VoteOutcome::Pending,
            VoterPhase::Scanning => {}
        }

        let Some(plate) = plate else {
            // A miss does not reset the streak.
            debug!(
                "cycle miss, streak held at {} for {:?}",
                self.state.streak_count, self.state.candidate
            );
            return VoteOutcome::Pending;
        };

        if self.state.candidate.as_deref() == Some(plate.normalized_text.as_str()) {
            self.state.streak_count += 1;
            if self.state.streak_count >= self.required_streak {
                self.phase = VoterPhase::Locked;
                info!(
                    "plate {:?} locked after {} agreeing cycles",
                    plate.normalized_text, self.state.streak_count
                );
                return VoteOutcome::Locked(plate.normalized_text.clone());
            }
        } else {
            self.state.candidate = Some(plate.normalized_text.clone());
            self.state.streak_count = 1;
        }

        VoteOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(text: &str) -> ValidatedPlate {
        ValidatedPlate {
            normalized_text: text.to_string(),
        }
    }

    fn scanning_voter(required: u32) -> StabilityVoter {
        let mut voter = StabilityVoter::new(required);
        voter.begin_scan();
        voter
    }

    #[test]
    fn same_plate_twice_locks() {
        let mut voter = scanning_voter(2);
        assert_eq!(voter.observe(Some(&plate("ABC-1234"))), VoteOutcome::Pending);
        assert_eq!(
            voter.observe(Some(&plate("ABC-1234"))),
            VoteOutcome::Locked("ABC-1234".to_string())
        );
        assert_eq!(voter.phase(), VoterPhase::Locked);
    }

    #[test]
    fn different_plate_restarts_streak() {
        let mut voter = scanning_voter(2);
        voter.observe(Some(&plate("ABC-1234")));
        assert_eq!(voter.observe(Some(&plate("XYZ-5678"))), VoteOutcome::Pending);
        assert_eq!(voter.phase(), VoterPhase::Scanning);
        assert_eq!(voter.state().candidate.as_deref(), Some("XYZ-5678"));
        assert_eq!(voter.state().streak_count, 1);
    }

    #[test]
    fn miss_does_not_reset_streak() {
        let mut voter = scanning_voter(2);
        voter.observe(Some(&plate("ABC-1234")));
        assert_eq!(voter.observe(None), VoteOutcome::Pending);
        assert_eq!(voter.state().streak_count, 1);
        assert_eq!(
            voter.observe(Some(&plate("ABC-1234"))),
            VoteOutcome::Locked("ABC-1234".to_string())
        );
    }

    #[test]
    fn locked_is_terminal_until_reset() {
        let mut voter = scanning_voter(2);
        voter.observe(Some(&plate("ABC-1234")));
        voter.observe(Some(&plate("ABC-1234")));
        assert_eq!(
            voter.observe(Some(&plate("XYZ-5678"))),
            VoteOutcome::Locked("ABC-1234".to_string())
        );

        voter.reset();
        assert_eq!(voter.phase(), VoterPhase::Idle);
        assert_eq!(*voter.state(), VoteState::default());
    }

    #[test]
    fn observe_while_idle_is_ignored() {
        let mut voter = StabilityVoter::new(2);
        assert_eq!(voter.observe(Some(&plate("ABC-1234"))), VoteOutcome::Pending);
        assert_eq!(voter.state().streak_count, 0);
    }
}
