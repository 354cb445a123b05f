use crate::domain::model::{AssignmentSet, Roster};
use crate::domain::ports::AssignmentService;
use crate::core::validator::MIN_ROSTER_SIZE;
use crate::utils::error::{Result, SantaError};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
    Succeeded,
    Failed,
}

impl GenerationState {
    fn can_transition_to(self, next: GenerationState) -> bool {
        use GenerationState::*;
        matches!(
            (self, next),
            (Idle, Generating)
                | (Generating, Succeeded)
                | (Generating, Failed)
                | (Generating, Idle)
                | (Succeeded, Idle)
                | (Failed, Idle)
        )
    }
}

/// An assignment set together with the roster revision it was generated from.
#[derive(Debug, Clone)]
pub struct GeneratedAssignments {
    pub assignments: AssignmentSet,
    pub roster_revision: u64,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives one remote generation at a time and keeps the last good result.
pub struct AssignmentOrchestrator<A: AssignmentService> {
    service: A,
    state: Mutex<GenerationState>,
    last_outcome: Mutex<Option<GenerationState>>,
    current: Mutex<Option<GeneratedAssignments>>,
}

/// Returns the state machine to `Idle` if a generation future is dropped
/// before the remote call settles.
struct GeneratingGuard<'a> {
    state: &'a Mutex<GenerationState>,
    settled: bool,
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = lock(self.state);
            tracing::warn!("Generation abandoned before completion, returning to Idle");
            *state = GenerationState::Idle;
        }
    }
}

impl<A: AssignmentService> AssignmentOrchestrator<A> {
    pub fn new(service: A) -> Self {
        Self {
            service,
            state: Mutex::new(GenerationState::Idle),
            last_outcome: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    pub fn state(&self) -> GenerationState {
        *lock(&self.state)
    }

    /// `Succeeded` or `Failed` for the most recent finished call.
    pub fn last_outcome(&self) -> Option<GenerationState> {
        *lock(&self.last_outcome)
    }

    pub fn current(&self) -> Option<GeneratedAssignments> {
        lock(&self.current).clone()
    }

    fn transition(&self, next: GenerationState) {
        let mut state = lock(&self.state);
        debug_assert!(
            state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            *state,
            next
        );
        tracing::debug!("Generation state {:?} -> {:?}", *state, next);
        *state = next;
    }

    fn begin(&self) -> Result<GeneratingGuard<'_>> {
        let mut state = lock(&self.state);
        if *state != GenerationState::Idle {
            return Err(SantaError::Busy {
                action: "generation",
            });
        }
        tracing::debug!("Generation state {:?} -> {:?}", *state, GenerationState::Generating);
        *state = GenerationState::Generating;
        Ok(GeneratingGuard {
            state: &self.state,
            settled: false,
        })
    }

    /// Issue exactly one remote call for `roster`. On success the result
    /// replaces the held assignment set; on failure the previous set stays.
    pub async fn generate(
        &self,
        roster: &Roster,
        roster_revision: u64,
        year: i32,
    ) -> Result<AssignmentSet> {
        if roster.len() < MIN_ROSTER_SIZE {
            return Err(SantaError::CardinalityError {
                found: roster.len(),
                required: MIN_ROSTER_SIZE,
            });
        }

        let mut guard = self.begin()?;
        tracing::info!(
            "🎁 Requesting assignments for {} employees ({})",
            roster.len(),
            year
        );
        let outcome = self.service.generate(year, roster).await;
        guard.settled = true;

        match outcome {
            Ok(assignments) => {
                tracing::info!("Received {} assignments", assignments.len());
                *lock(&self.current) = Some(GeneratedAssignments {
                    assignments: assignments.clone(),
                    roster_revision,
                });
                self.finish(GenerationState::Succeeded);
                Ok(assignments)
            }
            Err(e) => {
                tracing::error!("Assignment generation failed: {}", e);
                self.finish(GenerationState::Failed);
                Err(e)
            }
        }
    }

    fn finish(&self, outcome: GenerationState) {
        self.transition(outcome);
        *lock(&self.last_outcome) = Some(outcome);
        self.transition(GenerationState::Idle);
    }
}
