// ABOUTME: Workout session start, completion, and abandonment plus enrollment quit
// ABOUTME: At most one session per enrollment may be in progress at a time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::schedule::{ensure_started, ScheduleEvent};
use super::transition;
use chrono::{DateTime, Utc};
use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::ids::SessionId;
use liftplan_core::models::{EnrollmentStatus, UserProgramState, WorkoutSession, WorkoutStatus};
use tracing::info;

/// Open a session for the enrollment's current day.
///
/// `open_session` is the enrollment's in-progress session, if the caller found one.
///
/// # Errors
///
/// - `SessionAlreadyInProgress` when another session is open
/// - `EnrollmentNotActive` when the enrollment has quit
pub fn start_session(
    state: &mut UserProgramState,
    open_session: Option<&WorkoutSession>,
    now: DateTime<Utc>,
) -> EngineResult<(WorkoutSession, Vec<ScheduleEvent>)> {
    if let Some(open) = open_session.filter(|s| s.status == WorkoutStatus::InProgress) {
        return Err(EngineError::SessionAlreadyInProgress { session_id: open.id });
    }
    let events = ensure_started(state, now)?;
    let session = WorkoutSession {
        id: SessionId::new(),
        enrollment_id: state.id,
        week_number: state.current_week,
        day_index: state.day_index_or_first(),
        status: WorkoutStatus::InProgress,
        started_at: now,
        finished_at: None,
    };
    info!(
        session_id = %session.id,
        enrollment_id = %state.id,
        week = session.week_number,
        day_index = session.day_index,
        "workout session started"
    );
    Ok((session, events))
}

fn finish(session: &mut WorkoutSession, to: WorkoutStatus, now: DateTime<Utc>) -> EngineResult<()> {
    session.status = transition(session.status, to)?;
    session.finished_at = Some(now);
    info!(session_id = %session.id, status = %session.status, "workout session finished");
    Ok(())
}

/// Mark a session completed
///
/// # Errors
///
/// Returns `InvalidTransition` unless the session is in progress
pub fn complete_session(session: &mut WorkoutSession, now: DateTime<Utc>) -> EngineResult<()> {
    finish(session, WorkoutStatus::Completed, now)
}

/// Mark a session abandoned; the schedule does not move
///
/// # Errors
///
/// Returns `InvalidTransition` unless the session is in progress
pub fn abandon_session(session: &mut WorkoutSession, now: DateTime<Utc>) -> EngineResult<()> {
    finish(session, WorkoutStatus::Abandoned, now)
}

/// Leave the program
///
/// # Errors
///
/// Returns `InvalidTransition` when the enrollment has already quit
pub fn quit(state: &mut UserProgramState, now: DateTime<Utc>) -> EngineResult<()> {
    state.statuses.enrollment = transition(state.statuses.enrollment, EnrollmentStatus::Quit)?;
    state.touch(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftplan_core::ids::{ProgramId, UserId};

    #[test]
    fn test_second_open_session_conflicts() {
        let now = Utc::now();
        let mut state = UserProgramState::new(UserId::new(), ProgramId::new(), now);
        let Ok((first, events)) = start_session(&mut state, None, now) else {
            unreachable!("first session must start");
        };
        assert_eq!(events.len(), 2);

        let second = start_session(&mut state, Some(&first), now);
        assert_eq!(
            second.err(),
            Some(EngineError::SessionAlreadyInProgress { session_id: first.id })
        );
    }

    #[test]
    fn test_finished_session_is_terminal() {
        let now = Utc::now();
        let mut state = UserProgramState::new(UserId::new(), ProgramId::new(), now);
        let Ok((mut session, _)) = start_session(&mut state, None, now) else {
            unreachable!("session must start");
        };
        assert!(abandon_session(&mut session, now).is_ok());
        assert!(matches!(
            complete_session(&mut session, now),
            Err(EngineError::InvalidTransition { .. })
        ));
    }
}
