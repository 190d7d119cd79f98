// ABOUTME: Enrollment, schedule advancement, and workout session operations for the training service
// ABOUTME: Enrollment writes are compare-and-swap on the version read at the start of each call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AdvanceReport, FiredProgression, LoggedSet, TrainingService};
use crate::database::TrainingStore;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use liftplan_core::errors::EngineError;
use liftplan_core::ids::{LiftId, ProgramId, SessionId, UserId};
use liftplan_core::models::{
    AdvanceKind, MeetPlan, RotationState, StateMachineKind, TriggerContext, TriggerType,
    UserProgramState, WorkoutSession, WorkoutStatus,
};
use liftplan_engine::progression::set_trigger;
use liftplan_engine::state_machine::{
    self, abandon_session, advance, complete_session, start_session, ProgramShape, ScheduleEvent,
};
use std::collections::HashSet;
use tracing::{info, instrument};

impl<S: TrainingStore> TrainingService<S> {
    /// Enroll a user at week 1, cycle 1.
    ///
    /// A user who quit may enroll again; the quit enrollment is replaced.
    ///
    /// # Errors
    ///
    /// - `RESOURCE_NOT_FOUND` for an unknown program
    /// - `RESOURCE_CONFLICT` while the user has an enrollment that has not quit
    #[instrument(skip(self), fields(user_id = %user_id, program_id = %program_id))]
    pub async fn enroll(
        &self,
        user_id: UserId,
        program_id: ProgramId,
        now: DateTime<Utc>,
    ) -> AppResult<UserProgramState> {
        let program = self.catalog.program(program_id)?;
        let mut state = UserProgramState::new(user_id, program_id, now);
        state.rotation = program
            .rotation_length
            .filter(|length| *length > 0)
            .map(|length| RotationState {
                position: 0,
                length,
            });

        self.store.create_enrollment(state.clone()).await?;
        info!(enrollment_id = %state.id, program = %program.slug, "user enrolled");
        Ok(state)
    }

    /// Set or replace the meet date the enrollment peaks for
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` without an enrollment and `RESOURCE_CONFLICT`
    /// when the enrollment changed concurrently
    pub async fn plan_meet(
        &self,
        user_id: UserId,
        meet_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<UserProgramState> {
        let mut state = self.enrollment(user_id).await?;
        let expected = state.version;
        state.meet = Some(MeetPlan { meet_date });
        state.touch(now);
        self.store.save_enrollment(&state, expected).await?;
        Ok(state)
    }

    /// Leave the program
    ///
    /// # Errors
    ///
    /// Returns `INVALID_TRANSITION` when the user already quit
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn quit(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<UserProgramState> {
        let mut state = self.enrollment(user_id).await?;
        let expected = state.version;
        state_machine::quit(&mut state, now)?;
        self.store.save_enrollment(&state, expected).await?;
        info!(enrollment_id = %state.id, "user quit program");
        Ok(state)
    }

    /// Move the schedule by a day, week, or cycle and fire the schedule triggers
    /// of the linked progressions
    ///
    /// # Errors
    ///
    /// - `ENROLLMENT_NOT_ACTIVE` after quitting, or for day and week advances
    ///   between cycles
    /// - `RESOURCE_CONFLICT` when the enrollment changed concurrently
    #[instrument(skip(self), fields(user_id = %user_id, kind = ?kind))]
    pub async fn advance_state(
        &self,
        user_id: UserId,
        kind: AdvanceKind,
        now: DateTime<Utc>,
    ) -> AppResult<AdvanceReport> {
        let state = self.enrollment(user_id).await?;
        let shape = ProgramShape::from_catalog(&self.catalog, state.program_id)?;
        let outcome = advance(&state, &shape, kind, now)?;
        self.store.save_enrollment(&outcome.state, state.version).await?;

        let progressions = self.fire_schedule_triggers(&outcome, now).await;
        Ok(AdvanceReport {
            state: outcome.state,
            events: outcome.events,
            progressions,
        })
    }

    /// Open a workout session for the current day, starting the cycle and week if
    /// they are still pending
    ///
    /// # Errors
    ///
    /// - `SESSION_ALREADY_IN_PROGRESS` when a session is open
    /// - `ENROLLMENT_NOT_ACTIVE` after quitting
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn start_workout(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<(WorkoutSession, Vec<ScheduleEvent>)> {
        let mut state = self.enrollment(user_id).await?;
        let expected = state.version;
        let open = self.store.open_session(state.id).await?;
        let (session, events) = start_session(&mut state, open.as_ref(), now)?;

        if state.version != expected {
            self.store.save_enrollment(&state, expected).await?;
        }
        self.store.save_session(session.clone()).await?;
        Ok((session, events))
    }

    /// Complete a session, advance to the next day, and fire `AFTER_SESSION` for
    /// the lifts of the completed day plus any week and cycle triggers
    ///
    /// # Errors
    ///
    /// - `RESOURCE_NOT_FOUND` for a session outside the user's enrollment
    /// - `INVALID_TRANSITION` unless the session is in progress
    #[instrument(skip(self), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn complete_workout(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> AppResult<AdvanceReport> {
        let state = self.enrollment(user_id).await?;
        let mut session = self.owned_session(&state, session_id).await?;
        complete_session(&mut session, now)?;
        let lifts = self.day_lifts(state.program_id, session.week_number, session.day_index)?;

        let shape = ProgramShape::from_catalog(&self.catalog, state.program_id)?;
        let outcome = advance(&state, &shape, AdvanceKind::Day, now)?;
        // A lost enrollment race leaves the session open for another attempt
        self.store.save_enrollment(&outcome.state, state.version).await?;
        self.store.save_session(session.clone()).await?;

        let context = TriggerContext::new(TriggerType::AfterSession, now)
            .with_session(session.id)
            .with_schedule(state.cycle_iteration, session.week_number);
        let mut progressions = self.fire_linked(&outcome.state, &context, Some(&lifts)).await;
        progressions.extend(self.fire_schedule_triggers(&outcome, now).await);

        Ok(AdvanceReport {
            state: outcome.state,
            events: outcome.events,
            progressions,
        })
    }

    /// Abandon a session; the schedule stays on the same day
    ///
    /// # Errors
    ///
    /// Returns `INVALID_TRANSITION` unless the session is in progress
    pub async fn abandon_workout(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> AppResult<WorkoutSession> {
        let state = self.enrollment(user_id).await?;
        let mut session = self.owned_session(&state, session_id).await?;
        abandon_session(&mut session, now)?;
        self.store.save_session(session.clone()).await?;
        Ok(session)
    }

    /// Log a performed set against an open session.
    ///
    /// A set short of its target fires `ON_FAILURE`, otherwise `AFTER_SET`. AMRAP
    /// reps are remembered for later `AMRAP_GUIDED` triggers.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_TRANSITION` when the session is not in progress
    #[instrument(skip(self, set), fields(user_id = %user_id, session_id = %session_id, lift_id = %set.lift_id))]
    pub async fn record_set(
        &self,
        user_id: UserId,
        session_id: SessionId,
        set: LoggedSet,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<FiredProgression>> {
        let state = self.enrollment(user_id).await?;
        let session = self.owned_session(&state, session_id).await?;
        if session.status != WorkoutStatus::InProgress {
            return Err(EngineError::invalid_transition(
                StateMachineKind::Workout,
                session.status,
                WorkoutStatus::InProgress,
            )
            .into());
        }
        self.catalog.lift(set.lift_id)?;

        if set.is_amrap {
            self.store
                .record_amrap_result(user_id, set.lift_id, set.actual_reps, now)
                .await?;
        }

        let context = set_trigger(set.target_reps, set.actual_reps, set.is_amrap, now)
            .with_session(session.id)
            .with_schedule(state.cycle_iteration, session.week_number);
        let lifts = HashSet::from([set.lift_id]);
        Ok(self.fire_linked(&state, &context, Some(&lifts)).await)
    }

    async fn owned_session(
        &self,
        state: &UserProgramState,
        session_id: SessionId,
    ) -> AppResult<WorkoutSession> {
        self.store
            .get_session(session_id)
            .await?
            .filter(|session| session.enrollment_id == state.id)
            .ok_or_else(|| AppError::not_found(format!("session {session_id}")))
    }

    fn day_lifts(
        &self,
        program_id: ProgramId,
        week_number: u32,
        day_index: u32,
    ) -> AppResult<HashSet<LiftId>> {
        let day = self.catalog.program_day(program_id, week_number, day_index)?;
        let lifts = day
            .prescriptions
            .iter()
            .map(|id| self.catalog.prescription(*id).map(|p| p.lift_id))
            .collect::<Result<HashSet<_>, EngineError>>()?;
        Ok(lifts)
    }
}
