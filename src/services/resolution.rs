// ABOUTME: Workout and week resolution plus reference max recording for the training service
// ABOUTME: Builds each user's reference max book from storage before resolving
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::TrainingService;
use crate::database::TrainingStore;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use liftplan_core::ids::{LiftId, ProgramId, UserId};
use liftplan_core::models::{MaxKind, ProgressionRule, ReferenceMax, ScheduleCoordinate, Workout};
use liftplan_engine::rounding::derive_training_max;
use liftplan_engine::{
    ActiveStages, DayResolution, PrescriptionResolver, ReferenceMaxBook, ResolutionError,
};
use std::sync::Arc;
use tokio::task;
use tracing::{info, instrument};

impl<S: TrainingStore> TrainingService<S> {
    /// The user's reference maxes, optionally ignoring rows effective after `as_of`
    ///
    /// # Errors
    ///
    /// Returns `STORAGE_ERROR` when the store fails
    pub async fn max_book(
        &self,
        user_id: UserId,
        as_of: Option<DateTime<Utc>>,
    ) -> AppResult<ReferenceMaxBook> {
        let rows = self.store.list_reference_maxes(user_id).await?;
        let book = match as_of {
            Some(cutoff) => ReferenceMaxBook::as_of(rows, cutoff),
            None => ReferenceMaxBook::new(rows),
        };
        Ok(book
            .with_lifts(self.catalog.lifts())
            .with_formula(self.config.e1rm_formula))
    }

    /// Active stage of every lift the program links to a `STAGE` rule
    ///
    /// # Errors
    ///
    /// Returns `STORAGE_ERROR` when the store fails
    pub async fn active_stages(
        &self,
        user_id: UserId,
        program_id: ProgramId,
    ) -> AppResult<ActiveStages> {
        let mut stages = ActiveStages::new();
        for link in self.catalog.program_progressions(program_id) {
            let Ok(definition) = self.catalog.progression(link.progression_id) else {
                continue;
            };
            if !matches!(definition.rule, ProgressionRule::Stage { .. }) {
                continue;
            }
            let state = self
                .store
                .get_progression_state(user_id, link.lift_id, definition.id)
                .await?;
            stages.insert(link.lift_id, &definition.rule, state.as_ref());
        }
        Ok(stages)
    }

    /// Append a reference max row.
    ///
    /// Recording a one-rep max clears any pending retest on the lift's stage rules.
    ///
    /// # Errors
    ///
    /// - `RESOURCE_NOT_FOUND` for an unknown lift
    /// - `VALIDATION_ERROR` for a non-positive or non-finite value
    #[instrument(skip(self), fields(user_id = %user_id, lift_id = %lift_id, kind = %kind))]
    pub async fn record_max(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        kind: MaxKind,
        value: f64,
        effective_at: DateTime<Utc>,
    ) -> AppResult<ReferenceMax> {
        self.catalog.lift(lift_id)?;
        if !value.is_finite() || value <= 0.0 {
            return Err(AppError::invalid_input(format!(
                "reference max must be a positive number, got {value}"
            )));
        }

        let max = ReferenceMax::new(user_id, lift_id, kind, value, effective_at);
        self.store.insert_reference_max(max.clone()).await?;

        if kind == MaxKind::OneRm {
            for mut state in self.store.list_progression_states(user_id, lift_id).await? {
                if state.stage_data.retest_pending {
                    state.stage_data.retest_pending = false;
                    self.store.save_progression_state(state).await?;
                }
            }
        }

        info!(value, "reference max recorded");
        Ok(max)
    }

    /// Record a one-rep max together with the training max derived from it
    ///
    /// # Errors
    ///
    /// Same as [`Self::record_max`]
    pub async fn record_one_rep_max(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        one_rep_max: f64,
        effective_at: DateTime<Utc>,
    ) -> AppResult<(ReferenceMax, ReferenceMax)> {
        let one_rm = self
            .record_max(user_id, lift_id, MaxKind::OneRm, one_rep_max, effective_at)
            .await?;
        let training_max = derive_training_max(
            one_rep_max,
            self.config.training_max_percent,
            self.config.default_round_to,
        );
        let training = self
            .record_max(
                user_id,
                lift_id,
                MaxKind::TrainingMax,
                training_max,
                effective_at,
            )
            .await?;
        Ok((one_rm, training))
    }

    /// Resolve one program day for a user.
    ///
    /// Prescriptions that cannot be resolved are left out of the workout and
    /// returned together in the error list.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural problems: unknown program, week, or
    /// day, or a program table that is missing from the catalog
    #[instrument(skip(self), fields(user_id = %user_id, program_id = %program_id))]
    pub async fn resolve_workout(
        &self,
        program_id: ProgramId,
        user_id: UserId,
        coordinate: &ScheduleCoordinate,
    ) -> AppResult<(Workout, Vec<ResolutionError>)> {
        let book = self.max_book(user_id, Some(Utc::now())).await?;
        let stages = self.active_stages(user_id, program_id).await?;
        let resolution = PrescriptionResolver::new(&self.catalog)
            .with_stages(&stages)
            .resolve_program_day(program_id, &book, coordinate)?;
        Ok((resolution.workout, resolution.errors))
    }

    /// Resolve the day the user's enrollment points at
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` without an enrollment, plus the structural
    /// errors of [`Self::resolve_workout`]
    pub async fn resolve_current_workout(&self, user_id: UserId) -> AppResult<DayResolution> {
        let state = self.enrollment(user_id).await?;
        let coordinate = ScheduleCoordinate::new(
            state.cycle_iteration,
            state.current_week,
            state.day_index_or_first(),
        );
        let book = self.max_book(user_id, Some(Utc::now())).await?;
        let stages = self.active_stages(user_id, state.program_id).await?;
        Ok(PrescriptionResolver::new(&self.catalog)
            .with_stages(&stages)
            .resolve_program_day(state.program_id, &book, &coordinate)?)
    }

    /// Resolve every day of a week on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns structural resolution errors, or `INTERNAL_ERROR` if the worker task
    /// is lost
    #[instrument(skip(self), fields(user_id = %user_id, program_id = %program_id))]
    pub async fn resolve_week(
        &self,
        user_id: UserId,
        program_id: ProgramId,
        cycle_iteration: u32,
        week_number: u32,
    ) -> AppResult<Vec<DayResolution>> {
        let book = self.max_book(user_id, Some(Utc::now())).await?;
        let stages = self.active_stages(user_id, program_id).await?;
        let catalog = Arc::clone(&self.catalog);
        let days = task::spawn_blocking(move || {
            PrescriptionResolver::new(&catalog)
                .with_stages(&stages)
                .resolve_week(program_id, &book, cycle_iteration, week_number)
        })
        .await
        .map_err(|e| AppError::internal(format!("week resolution task failed: {e}")))??;
        Ok(days)
    }
}
