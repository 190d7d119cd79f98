// ABOUTME: Progression triggers for the training service, manual and schedule-driven
// ABOUTME: Persists the log before the new max so a duplicate trigger never changes a max twice
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{FiredProgression, TrainingService};
use crate::database::{StoreError, TrainingStore};
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use liftplan_core::ids::{LiftId, ProgressionId, UserId};
use liftplan_core::models::{
    ProgressionDefinition, ProgressionLog, ProgressionLogKey, ProgressionRule, TriggerContext,
    TriggerType, UserProgramState,
};
use liftplan_engine::state_machine::AdvanceOutcome;
use liftplan_engine::{ProgressionInput, ProgressionResult, ReferenceMaxSource, SkipReason};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

impl<S: TrainingStore> TrainingService<S> {
    /// Deliver a trigger to one progression for one lift.
    ///
    /// The increment override comes from the user's current program link, when the
    /// user is enrolled and the program links this rule to the lift. Delivering the
    /// same (user, progression, lift, trigger type, `triggered_at`) twice returns
    /// `Skipped(AlreadyApplied)` the second time.
    ///
    /// # Errors
    ///
    /// - `RESOURCE_NOT_FOUND` for an unknown progression or lift
    /// - `MISSING_REFERENCE_MAX` when the rule's max kind has no value
    /// - `MISSING_TRIGGER_CONTEXT` for an AMRAP rule with no AMRAP result on record
    #[instrument(
        skip(self, context),
        fields(user_id = %user_id, progression_id = %progression_id, lift_id = %lift_id, trigger = %context.trigger_type)
    )]
    pub async fn trigger_progression(
        &self,
        user_id: UserId,
        progression_id: ProgressionId,
        lift_id: LiftId,
        context: TriggerContext,
    ) -> AppResult<ProgressionResult> {
        let definition = self.catalog.progression(progression_id)?;
        self.catalog.lift(lift_id)?;

        let increment_override = self
            .store
            .get_enrollment(user_id)
            .await?
            .and_then(|state| {
                self.catalog
                    .program_progression(state.program_id, lift_id, progression_id)
                    .and_then(|link| link.increment_override)
            });

        self.apply_progression(user_id, lift_id, definition, increment_override, &context)
            .await
    }

    /// Progression history for a user, oldest first
    ///
    /// # Errors
    ///
    /// Returns `STORAGE_ERROR` when the store fails
    pub async fn list_progression_logs(
        &self,
        user_id: UserId,
        lift_id: Option<LiftId>,
    ) -> AppResult<Vec<ProgressionLog>> {
        Ok(self.store.list_progression_logs(user_id, lift_id).await?)
    }

    async fn apply_progression(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        definition: &ProgressionDefinition,
        increment_override: Option<f64>,
        context: &TriggerContext,
    ) -> AppResult<ProgressionResult> {
        let key = ProgressionLogKey {
            user_id,
            progression_id: definition.id,
            lift_id,
            trigger_type: context.trigger_type,
            triggered_at: context.triggered_at,
        };
        let already_applied = self.store.progression_log_exists(&key).await?;

        // Rows written by earlier triggers of the same period carry its triggered_at
        let cutoff = context.triggered_at.max(Utc::now());
        let book = self.max_book(user_id, Some(cutoff)).await?;
        let current_max = book.current_max(lift_id, definition.rule.max_kind());
        let failure_counter = self
            .store
            .get_failure_counter(user_id, lift_id, definition.id)
            .await?;
        let stage_state = self
            .store
            .get_progression_state(user_id, lift_id, definition.id)
            .await?;

        let mut context = context.clone();
        if matches!(definition.rule, ProgressionRule::AmrapGuided { .. })
            && context.amrap_reps.is_none()
        {
            context.amrap_reps = self.store.latest_amrap_result(user_id, lift_id).await?;
        }

        let input = ProgressionInput::new(
            user_id,
            lift_id,
            definition,
            &context,
            context.triggered_at,
        )
        .with_current_max(current_max)
        .with_increment_override(increment_override)
        .with_failure_counter(failure_counter.as_ref())
        .with_stage_state(stage_state.as_ref())
        .already_applied(already_applied);

        let result = self.engine.apply(&input)?;
        let ProgressionResult::Applied(applied) = &result else {
            return Ok(result);
        };

        // The log insert is the exactly-once gate; nothing else is written if it loses.
        match self.store.insert_progression_log(applied.log.clone()).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation { .. }) => {
                debug!(progression_id = %definition.id, "lost progression log race");
                return Ok(ProgressionResult::Skipped {
                    reason: SkipReason::AlreadyApplied,
                });
            }
            Err(e) => return Err(e.into()),
        }
        if let Some(max) = &applied.new_max {
            self.store.insert_reference_max(max.clone()).await?;
        }
        if let Some(counter) = &applied.failure_counter {
            self.store.save_failure_counter(counter.clone()).await?;
        }
        if let Some(stage) = &applied.stage_state {
            self.store.save_progression_state(stage.clone()).await?;
        }
        if applied.retest_required {
            info!(lift_id = %lift_id, "stage progression requires a one-rep max retest");
        }

        Ok(result)
    }

    /// Deliver `context` to every enabled link of the enrollment's program whose rule
    /// listens to it, optionally only for `lifts`. Failures are collected per link.
    pub(super) async fn fire_linked(
        &self,
        state: &UserProgramState,
        context: &TriggerContext,
        lifts: Option<&HashSet<LiftId>>,
    ) -> Vec<FiredProgression> {
        let mut fired = Vec::new();
        for link in self.catalog.program_progressions(state.program_id) {
            if lifts.is_some_and(|wanted| !wanted.contains(&link.lift_id)) {
                continue;
            }
            let Ok(definition) = self.catalog.progression(link.progression_id) else {
                warn!(progression_id = %link.progression_id, "program links an unknown progression");
                continue;
            };
            if !definition.rule.listens_to(context.trigger_type) {
                continue;
            }

            let outcome = self
                .apply_progression(
                    state.user_id,
                    link.lift_id,
                    definition,
                    link.increment_override,
                    context,
                )
                .await;
            if let Err(e) = &outcome {
                warn!(
                    user_id = %state.user_id,
                    lift_id = %link.lift_id,
                    progression_id = %link.progression_id,
                    error = %e,
                    "progression trigger failed"
                );
            }
            fired.push(FiredProgression {
                progression_id: link.progression_id,
                lift_id: link.lift_id,
                trigger_type: context.trigger_type,
                outcome,
            });
        }
        fired
    }

    /// `AFTER_WEEK` for each week the advance completed and `AFTER_CYCLE` for a
    /// completed cycle
    pub(super) async fn fire_schedule_triggers(
        &self,
        outcome: &AdvanceOutcome,
        now: DateTime<Utc>,
    ) -> Vec<FiredProgression> {
        let mut fired = Vec::new();
        for (cycle_iteration, week_number) in outcome.completed_weeks() {
            let context = TriggerContext::new(TriggerType::AfterWeek, now)
                .with_schedule(cycle_iteration, week_number);
            fired.extend(self.fire_linked(&outcome.state, &context, None).await);
        }
        if let Some(cycle_iteration) = outcome.completed_cycle() {
            let mut context = TriggerContext::new(TriggerType::AfterCycle, now);
            context.cycle_iteration = Some(cycle_iteration);
            fired.extend(self.fire_linked(&outcome.state, &context, None).await);
        }
        fired
    }
}
