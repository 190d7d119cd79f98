// ABOUTME: Training service facade over the engine and the persistence collaborator
// ABOUTME: Loads per-user records, runs engine operations, and writes the results back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! [`TrainingService`] is the entry point used by an outer API layer. The catalog
//! is shared and read-only; every per-user record is loaded per call and written
//! back explicitly. Operations are split by concern:
//!
//! - `resolution`: workouts, weeks, and reference maxes
//! - `progression`: progression triggers and history
//! - `schedule`: enrollment, schedule advancement, and workout sessions

mod progression;
mod resolution;
mod schedule;

use crate::config::EngineConfig;
use crate::database::TrainingStore;
use crate::errors::{AppError, AppResult};
use liftplan_core::ids::{LiftId, ProgressionId, UserId};
use liftplan_core::models::{StateMachineKind, TriggerType, UserProgramState};
use liftplan_core::Catalog;
use liftplan_engine::state_machine::{transition_named, ScheduleEvent};
use liftplan_engine::{ProgressionEngine, ProgressionResult};
use std::sync::Arc;

/// A progression the service fired in response to a schedule or set event
#[derive(Debug)]
pub struct FiredProgression {
    /// Rule fired
    pub progression_id: ProgressionId,
    /// Lift progressed
    pub lift_id: LiftId,
    /// Trigger delivered
    pub trigger_type: TriggerType,
    /// Applied, skipped, or the error that stopped it
    pub outcome: AppResult<ProgressionResult>,
}

impl FiredProgression {
    /// Whether the rule changed anything
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.outcome
            .as_ref()
            .is_ok_and(ProgressionResult::is_applied)
    }
}

/// Result of moving an enrollment's schedule
#[derive(Debug)]
pub struct AdvanceReport {
    /// Enrollment after the advance
    pub state: UserProgramState,
    /// Schedule events in order
    pub events: Vec<ScheduleEvent>,
    /// Progressions fired by those events
    pub progressions: Vec<FiredProgression>,
}

/// One performed set reported by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggedSet {
    /// Lift performed
    pub lift_id: LiftId,
    /// Prescribed reps (the floor for AMRAP sets)
    pub target_reps: u32,
    /// Reps completed
    pub actual_reps: u32,
    /// Whether the set was AMRAP
    pub is_amrap: bool,
}

/// Training operations for one catalog and one store
pub struct TrainingService<S> {
    catalog: Arc<Catalog>,
    store: Arc<S>,
    config: EngineConfig,
    engine: ProgressionEngine,
}

impl<S: TrainingStore> TrainingService<S> {
    /// Create a service; the progression engine takes its defaults from `config`
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, store: Arc<S>, config: EngineConfig) -> Self {
        let engine = config.progression_engine();
        Self {
            catalog,
            store,
            config,
            engine,
        }
    }

    /// Shared catalog
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The user's enrollment
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` when the user has never enrolled
    pub async fn enrollment(&self, user_id: UserId) -> AppResult<UserProgramState> {
        self.store
            .get_enrollment(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("enrollment for user {user_id}")))
    }

    /// Validate a status change by machine and wire status names
    ///
    /// # Errors
    ///
    /// Returns `INVALID_TRANSITION` for edges absent from the machine's graph and
    /// `VALIDATION_ERROR` for unknown status names
    pub fn transition(&self, machine: StateMachineKind, from: &str, to: &str) -> AppResult<String> {
        Ok(transition_named(machine, from, to)?)
    }
}
