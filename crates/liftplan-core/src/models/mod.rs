// ABOUTME: Core data model for catalog content and per-user training state
// ABOUTME: Re-exports lifts, prescriptions, lookups, programs, progressions, and enrollment types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! ## Catalog (shared, read-only during per-user operations)
//!
//! - `Lift`: a named exercise, optionally a variation of a parent lift
//! - `Prescription`: one exercise slot with a `LoadStrategy` and `SetScheme`
//! - `WeeklyLookup` / `DailyLookup`: schedule-keyed percentage/volume tables
//! - `Program`, `Cycle`, `Week`, `Day`: nested program structure
//! - `ProgressionDefinition`: a typed progression rule
//!
//! ## Per-user records
//!
//! - `ReferenceMax`: append-only benchmark values
//! - `ProgressionLog`, `FailureCounter`, `UserProgressionState`: progression bookkeeping
//! - `UserProgramState`, `WorkoutSession`: enrollment state
//!
//! Tagged variants (`LoadStrategy`, `SetScheme`, `ProgressionRule`) serialize with a
//! `type` discriminator so malformed catalog JSON fails at deserialization.

mod enrollment;
mod lift;
mod load;
mod lookup;
mod program;
mod progression;
mod reference_max;
mod workout;

pub use enrollment::{
    AdvanceKind, CycleStatus, EnrollmentStatus, MeetPlan, RotationState, StateMachineKind,
    StatusSet, UserProgramState, WeekStatus, WorkoutSession, WorkoutStatus,
};
pub use lift::{Lift, MaxSource};
pub use load::{LoadStrategy, Prescription, RampStep, SetScheme};
pub use lookup::{DailyKey, DailyLookup, DailyLookupEntry, WeeklyKey, WeeklyLookup, WeeklyLookupEntry};
pub use program::{Cycle, Day, Program, ProgramProgression, Week};
pub use progression::{
    FailureCounter, FinalFailureAction, ProgressionDefinition, ProgressionLog, ProgressionLogKey,
    ProgressionRule, ProgressionType, RepBucket, StageData, StageDefinition, TriggerContext,
    TriggerType, UserProgressionState,
};
pub use reference_max::{MaxKind, ReferenceMax};
pub use workout::{ResolvedExercise, ScheduleCoordinate, SetResult, Workout};
