// ABOUTME: Workout resolution, progression rules, and enrollment state machine for liftplan
// ABOUTME: Pure computation over catalog data and per-user snapshots; callers persist the results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Liftplan Engine
//!
//! Leaf-first:
//!
//! - **lookup**: resolves schedule coordinates against weekly/daily tables
//! - **load_strategy**: computes one weight from a reference max and a strategy
//! - **set_scheme**: expands a scheme into concrete sets
//! - **prescription**: composes a full workout, collecting every per-slot failure
//! - **progression**: applies progression rules to reference maxes, idempotently
//! - **state_machine**: enrollment/cycle/week/workout transitions and schedule advance
//!
//! Nothing here performs I/O or holds shared mutable state. Resolution can run on
//! any thread; per-user mutations come back as plain values for the caller to store.

/// Weight rounding and one-rep max estimation
pub mod rounding;

/// Reference max lookup with parent derivation and estimation fallback
pub mod maxes;

/// Lookup table resolution
pub mod lookup;

/// Load strategy evaluation
pub mod load_strategy;

/// Set scheme expansion
pub mod set_scheme;

/// Day and week resolution
pub mod prescription;

/// Progression rule engine
pub mod progression;

/// Status sub-machines and schedule advancement
pub mod state_machine;

pub use maxes::{ReferenceMaxBook, ReferenceMaxSource};
pub use prescription::{DayResolution, PrescriptionResolver, ResolutionError};
pub use progression::{
    ActiveStages, AppliedProgression, ProgressionEngine, ProgressionInput, ProgressionResult,
    SkipReason,
};
pub use rounding::{round_to_increment, E1rmFormula};
