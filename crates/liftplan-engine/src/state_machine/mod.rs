// ABOUTME: Transition graphs for the enrollment, cycle, week, and workout status machines
// ABOUTME: Edges absent from a graph fail with InvalidTransition instead of being clamped
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Enrollment State Machine
//!
//! ```text
//! enrollment: ACTIVE -> BETWEEN_CYCLES -> ACTIVE, ACTIVE -> QUIT, BETWEEN_CYCLES -> QUIT
//! cycle/week: PENDING -> IN_PROGRESS -> COMPLETED -> PENDING
//! workout:    IN_PROGRESS -> COMPLETED | ABANDONED
//! ```
//!
//! Schedule advancement (`schedule`) and session handling (`session`) drive these
//! graphs; every status change they make goes through [`transition`].

/// Day, week, and cycle advancement with the events it produces
pub mod schedule;

/// Workout session lifecycle
pub mod session;

pub use schedule::{advance, ensure_started, AdvanceOutcome, ProgramShape, ScheduleEvent};
pub use session::{abandon_session, complete_session, quit, start_session};

use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::models::{
    CycleStatus, EnrollmentStatus, StateMachineKind, WeekStatus, WorkoutStatus,
};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// A status enum with a fixed transition graph
pub trait StatusMachine: Copy + Eq + Debug + Display + FromStr {
    /// Machine this status belongs to
    const KIND: StateMachineKind;

    /// Whether `self -> to` is an edge of the graph
    fn can_transition(self, to: Self) -> bool;

    /// Whether no edge leaves this status
    fn is_terminal(self) -> bool;
}

impl StatusMachine for EnrollmentStatus {
    const KIND: StateMachineKind = StateMachineKind::Enrollment;

    fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Active, Self::BetweenCycles | Self::Quit)
                | (Self::BetweenCycles, Self::Active | Self::Quit)
        )
    }

    fn is_terminal(self) -> bool {
        self == Self::Quit
    }
}

impl StatusMachine for CycleStatus {
    const KIND: StateMachineKind = StateMachineKind::Cycle;

    fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Completed, Self::Pending)
        )
    }

    fn is_terminal(self) -> bool {
        false
    }
}

impl StatusMachine for WeekStatus {
    const KIND: StateMachineKind = StateMachineKind::Week;

    fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Completed, Self::Pending)
        )
    }

    fn is_terminal(self) -> bool {
        false
    }
}

impl StatusMachine for WorkoutStatus {
    const KIND: StateMachineKind = StateMachineKind::Workout;

    fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::InProgress, Self::Completed | Self::Abandoned)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

/// Move `from -> to`, or fail if the graph has no such edge
///
/// # Errors
///
/// Returns `EngineError::InvalidTransition` for any edge absent from the graph,
/// including self-transitions
pub fn transition<S: StatusMachine>(from: S, to: S) -> EngineResult<S> {
    if from.can_transition(to) {
        Ok(to)
    } else {
        Err(EngineError::invalid_transition(S::KIND, from, to))
    }
}

fn parse_status<S: StatusMachine>(field: &str, value: &str) -> EngineResult<S> {
    value.parse::<S>().map_err(|_| {
        EngineError::validation(
            field,
            format!("'{value}' is not a {} status", S::KIND),
        )
    })
}

fn transition_parsed<S: StatusMachine>(from: &str, to: &str) -> EngineResult<String> {
    let from = parse_status::<S>("from", from)?;
    let to = parse_status::<S>("to", to)?;
    transition(from, to).map(|status| status.to_string())
}

/// Transition by machine name and wire status names
///
/// # Errors
///
/// Returns `EngineError::Validation` for unknown status names and
/// `EngineError::InvalidTransition` for edges absent from the graph
pub fn transition_named(machine: StateMachineKind, from: &str, to: &str) -> EngineResult<String> {
    match machine {
        StateMachineKind::Enrollment => transition_parsed::<EnrollmentStatus>(from, to),
        StateMachineKind::Cycle => transition_parsed::<CycleStatus>(from, to),
        StateMachineKind::Week => transition_parsed::<WeekStatus>(from, to),
        StateMachineKind::Workout => transition_parsed::<WorkoutStatus>(from, to),
    }
}
