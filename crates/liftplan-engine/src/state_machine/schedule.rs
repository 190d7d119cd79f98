// ABOUTME: Advances an enrollment's day/week/cycle coordinate and drives the status machines
// ABOUTME: Reports week and cycle completions as events for progression triggers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::transition;
use chrono::{DateTime, Utc};
use liftplan_core::constants::schedule::FIRST_WEEK;
use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::ids::ProgramId;
use liftplan_core::models::{
    AdvanceKind, CycleStatus, EnrollmentStatus, RotationState, UserProgramState, Week, WeekStatus,
};
use liftplan_core::Catalog;
use serde::Serialize;
use tracing::debug;

/// Week and day counts of a program's cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramShape {
    days_per_week: Vec<u32>,
}

impl ProgramShape {
    /// Shape with the same number of days every week
    #[must_use]
    pub fn uniform(weeks: u32, days_per_week: u32) -> Self {
        Self {
            days_per_week: (0..weeks).map(|_| days_per_week).collect(),
        }
    }

    /// Shape of a catalog program
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the program, its cycle, or a week is absent
    pub fn from_catalog(catalog: &Catalog, program_id: ProgramId) -> EngineResult<Self> {
        let program = catalog.program(program_id)?;
        let cycle = catalog.cycle(program.cycle_id)?;
        let days_per_week = cycle
            .weeks
            .iter()
            .map(|id| catalog.week(*id).map(Week::day_count))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self { days_per_week })
    }

    /// Weeks per cycle iteration
    #[must_use]
    pub fn cycle_length_weeks(&self) -> u32 {
        u32::try_from(self.days_per_week.len()).unwrap_or(u32::MAX)
    }

    /// Training days in a 1-based week
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the week is outside the cycle
    pub fn days_in_week(&self, week_number: u32) -> EngineResult<u32> {
        week_number
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.days_per_week.get(index).copied())
            .ok_or_else(|| EngineError::not_found("week number", week_number))
    }
}

/// Something that happened while the schedule moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScheduleEvent {
    /// A cycle iteration moved to `IN_PROGRESS`
    CycleStarted {
        /// Iteration started
        cycle_iteration: u32,
    },
    /// A week moved to `IN_PROGRESS`
    WeekStarted {
        /// Iteration of the week
        cycle_iteration: u32,
        /// Week started
        week_number: u32,
    },
    /// The day index moved forward within a week
    DayAdvanced {
        /// Current week
        week_number: u32,
        /// New day index
        day_index: u32,
    },
    /// A week reached `COMPLETED`
    WeekCompleted {
        /// Iteration of the week
        cycle_iteration: u32,
        /// Week completed
        week_number: u32,
    },
    /// A cycle iteration reached `COMPLETED`
    CycleCompleted {
        /// Iteration completed
        cycle_iteration: u32,
    },
}

/// New enrollment state plus the events that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceOutcome {
    /// Updated enrollment
    pub state: UserProgramState,
    /// Events in the order they happened
    pub events: Vec<ScheduleEvent>,
}

impl AdvanceOutcome {
    /// Completed weeks as (cycle iteration, week number)
    pub fn completed_weeks(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.events.iter().filter_map(|event| match event {
            ScheduleEvent::WeekCompleted {
                cycle_iteration,
                week_number,
            } => Some((*cycle_iteration, *week_number)),
            _ => None,
        })
    }

    /// Completed cycle iteration, if the advance finished one
    #[must_use]
    pub fn completed_cycle(&self) -> Option<u32> {
        self.events.iter().find_map(|event| match event {
            ScheduleEvent::CycleCompleted { cycle_iteration } => Some(*cycle_iteration),
            _ => None,
        })
    }
}

fn require_active(state: &UserProgramState) -> EngineResult<()> {
    if state.statuses.enrollment == EnrollmentStatus::Active {
        Ok(())
    } else {
        Err(EngineError::EnrollmentNotActive {
            status: state.statuses.enrollment.to_string(),
        })
    }
}

fn start_statuses(state: &mut UserProgramState, events: &mut Vec<ScheduleEvent>) -> EngineResult<()> {
    if state.statuses.cycle == CycleStatus::Pending {
        state.statuses.cycle = transition(state.statuses.cycle, CycleStatus::InProgress)?;
        events.push(ScheduleEvent::CycleStarted {
            cycle_iteration: state.cycle_iteration,
        });
    }
    if state.statuses.week == WeekStatus::Pending {
        state.statuses.week = transition(state.statuses.week, WeekStatus::InProgress)?;
        events.push(ScheduleEvent::WeekStarted {
            cycle_iteration: state.cycle_iteration,
            week_number: state.current_week,
        });
    }
    if state.current_day_index.is_none() {
        state.current_day_index = Some(0);
    }
    Ok(())
}

/// Put the enrollment into training: resume from `BETWEEN_CYCLES` and start the
/// current cycle and week if they are still pending.
///
/// # Errors
///
/// Returns `EngineError::EnrollmentNotActive` for a quit enrollment
pub fn ensure_started(state: &mut UserProgramState, now: DateTime<Utc>) -> EngineResult<Vec<ScheduleEvent>> {
    if state.statuses.enrollment == EnrollmentStatus::Quit {
        return Err(EngineError::EnrollmentNotActive {
            status: state.statuses.enrollment.to_string(),
        });
    }
    let before = state.clone();
    if state.statuses.enrollment == EnrollmentStatus::BetweenCycles {
        state.statuses.enrollment =
            transition(state.statuses.enrollment, EnrollmentStatus::Active)?;
    }
    let mut events = Vec::new();
    start_statuses(state, &mut events)?;
    if *state != before {
        state.touch(now);
    }
    Ok(events)
}

fn complete_week(
    state: &mut UserProgramState,
    shape: &ProgramShape,
    events: &mut Vec<ScheduleEvent>,
) -> EngineResult<()> {
    state.statuses.week = transition(state.statuses.week, WeekStatus::Completed)?;
    events.push(ScheduleEvent::WeekCompleted {
        cycle_iteration: state.cycle_iteration,
        week_number: state.current_week,
    });

    if state.current_week < shape.cycle_length_weeks() {
        state.current_week += 1;
        state.current_day_index = Some(0);
        state.statuses.week = transition(state.statuses.week, WeekStatus::Pending)?;
        Ok(())
    } else {
        complete_cycle(state, events)
    }
}

fn complete_cycle(state: &mut UserProgramState, events: &mut Vec<ScheduleEvent>) -> EngineResult<()> {
    if state.statuses.week == WeekStatus::InProgress {
        state.statuses.week = transition(state.statuses.week, WeekStatus::Completed)?;
        events.push(ScheduleEvent::WeekCompleted {
            cycle_iteration: state.cycle_iteration,
            week_number: state.current_week,
        });
    }
    state.statuses.cycle = transition(state.statuses.cycle, CycleStatus::Completed)?;
    events.push(ScheduleEvent::CycleCompleted {
        cycle_iteration: state.cycle_iteration,
    });

    state.statuses.cycle = transition(state.statuses.cycle, CycleStatus::Pending)?;
    state.statuses.week = transition(state.statuses.week, WeekStatus::Pending)?;
    state.cycle_iteration += 1;
    state.cycles_since_start += 1;
    state.current_week = FIRST_WEEK;
    state.current_day_index = None;
    state.rotation = state.rotation.map(RotationState::advanced);
    state.statuses.enrollment =
        transition(state.statuses.enrollment, EnrollmentStatus::BetweenCycles)?;
    Ok(())
}

/// Move the schedule forward.
///
/// - `Day`: next day; past the last day the week completes, and past the last week
///   the cycle completes and the enrollment waits `BETWEEN_CYCLES`
/// - `Week`: complete the current week regardless of the day
/// - `Cycle`: from `BETWEEN_CYCLES`, resume training; from `ACTIVE`, complete the
///   current week and cycle
///
/// # Errors
///
/// - `EnrollmentNotActive` when the enrollment has quit, or for day/week advances
///   between cycles
/// - `NotFound` when the state points at a week the program does not have
pub fn advance(
    state: &UserProgramState,
    shape: &ProgramShape,
    kind: AdvanceKind,
    now: DateTime<Utc>,
) -> EngineResult<AdvanceOutcome> {
    let mut next = state.clone();
    let mut events = Vec::new();

    match kind {
        AdvanceKind::Day => {
            require_active(&next)?;
            let days = shape.days_in_week(next.current_week)?;
            start_statuses(&mut next, &mut events)?;
            let day_index = next.day_index_or_first() + 1;
            if day_index < days {
                next.current_day_index = Some(day_index);
                events.push(ScheduleEvent::DayAdvanced {
                    week_number: next.current_week,
                    day_index,
                });
            } else {
                complete_week(&mut next, shape, &mut events)?;
            }
        }
        AdvanceKind::Week => {
            require_active(&next)?;
            shape.days_in_week(next.current_week)?;
            start_statuses(&mut next, &mut events)?;
            complete_week(&mut next, shape, &mut events)?;
        }
        AdvanceKind::Cycle => match next.statuses.enrollment {
            EnrollmentStatus::BetweenCycles => {
                next.statuses.enrollment =
                    transition(next.statuses.enrollment, EnrollmentStatus::Active)?;
            }
            EnrollmentStatus::Active => {
                start_statuses(&mut next, &mut events)?;
                complete_cycle(&mut next, &mut events)?;
            }
            EnrollmentStatus::Quit => require_active(&next)?,
        },
    }

    next.touch(now);
    debug!(
        user_id = %next.user_id,
        program_id = %next.program_id,
        ?kind,
        week = next.current_week,
        cycle_iteration = next.cycle_iteration,
        events = events.len(),
        "schedule advanced"
    );
    Ok(AdvanceOutcome { state: next, events })
}
