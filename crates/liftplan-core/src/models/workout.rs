// ABOUTME: Resolved workout output and the schedule coordinate it was resolved for
// ABOUTME: A workout is an ordered list of exercises, each an ordered list of concrete sets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::ids::{DayId, LiftId, PrescriptionId, ProgramId};
use serde::{Deserialize, Serialize};

/// Where in a program's timeline a workout falls
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleCoordinate {
    /// 1-based cycle iteration
    pub cycle_iteration: u32,
    /// 1-based week number within the cycle
    pub week_number: u32,
    /// 0-based day index within the week
    pub day_index: u32,
    /// Slug of the day, used by daily lookups keyed by identifier
    #[serde(default)]
    pub day_slug: Option<String>,
}

impl ScheduleCoordinate {
    /// Coordinate without a day slug
    #[must_use]
    pub const fn new(cycle_iteration: u32, week_number: u32, day_index: u32) -> Self {
        Self {
            cycle_iteration,
            week_number,
            day_index,
            day_slug: None,
        }
    }

    /// Attach a day slug
    #[must_use]
    pub fn with_day_slug(mut self, slug: impl Into<String>) -> Self {
        self.day_slug = Some(slug.into());
        self
    }

    /// 1-based position of the day within its week
    #[must_use]
    pub const fn day_position(&self) -> u32 {
        self.day_index + 1
    }
}

/// One concrete set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetResult {
    /// 1-based set number within the exercise
    pub set_number: u32,
    /// Weight to load
    pub weight: f64,
    /// Target reps (the floor for AMRAP sets)
    pub target_reps: u32,
    /// "As many reps as possible"
    pub is_amrap: bool,
    /// Work set rather than warm-up
    pub is_work_set: bool,
    /// Percentage of the reference max used
    pub percentage: f64,
}

/// One resolved exercise slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedExercise {
    /// Source prescription
    pub prescription_id: PrescriptionId,
    /// Lift performed
    pub lift_id: LiftId,
    /// Lift display name
    pub lift_name: String,
    /// Position within the day
    pub order: u32,
    /// Coaching notes
    pub notes: Option<String>,
    /// Rest between sets
    pub rest_seconds: Option<u32>,
    /// Concrete sets in order
    pub sets: Vec<SetResult>,
    /// Name of the active progression stage that shaped the sets
    #[serde(default)]
    pub stage: Option<String>,
    /// Total reps the active stage targets
    #[serde(default)]
    pub target_volume: Option<u32>,
}

impl ResolvedExercise {
    /// Work sets only
    pub fn work_sets(&self) -> impl Iterator<Item = &SetResult> {
        self.sets.iter().filter(|set| set.is_work_set)
    }
}

/// A resolved training day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Program the day belongs to
    pub program_id: ProgramId,
    /// Source day
    pub day_id: DayId,
    /// Day display name
    pub day_name: String,
    /// Coordinate resolved for
    pub coordinate: ScheduleCoordinate,
    /// Exercises that resolved successfully, in order
    pub exercises: Vec<ResolvedExercise>,
}
