// ABOUTME: Program structure: program -> cycle -> weeks -> days -> prescriptions
// ABOUTME: Also the program-lift-progression links that carry increment overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::ids::{CycleId, DayId, LiftId, LookupId, PrescriptionId, ProgramId, ProgressionId, WeekId};
use serde::{Deserialize, Serialize};

/// A training program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Unique identifier
    pub id: ProgramId,
    /// URL-safe unique slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// The repeating cycle
    pub cycle_id: CycleId,
    /// Weekly lookup used by `WEEKLY_LOOKUP` strategies and `LOOKUP_DRIVEN` schemes
    #[serde(default)]
    pub weekly_lookup_id: Option<LookupId>,
    /// Daily lookup used by `DAILY_LOOKUP` strategies
    #[serde(default)]
    pub daily_lookup_id: Option<LookupId>,
    /// Number of rotation slots for programs that rotate lift emphasis per cycle
    #[serde(default)]
    pub rotation_length: Option<u32>,
}

/// Ordered list of weeks that repeats per iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    /// Unique identifier
    pub id: CycleId,
    /// Display name
    pub name: String,
    /// Weeks in order; week N is `weeks[N - 1]`
    pub weeks: Vec<WeekId>,
}

impl Cycle {
    /// Number of weeks per iteration
    #[must_use]
    pub fn length_weeks(&self) -> u32 {
        u32::try_from(self.weeks.len()).unwrap_or(u32::MAX)
    }

    /// Week id for a 1-based week number
    #[must_use]
    pub fn week_id(&self, week_number: u32) -> Option<WeekId> {
        let index = usize::try_from(week_number.checked_sub(1)?).ok()?;
        self.weeks.get(index).copied()
    }
}

/// One week of a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    /// Unique identifier
    pub id: WeekId,
    /// 1-based week number inside the cycle
    pub week_number: u32,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Deload week marker
    #[serde(default)]
    pub is_deload: bool,
    /// Training days in order; day index N is `days[N]`
    pub days: Vec<DayId>,
}

impl Week {
    /// Number of training days
    #[must_use]
    pub fn day_count(&self) -> u32 {
        u32::try_from(self.days.len()).unwrap_or(u32::MAX)
    }
}

/// One training day, a list of prescription slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    /// Unique identifier
    pub id: DayId,
    /// Identifier used by daily lookups keyed by name
    pub slug: String,
    /// Display name
    pub name: String,
    /// Prescriptions; resolved ordered by each prescription's `order`
    pub prescriptions: Vec<PrescriptionId>,
}

/// Links a progression rule to a lift within a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramProgression {
    /// Program
    pub program_id: ProgramId,
    /// Lift progressed
    pub lift_id: LiftId,
    /// Rule applied
    pub progression_id: ProgressionId,
    /// Replaces the rule's increment for this lift
    #[serde(default)]
    pub increment_override: Option<f64>,
    /// Disabled links are ignored by triggers
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}
