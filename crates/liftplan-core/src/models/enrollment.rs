// ABOUTME: Enrollment aggregate, status enums for the four sub-machines, and workout sessions
// ABOUTME: UserProgramState is versioned with optional rotation and meet sub-records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::schedule::{FIRST_CYCLE_ITERATION, FIRST_WEEK};
use crate::ids::{EnrollmentId, ProgramId, SessionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four status sub-machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMachineKind {
    /// Enrollment lifecycle
    Enrollment,
    /// Cycle iteration lifecycle
    Cycle,
    /// Week lifecycle
    Week,
    /// Workout session lifecycle
    Workout,
}

impl fmt::Display for StateMachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enrollment => write!(f, "enrollment"),
            Self::Cycle => write!(f, "cycle"),
            Self::Week => write!(f, "week"),
            Self::Workout => write!(f, "workout"),
        }
    }
}

impl FromStr for StateMachineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enrollment" => Ok(Self::Enrollment),
            "cycle" => Ok(Self::Cycle),
            "week" => Ok(Self::Week),
            "workout" => Ok(Self::Workout),
            _ => Err(format!("Unknown state machine: {s}")),
        }
    }
}

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every status of this machine
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire name of the status
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("Unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

status_enum!(
    /// Enrollment status
    EnrollmentStatus {
        /// Training through a cycle
        Active => "ACTIVE",
        /// A cycle finished and the next has not started
        BetweenCycles => "BETWEEN_CYCLES",
        /// Left the program; terminal
        Quit => "QUIT",
    }
);

status_enum!(
    /// Cycle iteration status
    CycleStatus {
        /// Not started
        Pending => "PENDING",
        /// At least one workout done
        InProgress => "IN_PROGRESS",
        /// Final week completed
        Completed => "COMPLETED",
    }
);

status_enum!(
    /// Week status
    WeekStatus {
        /// Not started
        Pending => "PENDING",
        /// At least one workout done
        InProgress => "IN_PROGRESS",
        /// Final day completed
        Completed => "COMPLETED",
    }
);

status_enum!(
    /// Workout session status
    WorkoutStatus {
        /// Open
        InProgress => "IN_PROGRESS",
        /// Finished; terminal
        Completed => "COMPLETED",
        /// Given up; terminal
        Abandoned => "ABANDONED",
    }
);

/// What `AdvanceState` moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceKind {
    /// Next training day
    Day,
    /// Next week
    Week,
    /// Next cycle iteration
    Cycle,
}

/// Status of the enrollment, cycle, and week sub-machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSet {
    /// Enrollment sub-machine
    pub enrollment: EnrollmentStatus,
    /// Cycle sub-machine
    pub cycle: CycleStatus,
    /// Week sub-machine
    pub week: WeekStatus,
}

impl Default for StatusSet {
    fn default() -> Self {
        Self {
            enrollment: EnrollmentStatus::Active,
            cycle: CycleStatus::Pending,
            week: WeekStatus::Pending,
        }
    }
}

/// Rotation through lift emphases, advanced once per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    /// Current slot (0-based)
    pub position: u32,
    /// Number of slots
    pub length: u32,
}

impl RotationState {
    /// Next slot, wrapping to 0
    #[must_use]
    pub const fn advanced(self) -> Self {
        let position = if self.length == 0 {
            0
        } else {
            (self.position + 1) % self.length
        };
        Self {
            position,
            length: self.length,
        }
    }
}

/// Competition date the user is peaking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetPlan {
    /// Meet day
    pub meet_date: NaiveDate,
}

impl MeetPlan {
    /// Whole weeks from `today` to the meet; negative once it has passed
    #[must_use]
    pub fn weeks_until_meet(&self, today: NaiveDate) -> i64 {
        (self.meet_date - today).num_days().div_euclid(7)
    }
}

/// One user's enrollment in a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgramState {
    /// Enrollment identifier
    pub id: EnrollmentId,
    /// Owner
    pub user_id: UserId,
    /// Program enrolled in
    pub program_id: ProgramId,
    /// 1-based week number in the current cycle
    pub current_week: u32,
    /// 1-based cycle iteration
    pub cycle_iteration: u32,
    /// 0-based day index in the current week; `None` until the first workout
    pub current_day_index: Option<u32>,
    /// Completed cycle count since enrollment
    pub cycles_since_start: u32,
    /// Sub-machine statuses
    pub statuses: StatusSet,
    /// Rotation state for rotating programs
    #[serde(default)]
    pub rotation: Option<RotationState>,
    /// Meet peaking plan
    #[serde(default)]
    pub meet: Option<MeetPlan>,
    /// Incremented on every mutation
    pub version: u64,
    /// Enrollment time
    pub enrolled_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl UserProgramState {
    /// Fresh enrollment at week 1 of iteration 1
    #[must_use]
    pub fn new(user_id: UserId, program_id: ProgramId, now: DateTime<Utc>) -> Self {
        Self {
            id: EnrollmentId::new(),
            user_id,
            program_id,
            current_week: FIRST_WEEK,
            cycle_iteration: FIRST_CYCLE_ITERATION,
            current_day_index: None,
            cycles_since_start: 0,
            statuses: StatusSet::default(),
            rotation: None,
            meet: None,
            version: 0,
            enrolled_at: now,
            updated_at: now,
        }
    }

    /// Day index to train next (0 before the first workout)
    #[must_use]
    pub fn day_index_or_first(&self) -> u32 {
        self.current_day_index.unwrap_or(0)
    }

    /// Record a mutation
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// One attempted workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Session identifier
    pub id: SessionId,
    /// Enrollment the session belongs to
    pub enrollment_id: EnrollmentId,
    /// Week number at start
    pub week_number: u32,
    /// Day index at start
    pub day_index: u32,
    /// Session status
    pub status: WorkoutStatus,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Completion or abandonment time
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weeks_until_meet_counts_whole_weeks() {
        let plan = MeetPlan {
            meet_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap_or_default(),
        };
        let on = |month, day| NaiveDate::from_ymd_opt(2025, month, day).unwrap_or_default();

        assert_eq!(plan.weeks_until_meet(on(5, 31)), 2);
        assert_eq!(plan.weeks_until_meet(on(6, 4)), 1);
        assert_eq!(plan.weeks_until_meet(on(6, 14)), 0);
        // Past the meet the count goes negative
        assert_eq!(plan.weeks_until_meet(on(6, 15)), -1);
        assert_eq!(plan.weeks_until_meet(on(6, 22)), -2);
    }
}
