// ABOUTME: Prescription templates with their tagged load strategies and set schemes
// ABOUTME: Includes eager parameter validation so malformed catalog data fails at load time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::MaxKind;
use crate::constants::load::MAX_PERCENTAGE;
use crate::errors::ValidationError;
use crate::ids::{LiftId, PrescriptionId};
use serde::{Deserialize, Serialize};

/// How the weight of a set is computed from a reference max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStrategy {
    /// Fixed percentage of a reference max
    PercentOf {
        /// Kind of max to read
        reference_kind: MaxKind,
        /// Percentage of the max (85 = 85%)
        percentage: f64,
        /// Snap to a multiple of this value (e.g. 2.5)
        #[serde(default)]
        round_to: Option<f64>,
    },
    /// Percentage from the program's weekly lookup for the current week
    WeeklyLookup {
        /// Kind of max to read
        reference_kind: MaxKind,
        /// Snap to a multiple of this value
        #[serde(default)]
        round_to: Option<f64>,
    },
    /// Percentage from the program's daily lookup for the current day
    DailyLookup {
        /// Kind of max to read
        reference_kind: MaxKind,
        /// Snap to a multiple of this value
        #[serde(default)]
        round_to: Option<f64>,
    },
}

impl LoadStrategy {
    /// Kind of reference max this strategy reads
    #[must_use]
    pub const fn reference_kind(&self) -> MaxKind {
        match self {
            Self::PercentOf { reference_kind, .. }
            | Self::WeeklyLookup { reference_kind, .. }
            | Self::DailyLookup { reference_kind, .. } => *reference_kind,
        }
    }

    /// Rounding increment, if any
    #[must_use]
    pub const fn round_to(&self) -> Option<f64> {
        match self {
            Self::PercentOf { round_to, .. }
            | Self::WeeklyLookup { round_to, .. }
            | Self::DailyLookup { round_to, .. } => *round_to,
        }
    }

    /// Tag name as it appears in catalog JSON
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::PercentOf { .. } => "PERCENT_OF",
            Self::WeeklyLookup { .. } => "WEEKLY_LOOKUP",
            Self::DailyLookup { .. } => "DAILY_LOOKUP",
        }
    }

    /// Check parameter ranges
    pub fn validate_into(&self, path: &str, errors: &mut ValidationError) {
        if let Self::PercentOf { percentage, .. } = self {
            if !percentage.is_finite() || *percentage <= 0.0 || *percentage > MAX_PERCENTAGE {
                errors.push(
                    format!("{path}.percentage"),
                    format!("must be in (0, {MAX_PERCENTAGE}], got {percentage}"),
                );
            }
        }
        if let Some(round_to) = self.round_to() {
            if !round_to.is_finite() || round_to <= 0.0 {
                errors.push(
                    format!("{path}.round_to"),
                    format!("must be positive, got {round_to}"),
                );
            }
        }
    }
}

/// One step of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampStep {
    /// Percentage of the reference max
    pub percentage: f64,
    /// Target reps
    pub reps: u32,
}

/// How a prescription expands into sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetScheme {
    /// `sets` identical sets; the last one is AMRAP when `is_amrap`
    Fixed {
        /// Number of sets
        sets: u32,
        /// Target reps per set
        reps: u32,
        /// Last set is "as many reps as possible"
        #[serde(default)]
        is_amrap: bool,
    },
    /// Authored sequence of percentage steps; order is never re-sorted
    Ramp {
        /// Steps in performance order
        steps: Vec<RampStep>,
        /// Steps at or above this percentage are work sets
        work_set_threshold: f64,
    },
    /// Sets and reps come from the weekly lookup rows (week, set 1..=work_sets)
    LookupDriven {
        /// Number of per-set lookup rows to pull
        work_sets: u32,
    },
    /// Every set is AMRAP with a rep floor
    Amrap {
        /// Number of sets
        sets: u32,
        /// Minimum acceptable reps
        min_reps: u32,
    },
}

impl SetScheme {
    /// Tag name as it appears in catalog JSON
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "FIXED",
            Self::Ramp { .. } => "RAMP",
            Self::LookupDriven { .. } => "LOOKUP_DRIVEN",
            Self::Amrap { .. } => "AMRAP",
        }
    }

    /// Whether expansion needs a weekly lookup table
    #[must_use]
    pub const fn requires_weekly_lookup(&self) -> bool {
        matches!(self, Self::LookupDriven { .. })
    }

    /// Check parameter ranges; an empty scheme is a configuration error
    pub fn validate_into(&self, path: &str, errors: &mut ValidationError) {
        match self {
            Self::Fixed { sets, reps, .. } => {
                if *sets == 0 {
                    errors.push(format!("{path}.sets"), "must be at least 1");
                }
                if *reps == 0 {
                    errors.push(format!("{path}.reps"), "must be at least 1");
                }
            }
            Self::Ramp {
                steps,
                work_set_threshold,
            } => {
                if steps.is_empty() {
                    errors.push(format!("{path}.steps"), "ramp must have at least one step");
                }
                for (index, step) in steps.iter().enumerate() {
                    if !step.percentage.is_finite()
                        || step.percentage <= 0.0
                        || step.percentage > MAX_PERCENTAGE
                    {
                        errors.push(
                            format!("{path}.steps[{index}].percentage"),
                            format!("must be in (0, {MAX_PERCENTAGE}], got {}", step.percentage),
                        );
                    }
                    if step.reps == 0 {
                        errors.push(format!("{path}.steps[{index}].reps"), "must be at least 1");
                    }
                }
                if !work_set_threshold.is_finite() || *work_set_threshold < 0.0 {
                    errors.push(
                        format!("{path}.work_set_threshold"),
                        format!("must be a non-negative percentage, got {work_set_threshold}"),
                    );
                }
            }
            Self::LookupDriven { work_sets } => {
                if *work_sets == 0 {
                    errors.push(format!("{path}.work_sets"), "must be at least 1");
                }
            }
            Self::Amrap { sets, .. } => {
                if *sets == 0 {
                    errors.push(format!("{path}.sets"), "must be at least 1");
                }
            }
        }
    }
}

/// One exercise slot template, shareable between training days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    /// Unique identifier
    pub id: PrescriptionId,
    /// Lift performed
    pub lift_id: LiftId,
    /// Weight computation
    pub load_strategy: LoadStrategy,
    /// Set expansion
    pub set_scheme: SetScheme,
    /// Position within a day
    pub order: u32,
    /// Coaching notes shown with the exercise
    #[serde(default)]
    pub notes: Option<String>,
    /// Rest between sets
    #[serde(default)]
    pub rest_seconds: Option<u32>,
}

impl Prescription {
    /// Create a prescription with no notes or rest period
    #[must_use]
    pub fn new(lift_id: LiftId, load_strategy: LoadStrategy, set_scheme: SetScheme, order: u32) -> Self {
        Self {
            id: PrescriptionId::new(),
            lift_id,
            load_strategy,
            set_scheme,
            order,
            notes: None,
            rest_seconds: None,
        }
    }

    /// Attach notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach a rest period
    #[must_use]
    pub const fn with_rest_seconds(mut self, rest_seconds: u32) -> Self {
        self.rest_seconds = Some(rest_seconds);
        self
    }

    /// Validate strategy and scheme parameters
    pub fn validate_into(&self, path: &str, errors: &mut ValidationError) {
        self.load_strategy
            .validate_into(&format!("{path}.load_strategy"), errors);
        self.set_scheme
            .validate_into(&format!("{path}.set_scheme"), errors);
    }
}
