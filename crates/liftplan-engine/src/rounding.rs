// ABOUTME: Weight rounding to plate increments and one-rep max estimation formulas
// ABOUTME: Rounding is half-up to the nearest multiple, never banker's rounding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use liftplan_core::constants::estimation::{
    BRZYCKI_DENOMINATOR_BASE, BRZYCKI_NUMERATOR, EPLEY_DIVISOR, MAX_ESTIMATION_REPS,
};
use liftplan_core::constants::load::ROUNDING_EPSILON;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Snap `value` to the nearest multiple of `increment`, halves rounding up.
///
/// `None` (or a non-positive increment) returns the value unchanged.
#[must_use]
pub fn round_to_increment(value: f64, increment: Option<f64>) -> f64 {
    match increment {
        Some(step) if step > 0.0 => (value / step + 0.5 + ROUNDING_EPSILON).floor() * step,
        _ => value,
    }
}

/// `max * percentage / 100`, rounded per `round_to`
#[must_use]
pub fn percent_of(max: f64, percentage: f64, round_to: Option<f64>) -> f64 {
    round_to_increment(max * percentage / 100.0, round_to)
}

/// Formula used to estimate a one-rep max from a rep max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum E1rmFormula {
    /// `w * (1 + reps / 30)`
    #[default]
    Epley,
    /// `w * 36 / (37 - reps)`
    Brzycki,
}

impl fmt::Display for E1rmFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epley => write!(f, "epley"),
            Self::Brzycki => write!(f, "brzycki"),
        }
    }
}

impl FromStr for E1rmFormula {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "epley" => Ok(Self::Epley),
            "brzycki" => Ok(Self::Brzycki),
            other => Err(format!("Unknown e1RM formula: {other}")),
        }
    }
}

/// Estimated one-rep max from `weight` lifted for `reps`.
///
/// Returns `None` for zero reps or rep counts too high to estimate from.
#[must_use]
pub fn estimate_one_rep_max(weight: f64, reps: u32, formula: E1rmFormula) -> Option<f64> {
    if reps == 0 || reps > MAX_ESTIMATION_REPS {
        return None;
    }
    if reps == 1 {
        return Some(weight);
    }
    let reps = f64::from(reps);
    let estimate = match formula {
        E1rmFormula::Epley => weight * (1.0 + reps / EPLEY_DIVISOR),
        E1rmFormula::Brzycki => weight * BRZYCKI_NUMERATOR / (BRZYCKI_DENOMINATOR_BASE - reps),
    };
    Some(estimate)
}

/// Training max as `percent` of a one-rep max
#[must_use]
pub fn derive_training_max(one_rep_max: f64, percent: f64, round_to: Option<f64>) -> f64 {
    percent_of(one_rep_max, percent, round_to)
}
