// ABOUTME: Engine constants organized by domain
// ABOUTME: Defaults and limits for load calculation, progression rules, and estimation formulas
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Pure data constants grouped by the engine component that consumes them.

/// Load calculation defaults
pub mod load {
    /// Tolerance added before flooring so that exact halves round up despite float error
    pub const ROUNDING_EPSILON: f64 = 1e-9;
    /// Largest percentage a load strategy or lookup row may carry
    pub const MAX_PERCENTAGE: f64 = 150.0;
    /// Ramp base percentage: the reference max itself
    pub const RAMP_BASE_PERCENTAGE: f64 = 100.0;
}

/// Training max derivation
pub mod training_max {
    /// Default training max as a percentage of a one-rep max
    pub const DEFAULT_PERCENT_OF_ONE_RM: f64 = 90.0;
    /// Lowest accepted training max percentage
    pub const MIN_PERCENT_OF_ONE_RM: f64 = 50.0;
    /// Highest accepted training max percentage
    pub const MAX_PERCENT_OF_ONE_RM: f64 = 100.0;
}

/// One-rep max estimation formulas
pub mod estimation {
    /// Epley: `w * (1 + reps / 30)`
    pub const EPLEY_DIVISOR: f64 = 30.0;
    /// Brzycki numerator: `w * 36 / (37 - reps)`
    pub const BRZYCKI_NUMERATOR: f64 = 36.0;
    /// Brzycki denominator base
    pub const BRZYCKI_DENOMINATOR_BASE: f64 = 37.0;
    /// Rep counts above this are too unreliable to estimate from
    pub const MAX_ESTIMATION_REPS: u32 = 15;
}

/// Progression rule defaults and limits
pub mod progression {
    /// Default deload reduction in percent when a rule omits it
    pub const DEFAULT_DELOAD_PERCENT: f64 = 10.0;
    /// Default number of consecutive failures before a deload
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
    /// Largest deload a rule may request, in percent
    pub const MAX_DELOAD_PERCENT: f64 = 50.0;
    /// Default reduction applied by `RESET_WEIGHT` when the max has not risen above the checkpoint
    pub const DEFAULT_RESET_PERCENT: f64 = 10.0;
}

/// Program structure limits
pub mod schedule {
    /// First week number of a cycle
    pub const FIRST_WEEK: u32 = 1;
    /// First cycle iteration of an enrollment
    pub const FIRST_CYCLE_ITERATION: u32 = 1;
}
