// ABOUTME: Reference max kinds and append-only reference max rows
// ABOUTME: The current value of a kind is the newest row by effective date
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::ids::{LiftId, ReferenceMaxId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of benchmark a reference max represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaxKind {
    /// Tested one-rep max
    OneRm,
    /// Training max (usually a fraction of the one-rep max)
    TrainingMax,
    /// Heaviest weight for N reps
    RepMax(u32),
    /// One-rep max estimated from a rep max
    Estimated1Rm,
}

impl fmt::Display for MaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneRm => write!(f, "ONE_RM"),
            Self::TrainingMax => write!(f, "TRAINING_MAX"),
            Self::RepMax(n) => write!(f, "REP_MAX_{n}"),
            Self::Estimated1Rm => write!(f, "ESTIMATED_1RM"),
        }
    }
}

impl FromStr for MaxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONE_RM" => Ok(Self::OneRm),
            "TRAINING_MAX" => Ok(Self::TrainingMax),
            "ESTIMATED_1RM" => Ok(Self::Estimated1Rm),
            other => other
                .strip_prefix("REP_MAX_")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .map(Self::RepMax)
                .ok_or_else(|| format!("Unknown reference max kind: {other}")),
        }
    }
}

impl TryFrom<String> for MaxKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MaxKind> for String {
    fn from(kind: MaxKind) -> Self {
        kind.to_string()
    }
}

/// One stored reference max; rows are never overwritten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMax {
    /// Row identifier
    pub id: ReferenceMaxId,
    /// Owner
    pub user_id: UserId,
    /// Lift the max belongs to
    pub lift_id: LiftId,
    /// Kind of benchmark
    pub kind: MaxKind,
    /// Weight value
    pub value: f64,
    /// When the value takes effect
    pub effective_at: DateTime<Utc>,
}

impl ReferenceMax {
    /// Create a new row
    #[must_use]
    pub fn new(
        user_id: UserId,
        lift_id: LiftId,
        kind: MaxKind,
        value: f64,
        effective_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReferenceMaxId::new(),
            user_id,
            lift_id,
            kind,
            value,
            effective_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_kind_string_forms() {
        for kind in [
            MaxKind::OneRm,
            MaxKind::TrainingMax,
            MaxKind::RepMax(5),
            MaxKind::Estimated1Rm,
        ] {
            assert_eq!(kind.to_string().parse::<MaxKind>(), Ok(kind));
        }
        assert!("REP_MAX_0".parse::<MaxKind>().is_err());
        assert!("FIVE_RM".parse::<MaxKind>().is_err());
    }
}
