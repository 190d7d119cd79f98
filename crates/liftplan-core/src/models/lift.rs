// ABOUTME: Lift catalog entries and variation-to-parent max derivation settings
// ABOUTME: Lifts are immutable once created and referenced everywhere by id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::ids::LiftId;
use serde::{Deserialize, Serialize};

/// Where a lift's reference maxes come from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaxSource {
    /// The lift carries its own maxes
    #[default]
    Independent,
    /// Use the parent lift's max scaled by `percent` when the variation has none
    DeriveFromParent {
        /// Percentage of the parent's max (100 = same value)
        percent: f64,
    },
}

/// A named exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lift {
    /// Unique identifier
    pub id: LiftId,
    /// Display name
    pub name: String,
    /// URL-safe unique slug
    pub slug: String,
    /// Squat, bench press, and deadlift are competition lifts
    #[serde(default)]
    pub is_competition_lift: bool,
    /// Parent lift when this is a variation (e.g. pause squat -> squat)
    #[serde(default)]
    pub parent_lift_id: Option<LiftId>,
    /// How reference maxes are obtained
    #[serde(default)]
    pub max_source: MaxSource,
}

impl Lift {
    /// Create an independent lift
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: LiftId::new(),
            name: name.into(),
            slug: slug.into(),
            is_competition_lift: false,
            parent_lift_id: None,
            max_source: MaxSource::Independent,
        }
    }

    /// Mark as a competition lift
    #[must_use]
    pub const fn competition(mut self) -> Self {
        self.is_competition_lift = true;
        self
    }

    /// Make this lift a variation of `parent`, optionally deriving maxes from it
    #[must_use]
    pub const fn variation_of(mut self, parent: LiftId, max_source: MaxSource) -> Self {
        self.parent_lift_id = Some(parent);
        self.max_source = max_source;
        self
    }

    /// Parent lift and scaling percentage when maxes derive from the parent
    #[must_use]
    pub fn derivation(&self) -> Option<(LiftId, f64)> {
        match (self.parent_lift_id, self.max_source) {
            (Some(parent), MaxSource::DeriveFromParent { percent }) => Some((parent, percent)),
            _ => None,
        }
    }
}
