// ABOUTME: Reference max lookup: newest row as of a date, parent derivation, e1RM fallback
// ABOUTME: The resolver reads maxes only through the ReferenceMaxSource trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::rounding::{estimate_one_rep_max, E1rmFormula};
use chrono::{DateTime, Utc};
use liftplan_core::ids::LiftId;
use liftplan_core::models::{Lift, MaxKind, ReferenceMax};
use std::collections::HashMap;

/// Variation chains longer than this are treated as broken data
const MAX_DERIVATION_DEPTH: usize = 8;

/// Read access to a user's current reference maxes
pub trait ReferenceMaxSource: Send + Sync {
    /// Current value of `kind` for `lift_id`, if known
    fn current_max(&self, lift_id: LiftId, kind: MaxKind) -> Option<f64>;
}

impl ReferenceMaxSource for HashMap<(LiftId, MaxKind), f64> {
    fn current_max(&self, lift_id: LiftId, kind: MaxKind) -> Option<f64> {
        self.get(&(lift_id, kind)).copied()
    }
}

/// A user's reference maxes as of a point in time
#[derive(Debug, Clone, Default)]
pub struct ReferenceMaxBook {
    as_of: Option<DateTime<Utc>>,
    history: HashMap<(LiftId, MaxKind), Vec<ReferenceMax>>,
    derivations: HashMap<LiftId, (LiftId, f64)>,
    formula: E1rmFormula,
}

impl ReferenceMaxBook {
    /// Book over every row regardless of effective date
    #[must_use]
    pub fn new(rows: impl IntoIterator<Item = ReferenceMax>) -> Self {
        Self::build(rows, None)
    }

    /// Book that ignores rows effective after `as_of`
    #[must_use]
    pub fn as_of(rows: impl IntoIterator<Item = ReferenceMax>, as_of: DateTime<Utc>) -> Self {
        Self::build(rows, Some(as_of))
    }

    fn build(rows: impl IntoIterator<Item = ReferenceMax>, as_of: Option<DateTime<Utc>>) -> Self {
        let mut history: HashMap<(LiftId, MaxKind), Vec<ReferenceMax>> = HashMap::new();
        for row in rows {
            if as_of.is_some_and(|cutoff| row.effective_at > cutoff) {
                continue;
            }
            history.entry((row.lift_id, row.kind)).or_default().push(row);
        }
        for rows in history.values_mut() {
            rows.sort_by_key(|row| row.effective_at);
        }
        Self {
            as_of,
            history,
            derivations: HashMap::new(),
            formula: E1rmFormula::default(),
        }
    }

    /// Register variation lifts that derive their maxes from a parent
    #[must_use]
    pub fn with_lifts<'a>(mut self, lifts: impl IntoIterator<Item = &'a Lift>) -> Self {
        self.derivations = lifts
            .into_iter()
            .filter_map(|lift| lift.derivation().map(|derivation| (lift.id, derivation)))
            .collect();
        self
    }

    /// Formula for `ESTIMATED_1RM` fallback
    #[must_use]
    pub const fn with_formula(mut self, formula: E1rmFormula) -> Self {
        self.formula = formula;
        self
    }

    /// Cutoff date, if any
    #[must_use]
    pub const fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.as_of
    }

    /// Newest stored row of `kind` for `lift_id`
    #[must_use]
    pub fn latest(&self, lift_id: LiftId, kind: MaxKind) -> Option<&ReferenceMax> {
        self.history.get(&(lift_id, kind)).and_then(|rows| rows.last())
    }

    /// Stored rows of `kind` for `lift_id`, oldest first
    #[must_use]
    pub fn history(&self, lift_id: LiftId, kind: MaxKind) -> &[ReferenceMax] {
        self.history
            .get(&(lift_id, kind))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn estimated_from_rep_max(&self, lift_id: LiftId) -> Option<f64> {
        self.history
            .iter()
            .filter_map(|((lift, kind), rows)| match kind {
                MaxKind::RepMax(reps) if *lift == lift_id => rows.last().map(|row| (*reps, row)),
                _ => None,
            })
            .max_by_key(|(_, row)| row.effective_at)
            .and_then(|(reps, row)| estimate_one_rep_max(row.value, reps, self.formula))
    }

    fn lookup(&self, lift_id: LiftId, kind: MaxKind, depth: usize) -> Option<f64> {
        if let Some(row) = self.latest(lift_id, kind) {
            return Some(row.value);
        }
        if kind == MaxKind::Estimated1Rm {
            if let Some(estimate) = self.estimated_from_rep_max(lift_id) {
                return Some(estimate);
            }
        }
        if depth >= MAX_DERIVATION_DEPTH {
            return None;
        }
        let (parent, percent) = self.derivations.get(&lift_id)?;
        self.lookup(*parent, kind, depth + 1)
            .map(|value| value * percent / 100.0)
    }
}

impl ReferenceMaxSource for ReferenceMaxBook {
    fn current_max(&self, lift_id: LiftId, kind: MaxKind) -> Option<f64> {
        self.lookup(lift_id, kind, 0)
    }
}
