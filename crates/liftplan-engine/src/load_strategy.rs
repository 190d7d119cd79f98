// ABOUTME: Computes a single weight from a reference max and a tagged load strategy
// ABOUTME: Lookup strategies read their percentage from the program's tables for the coordinate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::lookup::{daily_key, daily_percentage, weekly_key, weekly_percentage, ProgramTables};
use crate::maxes::ReferenceMaxSource;
use crate::rounding::percent_of;
use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::ids::LiftId;
use liftplan_core::models::{LoadStrategy, MaxKind, ScheduleCoordinate};

/// Everything a strategy needs besides the strategy itself
#[derive(Clone, Copy)]
pub struct LoadContext<'a> {
    /// The user's reference maxes
    pub maxes: &'a dyn ReferenceMaxSource,
    /// The program's lookup tables
    pub tables: ProgramTables<'a>,
    /// Where in the program the workout falls
    pub coordinate: &'a ScheduleCoordinate,
}

impl<'a> LoadContext<'a> {
    /// Bundle a resolution context
    #[must_use]
    pub fn new(
        maxes: &'a dyn ReferenceMaxSource,
        tables: ProgramTables<'a>,
        coordinate: &'a ScheduleCoordinate,
    ) -> Self {
        Self {
            maxes,
            tables,
            coordinate,
        }
    }
}

/// A computed load: the percentage used and the resulting weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Load {
    /// Percentage of the reference max
    pub percentage: f64,
    /// Rounded weight
    pub weight: f64,
}

/// Current reference max of `kind` for `lift_id`
///
/// # Errors
///
/// Returns `EngineError::MissingReferenceMax` if the user has no such max
pub fn reference_max(
    maxes: &dyn ReferenceMaxSource,
    lift_id: LiftId,
    kind: MaxKind,
) -> EngineResult<f64> {
    maxes
        .current_max(lift_id, kind)
        .ok_or(EngineError::MissingReferenceMax { lift_id, kind })
}

/// Percentage a strategy prescribes at `coordinate`.
///
/// `set_number` only matters for weekly tables with per-set rows.
///
/// # Errors
///
/// Returns `EngineError::LookupMiss` for absent rows, or `EngineError::Validation` when
/// the program lacks the table the strategy reads
pub fn strategy_percentage(
    strategy: &LoadStrategy,
    tables: &ProgramTables<'_>,
    coordinate: &ScheduleCoordinate,
    set_number: Option<u32>,
) -> EngineResult<f64> {
    match strategy {
        LoadStrategy::PercentOf { percentage, .. } => Ok(*percentage),
        LoadStrategy::WeeklyLookup { .. } => {
            let table = tables.require_weekly(strategy.type_name())?;
            weekly_percentage(table, weekly_key(table, coordinate.week_number, set_number))
        }
        LoadStrategy::DailyLookup { .. } => {
            let table = tables.require_daily(strategy.type_name())?;
            daily_percentage(table, &daily_key(table, coordinate))
        }
    }
}

/// Load for an already fetched reference max
///
/// # Errors
///
/// Propagates lookup failures from [`strategy_percentage`]
pub fn load_from_max(
    strategy: &LoadStrategy,
    max: f64,
    tables: &ProgramTables<'_>,
    coordinate: &ScheduleCoordinate,
    set_number: Option<u32>,
) -> EngineResult<Load> {
    let percentage = strategy_percentage(strategy, tables, coordinate, set_number)?;
    Ok(Load {
        percentage,
        weight: percent_of(max, percentage, strategy.round_to()),
    })
}

/// Evaluate a strategy for `lift_id` and return the percentage alongside the weight
///
/// # Errors
///
/// Returns `EngineError::MissingReferenceMax` when the max is absent, otherwise
/// propagates lookup failures
pub fn evaluate_load(
    strategy: &LoadStrategy,
    lift_id: LiftId,
    context: &LoadContext<'_>,
    set_number: Option<u32>,
) -> EngineResult<Load> {
    let max = reference_max(context.maxes, lift_id, strategy.reference_kind())?;
    load_from_max(strategy, max, &context.tables, context.coordinate, set_number)
}

/// Evaluate a strategy for `lift_id` to a single rounded weight
///
/// # Errors
///
/// See [`evaluate_load`]
pub fn evaluate(
    strategy: &LoadStrategy,
    lift_id: LiftId,
    context: &LoadContext<'_>,
) -> EngineResult<f64> {
    evaluate_load(strategy, lift_id, context, None).map(|load| load.weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_max_names_lift_and_kind() {
        let lift = LiftId::new();
        let maxes: HashMap<(LiftId, MaxKind), f64> = HashMap::new();
        let coordinate = ScheduleCoordinate::new(1, 1, 0);
        let context = LoadContext::new(&maxes, ProgramTables::default(), &coordinate);
        let strategy = LoadStrategy::PercentOf {
            reference_kind: MaxKind::OneRm,
            percentage: 80.0,
            round_to: None,
        };
        let result = evaluate(&strategy, lift, &context);
        assert_eq!(
            result,
            Err(EngineError::MissingReferenceMax {
                lift_id: lift,
                kind: MaxKind::OneRm
            })
        );
    }

    #[test]
    fn test_lookup_strategy_without_table_is_validation_error() {
        let lift = LiftId::new();
        let maxes = HashMap::from([((lift, MaxKind::TrainingMax), 200.0)]);
        let coordinate = ScheduleCoordinate::new(1, 2, 0);
        let context = LoadContext::new(&maxes, ProgramTables::default(), &coordinate);
        let strategy = LoadStrategy::WeeklyLookup {
            reference_kind: MaxKind::TrainingMax,
            round_to: Some(5.0),
        };
        assert!(matches!(
            evaluate(&strategy, lift, &context),
            Err(EngineError::Validation(_))
        ));
    }
}
