// ABOUTME: Expands a set scheme into concrete numbered sets with weights and rep targets
// ABOUTME: Ramps keep their authored step order; empty expansions are configuration errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::load_strategy::{load_from_max, reference_max, LoadContext};
use crate::lookup::resolve_weekly;
use crate::rounding::percent_of;
use liftplan_core::constants::load::RAMP_BASE_PERCENTAGE;
use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::ids::{LiftId, PrescriptionId};
use liftplan_core::models::{
    LoadStrategy, Prescription, RampStep, SetResult, SetScheme, StageDefinition, WeeklyKey,
};

/// Expand the scheme of `prescription`
///
/// # Errors
///
/// See [`expand`]
pub fn expand_prescription(
    prescription: &Prescription,
    context: &LoadContext<'_>,
) -> EngineResult<Vec<SetResult>> {
    expand(
        prescription.id,
        &prescription.set_scheme,
        &prescription.load_strategy,
        prescription.lift_id,
        context,
    )
}

/// `scheme` with the sets and reps of `stage`.
///
/// Ramps and lookup-driven schemes take their sets from the authored steps or the
/// weekly table and keep their shape.
#[must_use]
pub fn staged_scheme(scheme: &SetScheme, stage: &StageDefinition) -> SetScheme {
    match scheme {
        SetScheme::Fixed { is_amrap, .. } => SetScheme::Fixed {
            sets: stage.sets,
            reps: stage.reps,
            is_amrap: *is_amrap,
        },
        SetScheme::Amrap { .. } => SetScheme::Amrap {
            sets: stage.sets,
            min_reps: stage.reps,
        },
        SetScheme::Ramp { .. } | SetScheme::LookupDriven { .. } => scheme.clone(),
    }
}

/// Expand `scheme` into ordered sets for `lift_id`.
///
/// The reference max is fetched once, so a missing max yields a single error for
/// the whole scheme.
///
/// # Errors
///
/// - `MissingReferenceMax` when the strategy's max is absent
/// - `LookupMiss` when a table row the scheme needs is absent
/// - `EmptyScheme` when the scheme produces no sets
pub fn expand(
    prescription_id: PrescriptionId,
    scheme: &SetScheme,
    strategy: &LoadStrategy,
    lift_id: LiftId,
    context: &LoadContext<'_>,
) -> EngineResult<Vec<SetResult>> {
    let max = reference_max(context.maxes, lift_id, strategy.reference_kind())?;
    let sets = match scheme {
        SetScheme::Fixed {
            sets,
            reps,
            is_amrap,
        } => expand_fixed(*sets, *reps, *is_amrap, strategy, max, context)?,
        SetScheme::Amrap { sets, min_reps } => expand_amrap(*sets, *min_reps, strategy, max, context)?,
        SetScheme::Ramp {
            steps,
            work_set_threshold,
        } => expand_ramp(steps, *work_set_threshold, strategy, max),
        SetScheme::LookupDriven { work_sets } => {
            expand_lookup_driven(*work_sets, strategy, max, context)?
        }
    };

    if sets.is_empty() {
        return Err(EngineError::EmptyScheme {
            prescription_id,
            reason: format!("{} scheme yielded zero sets", scheme.type_name()),
        });
    }
    Ok(sets)
}

fn expand_fixed(
    count: u32,
    reps: u32,
    last_is_amrap: bool,
    strategy: &LoadStrategy,
    max: f64,
    context: &LoadContext<'_>,
) -> EngineResult<Vec<SetResult>> {
    (1..=count)
        .map(|set_number| {
            let load = load_from_max(strategy, max, &context.tables, context.coordinate, Some(set_number))?;
            Ok(SetResult {
                set_number,
                weight: load.weight,
                target_reps: reps,
                is_amrap: last_is_amrap && set_number == count,
                is_work_set: true,
                percentage: load.percentage,
            })
        })
        .collect()
}

fn expand_amrap(
    count: u32,
    min_reps: u32,
    strategy: &LoadStrategy,
    max: f64,
    context: &LoadContext<'_>,
) -> EngineResult<Vec<SetResult>> {
    (1..=count)
        .map(|set_number| {
            let load = load_from_max(strategy, max, &context.tables, context.coordinate, Some(set_number))?;
            Ok(SetResult {
                set_number,
                weight: load.weight,
                target_reps: min_reps,
                is_amrap: true,
                is_work_set: true,
                percentage: load.percentage,
            })
        })
        .collect()
}

/// Ramp steps are percentages of the top weight, which is the strategy evaluated at 100%.
fn expand_ramp(
    steps: &[RampStep],
    work_set_threshold: f64,
    strategy: &LoadStrategy,
    max: f64,
) -> Vec<SetResult> {
    let top = max * RAMP_BASE_PERCENTAGE / 100.0;
    steps
        .iter()
        .zip(1..)
        .map(|(step, set_number)| SetResult {
            set_number,
            weight: percent_of(top, step.percentage, strategy.round_to()),
            target_reps: step.reps,
            is_amrap: false,
            is_work_set: step.percentage >= work_set_threshold,
            percentage: step.percentage,
        })
        .collect()
}

fn expand_lookup_driven(
    work_sets: u32,
    strategy: &LoadStrategy,
    max: f64,
    context: &LoadContext<'_>,
) -> EngineResult<Vec<SetResult>> {
    let table = context.tables.require_weekly("LOOKUP_DRIVEN")?;
    let week = context.coordinate.week_number;
    (1..=work_sets)
        .map(|set_number| {
            let key = WeeklyKey::WeekSet(week, set_number);
            let row = resolve_weekly(table, key)?;
            let percentage = row
                .percentage
                .ok_or_else(|| EngineError::lookup_miss(&table.name, format!("{key} percentage")))?;
            let reps = row
                .reps
                .ok_or_else(|| EngineError::lookup_miss(&table.name, format!("{key} reps")))?;
            Ok(SetResult {
                set_number,
                weight: percent_of(max, percentage, strategy.round_to()),
                target_reps: reps,
                is_amrap: row.is_amrap,
                is_work_set: true,
                percentage,
            })
        })
        .collect()
}
