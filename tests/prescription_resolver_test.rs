// ABOUTME: Integration tests for resolving program days into concrete workouts
// ABOUTME: Verifies per-prescription error collection, ordering, variation maxes, and week resolution
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{t0, wave_catalog};
use liftplan_core::ids::{DayId, LiftId, UserId};
use liftplan_core::models::{Day, MaxKind, ReferenceMax, ScheduleCoordinate};
use liftplan_core::{Catalog, EngineError};
use liftplan_engine::{PrescriptionResolver, ReferenceMaxBook};
use std::collections::HashMap;

fn maxes(entries: &[(LiftId, f64)]) -> HashMap<(LiftId, MaxKind), f64> {
    entries
        .iter()
        .map(|(lift, value)| ((*lift, MaxKind::TrainingMax), *value))
        .collect()
}

fn squat_book(catalog: &Catalog, squat: LiftId) -> ReferenceMaxBook {
    let rows = vec![ReferenceMax::new(
        UserId::new(),
        squat,
        MaxKind::TrainingMax,
        300.0,
        t0(),
    )];
    ReferenceMaxBook::new(rows).with_lifts(catalog.lifts())
}

#[test]
fn test_missing_maxes_are_all_reported() {
    let (catalog, ids) = wave_catalog();
    let program = catalog.program(ids.program_id).unwrap();
    let day_a = catalog.program_day(ids.program_id, 1, 0).unwrap();
    let day_b = catalog.program_day(ids.program_id, 1, 1).unwrap();
    let combined = Day {
        id: DayId::new(),
        slug: "full-body".into(),
        name: "Full Body".into(),
        prescriptions: day_a
            .prescriptions
            .iter()
            .chain(&day_b.prescriptions)
            .copied()
            .collect(),
    };

    let resolution = PrescriptionResolver::new(&catalog)
        .resolve_day(
            program,
            &combined,
            &maxes(&[]),
            &ScheduleCoordinate::new(1, 1, 0),
        )
        .unwrap();

    assert!(resolution.workout.exercises.is_empty());
    assert_eq!(resolution.errors.len(), 3);
    let missing = resolution.missing_maxes();
    assert!(missing.contains(&(ids.squat, MaxKind::TrainingMax)));
    assert!(missing.contains(&(ids.bench, MaxKind::TrainingMax)));
    assert!(missing.contains(&(ids.front_squat, MaxKind::TrainingMax)));
    assert_eq!(resolution.errors[0].lift_name.as_deref(), Some("Squat"));
    assert_eq!(resolution.errors[1].lift_name.as_deref(), Some("Bench Press"));
}

#[test]
fn test_partial_resolution_keeps_successful_exercises() {
    let (catalog, ids) = wave_catalog();
    let program = catalog.program(ids.program_id).unwrap();
    let day_a = catalog.program_day(ids.program_id, 1, 0).unwrap();
    let coordinate = ScheduleCoordinate::new(1, 1, 0);

    // A plain map has no variation links, so front squat cannot borrow the squat max
    let resolution = PrescriptionResolver::new(&catalog)
        .resolve_day(program, day_a, &maxes(&[(ids.squat, 300.0)]), &coordinate)
        .unwrap();
    assert_eq!(resolution.workout.exercises.len(), 1);
    assert_eq!(resolution.workout.exercises[0].lift_id, ids.squat);
    assert_eq!(resolution.errors.len(), 1);
    assert_eq!(resolution.errors[0].lift_id, Some(ids.front_squat));

    let book = squat_book(&catalog, ids.squat);
    let resolution = PrescriptionResolver::new(&catalog)
        .resolve_day(program, day_a, &book, &coordinate)
        .unwrap();
    assert!(resolution.is_complete());
    assert_eq!(resolution.workout.exercises.len(), 2);
}

#[test]
fn test_day_resolves_in_prescription_order_with_derived_variation_max() {
    let (catalog, ids) = wave_catalog();
    let book = squat_book(&catalog, ids.squat);

    let resolution = PrescriptionResolver::new(&catalog)
        .resolve_program_day(ids.program_id, &book, &ScheduleCoordinate::new(1, 1, 0))
        .unwrap();

    assert!(resolution.is_complete());
    let workout = resolution.workout;
    assert_eq!(workout.day_name, "Squat Day");
    assert_eq!(workout.coordinate.day_slug.as_deref(), Some("day-a"));
    assert_eq!(workout.exercises.len(), 2);

    let squat = &workout.exercises[0];
    assert_eq!(squat.lift_id, ids.squat);
    let squat_weights: Vec<f64> = squat.sets.iter().map(|set| set.weight).collect();
    assert_eq!(squat_weights, vec![195.0, 225.0, 255.0]);
    assert!(squat.sets[2].is_amrap);

    // 300 * 80% = 240 derived, 240 * 60% = 144 rounds up to 145
    let front = &workout.exercises[1];
    assert_eq!(front.lift_id, ids.front_squat);
    assert_eq!(front.rest_seconds, Some(120));
    assert!(front.sets.iter().all(|set| (set.weight - 145.0).abs() < 1e-9));
    assert_eq!(front.sets.len(), 3);
}

#[test]
fn test_week_resolution_reports_errors_per_day() {
    let (catalog, ids) = wave_catalog();
    let days = PrescriptionResolver::new(&catalog)
        .resolve_week(ids.program_id, &squat_book(&catalog, ids.squat), 1, 2)
        .unwrap();

    assert_eq!(days.len(), 2);
    assert!(days[0].is_complete());
    assert_eq!(days[0].workout.coordinate.week_number, 2);
    assert_eq!(days[1].errors.len(), 1);
    assert_eq!(days[1].errors[0].lift_id, Some(ids.bench));
    assert!(matches!(
        days[1].errors[0].error,
        EngineError::MissingReferenceMax { kind: MaxKind::TrainingMax, .. }
    ));
}

#[test]
fn test_unknown_week_is_a_structural_error() {
    let (catalog, ids) = wave_catalog();
    let error = PrescriptionResolver::new(&catalog)
        .resolve_program_day(
            ids.program_id,
            &maxes(&[(ids.squat, 300.0)]),
            &ScheduleCoordinate::new(1, 9, 0),
        )
        .unwrap_err();
    assert!(matches!(error, EngineError::NotFound { .. }));
}
