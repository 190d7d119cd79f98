// ABOUTME: Shared test utilities and catalog fixtures for integration tests
// ABOUTME: Builds a small wave-style program with lookups, ramps, and linked progressions
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::unwrap_used,
    clippy::must_use_candidate,
    clippy::too_many_lines
)]
//! Shared test utilities for `liftplan`

use chrono::{DateTime, Duration, TimeZone, Utc};
use liftplan::config::EngineConfig;
use liftplan::database::InMemoryStore;
use liftplan::services::TrainingService;
use liftplan_core::ids::{CycleId, DayId, LiftId, LookupId, ProgramId, ProgressionId, WeekId};
use liftplan_core::models::{
    Cycle, Day, Lift, LoadStrategy, MaxKind, MaxSource, Prescription, Program,
    ProgramProgression, ProgressionDefinition, ProgressionRule, RampStep, RepBucket, SetScheme,
    TriggerType, Week, WeeklyLookup, WeeklyLookupEntry,
};
use liftplan_core::Catalog;
use std::env;
use std::sync::{Arc, Once};
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fixed instant so tests are reproducible
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
}

/// `t0` plus whole days
pub fn day(offset: i64) -> DateTime<Utc> {
    t0() + Duration::days(offset)
}

/// Percent-of-training-max strategy rounded to 2.5
pub fn percent_of_tm(percentage: f64) -> LoadStrategy {
    LoadStrategy::PercentOf {
        reference_kind: MaxKind::TrainingMax,
        percentage,
        round_to: Some(2.5),
    }
}

/// Weekly-lookup strategy on the training max rounded to 2.5
pub fn weekly_tm() -> LoadStrategy {
    LoadStrategy::WeeklyLookup {
        reference_kind: MaxKind::TrainingMax,
        round_to: Some(2.5),
    }
}

/// Per-set wave table: three weeks of three sets, the last set of each week AMRAP
pub fn wave_lookup() -> WeeklyLookup {
    let waves: [[(f64, u32); 3]; 3] = [
        [(65.0, 5), (75.0, 5), (85.0, 5)],
        [(70.0, 3), (80.0, 3), (90.0, 3)],
        [(75.0, 5), (85.0, 3), (95.0, 1)],
    ];
    let mut entries = Vec::new();
    for (week, sets) in (1..).zip(waves) {
        for (set_number, (percentage, reps)) in (1..).zip(sets) {
            entries.push(WeeklyLookupEntry {
                week,
                set_number: Some(set_number),
                percentage: Some(percentage),
                reps: Some(reps),
                sets: None,
                is_amrap: set_number == 3,
            });
        }
    }
    WeeklyLookup {
        id: LookupId::new(),
        name: "waves".into(),
        entries,
    }
}

/// Identifiers of the wave program fixture
#[derive(Debug, Clone, Copy)]
pub struct WaveProgram {
    pub program_id: ProgramId,
    pub squat: LiftId,
    pub bench: LiftId,
    pub front_squat: LiftId,
    /// `CYCLE` rule linked to squat (override 10) and bench
    pub cycle_rule: ProgressionId,
    /// `DELOAD_ON_FAILURE` rule linked to squat
    pub deload_rule: ProgressionId,
    /// `AMRAP_GUIDED` rule, not linked to the program
    pub amrap_rule: ProgressionId,
}

/// Two lifts, three weeks, two days per week.
///
/// Day A: squat waves from the lookup, then front squat 3x8 at 60%.
/// Day B: bench ramp [50, 63, 75, 88, 100, 75] with work sets from 75%.
pub fn wave_catalog() -> (Catalog, WaveProgram) {
    let mut catalog = Catalog::new();

    let squat = catalog.insert_lift(Lift::new("Squat", "squat").competition());
    let bench = catalog.insert_lift(Lift::new("Bench Press", "bench-press").competition());
    let front_squat = catalog.insert_lift(
        Lift::new("Front Squat", "front-squat")
            .variation_of(squat, MaxSource::DeriveFromParent { percent: 80.0 }),
    );

    let squat_waves = catalog.insert_prescription(Prescription::new(
        squat,
        weekly_tm(),
        SetScheme::LookupDriven { work_sets: 3 },
        1,
    ));
    let front_squat_volume = catalog.insert_prescription(
        Prescription::new(
            front_squat,
            percent_of_tm(60.0),
            SetScheme::Fixed {
                sets: 3,
                reps: 8,
                is_amrap: false,
            },
            2,
        )
        .with_rest_seconds(120),
    );
    let bench_ramp = catalog.insert_prescription(Prescription::new(
        bench,
        percent_of_tm(100.0),
        SetScheme::Ramp {
            steps: ramp_steps(),
            work_set_threshold: 75.0,
        },
        1,
    ));

    let day_a = catalog.insert_day(Day {
        id: DayId::new(),
        slug: "day-a".into(),
        name: "Squat Day".into(),
        prescriptions: vec![squat_waves, front_squat_volume],
    });
    let day_b = catalog.insert_day(Day {
        id: DayId::new(),
        slug: "day-b".into(),
        name: "Bench Day".into(),
        prescriptions: vec![bench_ramp],
    });

    let weeks = (1..=3)
        .map(|week_number| {
            catalog.insert_week(Week {
                id: WeekId::new(),
                week_number,
                name: Some(format!("Week {week_number}")),
                is_deload: false,
                days: vec![day_a, day_b],
            })
        })
        .collect();
    let cycle_id = catalog.insert_cycle(Cycle {
        id: CycleId::new(),
        name: "waves".into(),
        weeks,
    });
    let weekly_lookup_id = catalog.insert_weekly_lookup(wave_lookup());

    let program_id = catalog.insert_program(Program {
        id: ProgramId::new(),
        slug: "waves".into(),
        name: "Wave Program".into(),
        cycle_id,
        weekly_lookup_id: Some(weekly_lookup_id),
        daily_lookup_id: None,
        rotation_length: None,
    });

    let cycle_rule = catalog.insert_progression(ProgressionDefinition {
        id: ProgressionId::new(),
        name: "cycle bump".into(),
        rule: ProgressionRule::Cycle {
            increment: 5.0,
            max_kind: MaxKind::TrainingMax,
        },
    });
    let deload_rule = catalog.insert_progression(ProgressionDefinition {
        id: ProgressionId::new(),
        name: "three strikes".into(),
        rule: ProgressionRule::DeloadOnFailure {
            failure_threshold: 3,
            deload_percent: 10.0,
            max_kind: MaxKind::TrainingMax,
        },
    });
    let amrap_rule = catalog.insert_progression(ProgressionDefinition {
        id: ProgressionId::new(),
        name: "amrap buckets".into(),
        rule: ProgressionRule::AmrapGuided {
            buckets: amrap_buckets(),
            trigger: TriggerType::AfterCycle,
            max_kind: MaxKind::TrainingMax,
        },
    });

    catalog.link_progression(ProgramProgression {
        program_id,
        lift_id: squat,
        progression_id: cycle_rule,
        increment_override: Some(10.0),
        enabled: true,
    });
    catalog.link_progression(ProgramProgression {
        program_id,
        lift_id: bench,
        progression_id: cycle_rule,
        increment_override: None,
        enabled: true,
    });
    catalog.link_progression(ProgramProgression {
        program_id,
        lift_id: squat,
        progression_id: deload_rule,
        increment_override: None,
        enabled: true,
    });

    catalog.validate().unwrap();
    (
        catalog,
        WaveProgram {
            program_id,
            squat,
            bench,
            front_squat,
            cycle_rule,
            deload_rule,
            amrap_rule,
        },
    )
}

/// Ramp used by the bench day
pub fn ramp_steps() -> Vec<RampStep> {
    [(50.0, 5), (63.0, 5), (75.0, 3), (88.0, 2), (100.0, 1), (75.0, 8)]
        .into_iter()
        .map(|(percentage, reps)| RampStep { percentage, reps })
        .collect()
}

/// 6-7 reps: +2.5, 8-9: +5.0, 10-12: +7.5
pub fn amrap_buckets() -> Vec<RepBucket> {
    vec![
        RepBucket {
            min_reps: 6,
            max_reps: 7,
            increment: 2.5,
        },
        RepBucket {
            min_reps: 8,
            max_reps: 9,
            increment: 5.0,
        },
        RepBucket {
            min_reps: 10,
            max_reps: 12,
            increment: 7.5,
        },
    ]
}

/// Service over the wave catalog and a fresh in-memory store
pub fn wave_service() -> (TrainingService<InMemoryStore>, WaveProgram) {
    init_test_logging();
    let (catalog, ids) = wave_catalog();
    let service = TrainingService::new(
        Arc::new(catalog),
        Arc::new(InMemoryStore::new()),
        EngineConfig::default(),
    );
    (service, ids)
}
