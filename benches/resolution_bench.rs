// ABOUTME: Criterion benchmarks for workout resolution and progression evaluation
// ABOUTME: Measures day and week resolution over generated programs of increasing size
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the resolution pipeline.
//!
//! Programs are generated with a fixed number of lifts per day so that day
//! resolution cost scales with prescriptions and week resolution with days.

#![allow(clippy::missing_docs_in_private_items, missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use liftplan::config::EngineConfig;
use liftplan::database::InMemoryStore;
use liftplan::services::TrainingService;
use liftplan_core::ids::{CycleId, DayId, LiftId, ProgramId, ProgressionId, UserId, WeekId};
use liftplan_core::models::{
    Cycle, Day, Lift, LoadStrategy, MaxKind, Prescription, Program, ProgressionDefinition,
    ProgressionRule, ReferenceMax, ScheduleCoordinate, SetScheme, TriggerContext, TriggerType,
    Week,
};
use liftplan_core::Catalog;
use liftplan_engine::{PrescriptionResolver, ProgressionEngine, ProgressionInput, ReferenceMaxBook};
use std::sync::Arc;
use tokio::runtime::Runtime;

const WEEKS: u32 = 4;
const LIFTS_PER_DAY: usize = 5;

struct BenchProgram {
    catalog: Catalog,
    program_id: ProgramId,
    lifts: Vec<LiftId>,
}

/// Program with `days_per_week` days, each prescribing every lift as 5x5 at a
/// percentage that climbs by week
fn generate_program(days_per_week: u32) -> BenchProgram {
    let mut catalog = Catalog::new();
    let lifts: Vec<LiftId> = (0..LIFTS_PER_DAY)
        .map(|index| {
            catalog.insert_lift(Lift::new(format!("Lift {index}"), format!("lift-{index}")))
        })
        .collect();

    let mut weeks = Vec::new();
    for week_number in 1..=WEEKS {
        let mut days = Vec::new();
        for day_index in 0..days_per_week {
            let prescriptions = lifts
                .iter()
                .zip(1..)
                .map(|(lift, order)| {
                    catalog.insert_prescription(Prescription::new(
                        *lift,
                        LoadStrategy::PercentOf {
                            reference_kind: MaxKind::TrainingMax,
                            percentage: 65.0 + 5.0 * f64::from(week_number),
                            round_to: Some(2.5),
                        },
                        SetScheme::Fixed {
                            sets: 5,
                            reps: 5,
                            is_amrap: order == 1,
                        },
                        order,
                    ))
                })
                .collect();
            days.push(catalog.insert_day(Day {
                id: DayId::new(),
                slug: format!("w{week_number}-d{day_index}"),
                name: format!("Week {week_number} Day {day_index}"),
                prescriptions,
            }));
        }
        weeks.push(catalog.insert_week(Week {
            id: WeekId::new(),
            week_number,
            name: None,
            is_deload: false,
            days,
        }));
    }
    let cycle_id = catalog.insert_cycle(Cycle {
        id: CycleId::new(),
        name: "bench cycle".into(),
        weeks,
    });
    let program_id = catalog.insert_program(Program {
        id: ProgramId::new(),
        slug: format!("bench-{days_per_week}"),
        name: "Benchmark Program".into(),
        cycle_id,
        weekly_lookup_id: None,
        daily_lookup_id: None,
        rotation_length: None,
    });

    BenchProgram {
        catalog,
        program_id,
        lifts,
    }
}

fn max_rows(user_id: UserId, lifts: &[LiftId]) -> Vec<ReferenceMax> {
    lifts
        .iter()
        .zip(0_u32..)
        .map(|(lift, index)| {
            ReferenceMax::new(
                user_id,
                *lift,
                MaxKind::TrainingMax,
                200.0 + 20.0 * f64::from(index),
                Utc::now(),
            )
        })
        .collect()
}

fn bench_day_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_day");
    let program = generate_program(3);
    let book = ReferenceMaxBook::new(max_rows(UserId::new(), &program.lifts))
        .with_lifts(program.catalog.lifts());
    let coordinate = ScheduleCoordinate::new(1, 2, 1);

    group.throughput(Throughput::Elements(LIFTS_PER_DAY as u64));
    group.bench_function("five_prescriptions", |b| {
        b.iter(|| {
            PrescriptionResolver::new(&program.catalog)
                .resolve_program_day(black_box(program.program_id), &book, &coordinate)
                .unwrap()
        });
    });

    // Every prescription fails on a missing max and is still collected
    let empty = ReferenceMaxBook::new(Vec::new());
    group.bench_function("all_maxes_missing", |b| {
        b.iter(|| {
            PrescriptionResolver::new(&program.catalog)
                .resolve_program_day(black_box(program.program_id), &empty, &coordinate)
                .unwrap()
        });
    });

    group.finish();
}

fn bench_week_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_week");

    for days_per_week in [3_u32, 5, 7] {
        let program = generate_program(days_per_week);
        let book = ReferenceMaxBook::new(max_rows(UserId::new(), &program.lifts))
            .with_lifts(program.catalog.lifts());

        group.throughput(Throughput::Elements(u64::from(days_per_week)));
        group.bench_with_input(
            BenchmarkId::new("days", days_per_week),
            &program,
            |b, program| {
                b.iter(|| {
                    PrescriptionResolver::new(&program.catalog)
                        .resolve_week(black_box(program.program_id), &book, 1, 3)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_service_week_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_resolve_week");
    let runtime = Runtime::new().unwrap();

    let program = generate_program(4);
    let program_id = program.program_id;
    let user_id = UserId::new();
    let service = TrainingService::new(
        Arc::new(program.catalog),
        Arc::new(InMemoryStore::new()),
        EngineConfig::default(),
    );
    runtime.block_on(async {
        for row in max_rows(user_id, &program.lifts) {
            service
                .record_max(user_id, row.lift_id, row.kind, row.value, row.effective_at)
                .await
                .unwrap();
        }
    });

    let service = &service;
    group.bench_function("four_days", |b| {
        b.to_async(&runtime).iter(|| async move {
            service
                .resolve_week(user_id, program_id, 1, 2)
                .await
                .unwrap()
        });
    });

    group.finish();
}

fn bench_progression_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("progression");
    let engine = ProgressionEngine::new().with_round_to(Some(2.5));
    let user_id = UserId::new();
    let lift_id = LiftId::new();
    let definition = ProgressionDefinition {
        id: ProgressionId::new(),
        name: "weekly bump".into(),
        rule: ProgressionRule::Linear {
            increment: 5.0,
            trigger: TriggerType::AfterWeek,
            max_kind: MaxKind::TrainingMax,
        },
    };
    let now = Utc::now();
    let context = TriggerContext::new(TriggerType::AfterWeek, now);

    group.bench_function("linear_apply", |b| {
        b.iter(|| {
            let input = ProgressionInput::new(user_id, lift_id, &definition, &context, now)
                .with_current_max(Some(black_box(300.0)));
            engine.apply(&input).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_day_resolution,
    bench_week_resolution,
    bench_service_week_resolution,
    bench_progression_evaluation
);
criterion_main!(benches);
