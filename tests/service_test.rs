// ABOUTME: Integration tests for the training service over the in-memory store
// ABOUTME: Drives enrollment, workouts, set logging, and progression triggers end to end
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::{day, init_test_logging, t0, wave_catalog, wave_service, WaveProgram};
use liftplan::config::EngineConfig;
use liftplan::database::{EnrollmentRepository, InMemoryStore, ProgressionRepository, StoreError};
use liftplan::services::{LoggedSet, TrainingService};
use liftplan_core::errors::ErrorCode;
use liftplan_core::ids::{LiftId, ProgressionId, SessionId, UserId};
use liftplan_core::models::{
    AdvanceKind, EnrollmentStatus, FinalFailureAction, MaxKind, ProgramProgression,
    ProgressionDefinition, ProgressionRule, ScheduleCoordinate, StageDefinition,
    StateMachineKind, TriggerContext, TriggerType, WorkoutStatus,
};
use liftplan_core::EngineError;
use liftplan_engine::state_machine::ScheduleEvent;
use liftplan_engine::{ReferenceMaxSource, SkipReason};
use std::sync::Arc;

/// Enrolled user with squat 1RM 400 (TM 360) and bench 1RM 250 (TM 225)
async fn enrolled_user(service: &TrainingService<InMemoryStore>, ids: &WaveProgram) -> UserId {
    let user = UserId::new();
    service.enroll(user, ids.program_id, t0()).await.unwrap();
    service
        .record_one_rep_max(user, ids.squat, 400.0, t0())
        .await
        .unwrap();
    service
        .record_one_rep_max(user, ids.bench, 250.0, t0())
        .await
        .unwrap();
    user
}

async fn training_max(
    service: &TrainingService<InMemoryStore>,
    user: UserId,
    lift: LiftId,
) -> Option<f64> {
    service
        .max_book(user, None)
        .await
        .unwrap()
        .current_max(lift, MaxKind::TrainingMax)
}

fn missed(lift_id: LiftId) -> LoggedSet {
    LoggedSet {
        lift_id,
        target_reps: 5,
        actual_reps: 3,
        is_amrap: false,
    }
}

#[tokio::test]
async fn test_enroll_twice_conflicts_until_quit() {
    let (service, ids) = wave_service();
    let user = UserId::new();

    let state = service.enroll(user, ids.program_id, t0()).await.unwrap();
    assert_eq!(state.current_week, 1);
    assert_eq!(state.cycle_iteration, 1);
    assert_eq!(state.statuses.enrollment, EnrollmentStatus::Active);
    assert!(state.rotation.is_none());

    let error = service.enroll(user, ids.program_id, t0()).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceConflict);

    let quit = service.quit(user, day(1)).await.unwrap();
    assert_eq!(quit.statuses.enrollment, EnrollmentStatus::Quit);

    let error = service
        .advance_state(user, AdvanceKind::Day, day(2))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::EnrollmentNotActive);
    assert_eq!(
        service.quit(user, day(2)).await.unwrap_err().code,
        ErrorCode::InvalidTransition
    );

    let again = service.enroll(user, ids.program_id, day(3)).await.unwrap();
    assert_eq!(again.version, 0);
    assert_ne!(again.id, state.id);
}

#[tokio::test]
async fn test_one_rep_max_records_derived_training_max() {
    let (service, ids) = wave_service();
    let user = UserId::new();

    let (one_rm, training) = service
        .record_one_rep_max(user, ids.squat, 400.0, t0())
        .await
        .unwrap();
    assert_eq!(one_rm.kind, MaxKind::OneRm);
    assert_eq!(training.kind, MaxKind::TrainingMax);
    assert!((training.value - 360.0).abs() < 1e-9);

    let error = service
        .record_max(user, ids.squat, MaxKind::TrainingMax, -5.0, t0())
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_missing_max_is_reported_with_lift_and_kind() {
    let (service, ids) = wave_service();
    let user = UserId::new();
    service.enroll(user, ids.program_id, t0()).await.unwrap();

    let resolution = service.resolve_current_workout(user).await.unwrap();
    assert!(!resolution.is_complete());
    assert!(resolution
        .missing_maxes()
        .contains(&(ids.squat, MaxKind::TrainingMax)));

    let error = service
        .trigger_progression(
            user,
            ids.cycle_rule,
            ids.squat,
            TriggerContext::new(TriggerType::AfterCycle, day(1)),
        )
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::MissingReferenceMax);
    assert!(error.is_recoverable());
    assert!(matches!(
        error.engine_error(),
        Some(EngineError::MissingReferenceMax { lift_id, kind: MaxKind::TrainingMax }) if *lift_id == ids.squat
    ));
}

#[tokio::test]
async fn test_current_workout_and_week_resolution() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;

    let resolution = service.resolve_current_workout(user).await.unwrap();
    assert!(resolution.is_complete());
    let workout = resolution.workout;
    assert_eq!(workout.day_name, "Squat Day");
    let squat: Vec<f64> = workout.exercises[0].sets.iter().map(|s| s.weight).collect();
    // 65/75/85% of 360, rounded to 2.5
    assert_eq!(squat, vec![235.0, 270.0, 305.0]);
    // 360 * 80% * 60% = 172.8
    assert!((workout.exercises[1].sets[0].weight - 172.5).abs() < 1e-9);

    let (explicit, errors) = service
        .resolve_workout(ids.program_id, user, &ScheduleCoordinate::new(1, 2, 1))
        .await
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(explicit.day_name, "Bench Day");
    assert_eq!(explicit.exercises[0].sets.len(), 6);

    let week = service.resolve_week(user, ids.program_id, 1, 3).await.unwrap();
    assert_eq!(week.len(), 2);
    assert!(week.iter().all(|day| day.is_complete()));

    let error = service
        .resolve_week(user, ids.program_id, 1, 4)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_full_cycle_fires_cycle_progression_with_override() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;

    let mut last = None;
    for offset in 1..=6 {
        let (session, _) = service.start_workout(user, day(offset)).await.unwrap();
        last = Some(
            service
                .complete_workout(user, session.id, day(offset))
                .await
                .unwrap(),
        );
    }
    let report = last.unwrap();

    assert!(report
        .events
        .contains(&ScheduleEvent::CycleCompleted { cycle_iteration: 1 }));
    assert_eq!(report.state.statuses.enrollment, EnrollmentStatus::BetweenCycles);
    assert_eq!(report.state.cycle_iteration, 2);

    let cycle_fired: Vec<_> = report
        .progressions
        .iter()
        .filter(|fired| fired.trigger_type == TriggerType::AfterCycle)
        .collect();
    assert_eq!(cycle_fired.len(), 2);
    assert!(cycle_fired.iter().all(|fired| fired.is_applied()));

    // Squat uses the program's override of 10, bench the rule's 5
    assert_eq!(training_max(&service, user, ids.squat).await, Some(370.0));
    assert_eq!(training_max(&service, user, ids.bench).await, Some(230.0));

    let squat_logs = service
        .list_progression_logs(user, Some(ids.squat))
        .await
        .unwrap();
    assert_eq!(squat_logs.len(), 1);
    assert!((squat_logs[0].delta - 10.0).abs() < 1e-9);
    assert_eq!(squat_logs[0].context.cycle_iteration, Some(1));
    assert_eq!(
        service.list_progression_logs(user, None).await.unwrap().len(),
        2
    );

    // The next workout resumes training in cycle 2
    let (session, events) = service.start_workout(user, day(7)).await.unwrap();
    assert_eq!(session.week_number, 1);
    assert!(events.contains(&ScheduleEvent::CycleStarted { cycle_iteration: 2 }));
    let state = service.enrollment(user).await.unwrap();
    assert_eq!(state.statuses.enrollment, EnrollmentStatus::Active);
}

#[tokio::test]
async fn test_duplicate_trigger_applies_once() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;
    let context = TriggerContext::new(TriggerType::AfterCycle, day(1));

    let first = service
        .trigger_progression(user, ids.cycle_rule, ids.squat, context.clone())
        .await
        .unwrap();
    assert!(first.is_applied());

    let second = service
        .trigger_progression(user, ids.cycle_rule, ids.squat, context)
        .await
        .unwrap();
    assert_eq!(second.skip_reason(), Some(SkipReason::AlreadyApplied));

    assert_eq!(service.store().progression_log_count(), 1);
    assert_eq!(training_max(&service, user, ids.squat).await, Some(370.0));

    // A different instant is a different trigger
    let third = service
        .trigger_progression(
            user,
            ids.cycle_rule,
            ids.squat,
            TriggerContext::new(TriggerType::AfterCycle, day(2)),
        )
        .await
        .unwrap();
    assert!(third.is_applied());
    assert_eq!(training_max(&service, user, ids.squat).await, Some(380.0));
}

#[tokio::test]
async fn test_three_missed_sets_deload_squat() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;
    let (session, _) = service.start_workout(user, day(1)).await.unwrap();

    for minute in 0..2 {
        let fired = service
            .record_set(user, session.id, missed(ids.squat), day(1) + Duration::minutes(minute))
            .await
            .unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].progression_id, ids.deload_rule);
        assert_eq!(fired[0].trigger_type, TriggerType::OnFailure);
    }
    assert_eq!(training_max(&service, user, ids.squat).await, Some(360.0));

    let fired = service
        .record_set(user, session.id, missed(ids.squat), day(1) + Duration::minutes(2))
        .await
        .unwrap();
    let applied = fired[0].outcome.as_ref().unwrap().applied().unwrap();
    assert!((applied.log.new_value - 324.0).abs() < 1e-9);
    assert_eq!(applied.failure_counter.as_ref().unwrap().consecutive_failures, 0);
    assert_eq!(training_max(&service, user, ids.squat).await, Some(324.0));

    // Bench has no failure rule linked
    let fired = service
        .record_set(user, session.id, missed(ids.bench), day(1) + Duration::minutes(3))
        .await
        .unwrap();
    assert!(fired.is_empty());
}

#[tokio::test]
async fn test_missed_sets_across_sessions_deload_squat() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;

    for (offset, streak, expected_tm) in [(1, 1, 360.0), (2, 2, 360.0), (3, 0, 324.0)] {
        let (session, _) = service.start_workout(user, day(offset)).await.unwrap();
        service
            .record_set(user, session.id, missed(ids.squat), day(offset))
            .await
            .unwrap();
        let report = service
            .complete_workout(user, session.id, day(offset) + Duration::hours(1))
            .await
            .unwrap();
        assert!(report
            .progressions
            .iter()
            .all(|fired| fired.progression_id != ids.deload_rule));

        let counter = service
            .store()
            .get_failure_counter(user, ids.squat, ids.deload_rule)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.consecutive_failures, streak, "session {offset}");
        assert_eq!(
            training_max(&service, user, ids.squat).await,
            Some(expected_tm)
        );
    }
}

fn stage(name: &str, sets: u32, reps: u32) -> StageDefinition {
    StageDefinition {
        name: name.into(),
        sets,
        reps,
        target_volume: None,
    }
}

/// Wave program plus a three-stage rule linked to front squat
fn staged_service() -> (TrainingService<InMemoryStore>, WaveProgram, ProgressionId) {
    init_test_logging();
    let (mut catalog, ids) = wave_catalog();
    let stage_rule = catalog.insert_progression(ProgressionDefinition {
        id: ProgressionId::new(),
        name: "front squat stages".into(),
        rule: ProgressionRule::Stage {
            stages: vec![stage("3x8", 3, 8), stage("4x5", 4, 5), stage("6x2", 6, 2)],
            on_final_failure: FinalFailureAction::ResetWeight,
            reset_percent: None,
            max_kind: MaxKind::TrainingMax,
        },
    });
    catalog.link_progression(ProgramProgression {
        program_id: ids.program_id,
        lift_id: ids.front_squat,
        progression_id: stage_rule,
        increment_override: None,
        enabled: true,
    });
    let service = TrainingService::new(
        Arc::new(catalog),
        Arc::new(InMemoryStore::new()),
        EngineConfig::default(),
    );
    (service, ids, stage_rule)
}

#[tokio::test]
async fn test_active_stage_shapes_resolved_sets() {
    let (service, ids, stage_rule) = staged_service();
    let user = enrolled_user(&service, &ids).await;

    let workout = service.resolve_current_workout(user).await.unwrap().workout;
    let front_squat = &workout.exercises[1];
    assert_eq!(front_squat.lift_id, ids.front_squat);
    assert_eq!(front_squat.stage.as_deref(), Some("3x8"));
    assert_eq!(front_squat.target_volume, Some(24));
    assert_eq!(front_squat.sets.len(), 3);

    let (session, _) = service.start_workout(user, day(1)).await.unwrap();
    let fired = service
        .record_set(user, session.id, missed(ids.front_squat), day(1))
        .await
        .unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].progression_id, stage_rule);
    assert!(fired[0].is_applied());

    let workout = service.resolve_current_workout(user).await.unwrap().workout;
    let front_squat = &workout.exercises[1];
    assert_eq!(front_squat.stage.as_deref(), Some("4x5"));
    assert_eq!(front_squat.target_volume, Some(20));
    assert_eq!(front_squat.sets.len(), 4);
    assert!(front_squat.sets.iter().all(|set| set.target_reps == 5));
    // Load is untouched: 60% of the derived 288 training max
    assert!(front_squat
        .sets
        .iter()
        .all(|set| (set.weight - 172.5).abs() < 1e-9));

    // The lookup-driven squat slot has no stage rule
    assert_eq!(workout.exercises[0].stage, None);
    assert_eq!(workout.exercises[0].sets.len(), 3);
}

#[tokio::test]
async fn test_future_dated_max_waits_for_its_date() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;
    service
        .record_max(
            user,
            ids.bench,
            MaxKind::TrainingMax,
            300.0,
            Utc::now() + Duration::days(30),
        )
        .await
        .unwrap();

    let (workout, errors) = service
        .resolve_workout(ids.program_id, user, &ScheduleCoordinate::new(1, 2, 1))
        .await
        .unwrap();
    assert!(errors.is_empty());
    // Top ramp step is 100% of the current 225 training max
    assert!((workout.exercises[0].sets[4].weight - 225.0).abs() < 1e-9);

    let result = service
        .trigger_progression(
            user,
            ids.cycle_rule,
            ids.bench,
            TriggerContext::new(TriggerType::AfterCycle, day(1)),
        )
        .await
        .unwrap();
    let applied = result.applied().unwrap();
    assert!((applied.log.previous_value - 225.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_amrap_rule_falls_back_to_recorded_amrap_set() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;

    let error = service
        .trigger_progression(
            user,
            ids.amrap_rule,
            ids.bench,
            TriggerContext::new(TriggerType::AfterCycle, day(1)),
        )
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::MissingTriggerContext);

    let (session, _) = service.start_workout(user, day(1)).await.unwrap();
    let fired = service
        .record_set(
            user,
            session.id,
            LoggedSet {
                lift_id: ids.squat,
                target_reps: 5,
                actual_reps: 9,
                is_amrap: true,
            },
            day(1),
        )
        .await
        .unwrap();
    // A successful set with no failure streak changes nothing
    assert_eq!(fired.len(), 1);
    assert!(!fired[0].is_applied());

    let result = service
        .trigger_progression(
            user,
            ids.amrap_rule,
            ids.squat,
            TriggerContext::new(TriggerType::AfterCycle, day(2)),
        )
        .await
        .unwrap();
    let applied = result.applied().unwrap();
    assert_eq!(applied.log.context.amrap_reps, Some(9));
    assert!((applied.log.delta - 5.0).abs() < 1e-9);
    assert_eq!(training_max(&service, user, ids.squat).await, Some(365.0));
}

#[tokio::test]
async fn test_session_lifecycle_errors() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;

    let (session, events) = service.start_workout(user, day(1)).await.unwrap();
    assert_eq!(events.len(), 2);
    let error = service.start_workout(user, day(1)).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::SessionAlreadyInProgress);

    let abandoned = service.abandon_workout(user, session.id, day(1)).await.unwrap();
    assert_eq!(abandoned.status, WorkoutStatus::Abandoned);
    let state = service.enrollment(user).await.unwrap();
    assert_eq!(state.day_index_or_first(), 0);

    let error = service
        .record_set(user, session.id, missed(ids.squat), day(1))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidTransition);
    assert!(matches!(
        error.engine_error(),
        Some(EngineError::InvalidTransition { machine: StateMachineKind::Workout, .. })
    ));

    let error = service
        .complete_workout(user, SessionId::new(), day(1))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);

    // Another user's session is not reachable
    let stranger = enrolled_user(&service, &ids).await;
    let (theirs, _) = service.start_workout(stranger, day(1)).await.unwrap();
    let error = service
        .complete_workout(user, theirs.id, day(1))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);

    let (session, _) = service.start_workout(user, day(2)).await.unwrap();
    let report = service.complete_workout(user, session.id, day(2)).await.unwrap();
    assert_eq!(report.state.current_day_index, Some(1));
    assert_eq!(
        report.events,
        vec![ScheduleEvent::DayAdvanced {
            week_number: 1,
            day_index: 1,
        }]
    );
}

#[tokio::test]
async fn test_stale_enrollment_write_is_rejected() {
    let (service, ids) = wave_service();
    let user = enrolled_user(&service, &ids).await;
    let stale = service.enrollment(user).await.unwrap();

    let meet = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let planned = service.plan_meet(user, meet, day(1)).await.unwrap();
    assert_eq!(planned.meet.map(|plan| plan.meet_date), Some(meet));
    assert_eq!(planned.version, stale.version + 1);

    let error = service
        .store()
        .save_enrollment(&stale, stale.version)
        .await
        .unwrap_err();
    assert!(matches!(error, StoreError::VersionConflict { .. }));

    let report = service
        .advance_state(user, AdvanceKind::Week, day(2))
        .await
        .unwrap();
    assert_eq!(report.state.current_week, 2);
    assert!(report.progressions.is_empty());
}

#[tokio::test]
async fn test_named_transition_through_service() {
    let (service, _) = wave_service();
    assert_eq!(
        service
            .transition(StateMachineKind::Week, "IN_PROGRESS", "COMPLETED")
            .unwrap(),
        "COMPLETED"
    );
    let error = service
        .transition(StateMachineKind::Workout, "COMPLETED", "IN_PROGRESS")
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidTransition);
}
