// ABOUTME: Per-type progression arithmetic: linear, cycle, AMRAP buckets, stages, failure deloads
// ABOUTME: Each function maps a previous value and per-user bookkeeping to an outcome or a skip
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::SkipReason;
use crate::rounding::round_to_increment;
use chrono::{DateTime, Utc};
use liftplan_core::constants::progression::DEFAULT_RESET_PERCENT;
use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::models::{
    FailureCounter, FinalFailureAction, ProgressionRule, RepBucket, StageDefinition, TriggerType,
    UserProgressionState,
};

/// What a rule decided for one trigger
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Apply(RuleOutcome),
    Skip(SkipReason),
}

/// Values a rule produced
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub new_value: f64,
    pub max_changed: bool,
    pub failure_counter: Option<FailureCounter>,
    pub stage_state: Option<UserProgressionState>,
    pub retest_required: bool,
}

impl RuleOutcome {
    const fn max_only(new_value: f64) -> Self {
        Self {
            new_value,
            max_changed: true,
            failure_counter: None,
            stage_state: None,
            retest_required: false,
        }
    }
}

/// Bucket for an AMRAP rep count.
///
/// The bucket containing `reps` wins. Reps above the top bucket's max use the top
/// bucket; reps below every bucket (or in a gap between buckets) select nothing.
#[must_use]
pub fn select_bucket(buckets: &[RepBucket], reps: u32) -> Option<&RepBucket> {
    if let Some(bucket) = buckets.iter().find(|bucket| bucket.contains(reps)) {
        return Some(bucket);
    }
    buckets
        .iter()
        .max_by_key(|bucket| bucket.max_reps)
        .filter(|top| reps > top.max_reps)
}

/// Stage the user is currently on for a `STAGE` rule
#[must_use]
pub fn active_stage<'a>(
    rule: &'a ProgressionRule,
    state: Option<&UserProgressionState>,
) -> Option<&'a StageDefinition> {
    match rule {
        ProgressionRule::Stage { stages, .. } => {
            stages.get(state.map_or(0, |state| state.current_stage))
        }
        _ => None,
    }
}

pub fn add_increment(previous: f64, increment: f64) -> Evaluation {
    Evaluation::Apply(RuleOutcome::max_only(previous + increment))
}

pub fn amrap_guided(
    previous: f64,
    buckets: &[RepBucket],
    amrap_reps: Option<u32>,
) -> EngineResult<Evaluation> {
    let reps = amrap_reps.ok_or(EngineError::MissingTriggerContext {
        field: "amrap_reps",
    })?;
    Ok(select_bucket(buckets, reps).map_or(
        Evaluation::Skip(SkipReason::InsufficientReps { reps }),
        |bucket| add_increment(previous, bucket.increment),
    ))
}

pub struct StageRule<'a> {
    pub stages: &'a [StageDefinition],
    pub on_final_failure: FinalFailureAction,
    pub reset_percent: Option<f64>,
    pub round_to: Option<f64>,
}

/// Failure under a `STAGE` rule.
///
/// The first failure of a round records the current max as the round's
/// checkpoint. Each failure moves to the next stage; the final stage takes one
/// failure while active and runs the final action on the next, which also ends
/// the round and returns to stage 0.
pub fn stage_failure(
    previous: f64,
    rule: &StageRule<'_>,
    mut state: UserProgressionState,
) -> EngineResult<Evaluation> {
    let stage_count = rule.stages.len();
    if state.current_stage >= stage_count {
        return Err(EngineError::Invariant(format!(
            "stage index {} out of range for {stage_count} stages",
            state.current_stage
        )));
    }
    if state.stage_data.checkpoint_value.is_none() {
        state.stage_data.checkpoint_value = Some(previous);
    }

    let on_final_stage = state.current_stage + 1 == stage_count;
    if !on_final_stage || !state.stage_data.final_stage_failed {
        if on_final_stage {
            state.stage_data.final_stage_failed = true;
        } else {
            state.current_stage += 1;
        }
        return Ok(Evaluation::Apply(RuleOutcome {
            new_value: previous,
            max_changed: false,
            failure_counter: None,
            stage_state: Some(state),
            retest_required: false,
        }));
    }

    state.current_stage = 0;
    state.stage_data.final_stage_failed = false;
    let checkpoint = state.stage_data.checkpoint_value.take();
    let outcome = match rule.on_final_failure {
        FinalFailureAction::Retest1Rm => {
            state.stage_data.retest_pending = true;
            RuleOutcome {
                new_value: previous,
                max_changed: false,
                failure_counter: None,
                stage_state: Some(state),
                retest_required: true,
            }
        }
        FinalFailureAction::ResetWeight => {
            let new_value = match checkpoint {
                Some(value) if value < previous => value,
                _ => {
                    let reset_percent = rule.reset_percent.unwrap_or(DEFAULT_RESET_PERCENT);
                    round_to_increment(previous * (1.0 - reset_percent / 100.0), rule.round_to)
                }
            };
            state.stage_data.retest_pending = false;
            RuleOutcome {
                new_value,
                max_changed: true,
                failure_counter: None,
                stage_state: Some(state),
                retest_required: false,
            }
        }
    };
    Ok(Evaluation::Apply(outcome))
}

pub struct DeloadRule {
    pub failure_threshold: u32,
    pub deload_percent: f64,
    pub round_to: Option<f64>,
}

/// Count failures, deload at the threshold, and clear the streak on a successful set
pub fn deload_on_failure(
    previous: f64,
    rule: &DeloadRule,
    mut counter: FailureCounter,
    trigger: TriggerType,
    triggered_at: DateTime<Utc>,
) -> Evaluation {
    if !trigger.is_failure() {
        if counter.consecutive_failures == 0 {
            return Evaluation::Skip(SkipReason::NoChange);
        }
        counter.consecutive_failures = 0;
        counter.last_success_at = Some(triggered_at);
        return Evaluation::Apply(RuleOutcome {
            new_value: previous,
            max_changed: false,
            failure_counter: Some(counter),
            stage_state: None,
            retest_required: false,
        });
    }

    counter.consecutive_failures += 1;
    counter.last_failure_at = Some(triggered_at);
    if counter.consecutive_failures < rule.failure_threshold {
        return Evaluation::Apply(RuleOutcome {
            new_value: previous,
            max_changed: false,
            failure_counter: Some(counter),
            stage_state: None,
            retest_required: false,
        });
    }

    counter.consecutive_failures = 0;
    let new_value = round_to_increment(
        previous * (1.0 - rule.deload_percent / 100.0),
        rule.round_to,
    );
    Evaluation::Apply(RuleOutcome {
        new_value,
        max_changed: true,
        failure_counter: Some(counter),
        stage_state: None,
        retest_required: false,
    })
}
