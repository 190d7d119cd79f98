// ABOUTME: Progression rule engine applying triggers to reference maxes exactly once
// ABOUTME: Pure evaluation; the caller persists the log, new max, and bookkeeping it returns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Progression Rule Engine
//!
//! `ProgressionEngine::apply` evaluates one trigger for one (user, lift, progression).
//! The caller tells the engine whether the log key for the trigger already exists
//! (`already_applied`); a duplicate is reported as `Skipped`, never as an error.
//! The storage layer enforces the same key with a unique constraint, so a race
//! between two callers still applies the change once.
//!
//! Evaluation order:
//!
//! 1. duplicate trigger -> `Skipped(AlreadyApplied)`
//! 2. trigger the rule does not listen to -> `Skipped(TriggerNotHandled)`
//! 3. no current max -> `MissingReferenceMax`
//! 4. rule arithmetic

mod rules;

pub use rules::{active_stage, select_bucket};

use chrono::{DateTime, Utc};
use liftplan_core::constants::progression::MAX_DELOAD_PERCENT;
use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::ids::{LiftId, ProgressionLogId, UserId};
use liftplan_core::models::{
    FailureCounter, ProgressionDefinition, ProgressionLog, ProgressionRule, ReferenceMax,
    StageDefinition, TriggerContext, TriggerType, UserProgressionState,
};
use rules::{DeloadRule, Evaluation, StageRule};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Stage each lift is on, for lifts with a `STAGE` rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveStages {
    stages: HashMap<LiftId, StageDefinition>,
}

impl ActiveStages {
    /// No lifts staged
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the stage `state` selects in `rule` for `lift_id`.
    ///
    /// The first `STAGE` rule recorded for a lift wins. Returns whether the lift
    /// took this rule's stage.
    pub fn insert(
        &mut self,
        lift_id: LiftId,
        rule: &ProgressionRule,
        state: Option<&UserProgressionState>,
    ) -> bool {
        if self.stages.contains_key(&lift_id) {
            return false;
        }
        let Some(stage) = active_stage(rule, state) else {
            return false;
        };
        self.stages.insert(lift_id, stage.clone());
        true
    }

    /// Active stage of `lift_id`
    #[must_use]
    pub fn get(&self, lift_id: LiftId) -> Option<&StageDefinition> {
        self.stages.get(&lift_id)
    }

    /// Whether no lift is staged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Why a trigger changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The log key for this trigger already exists
    AlreadyApplied,
    /// The rule does not evaluate this trigger type
    TriggerNotHandled {
        /// Trigger received
        trigger: TriggerType,
    },
    /// AMRAP reps fell below every bucket
    InsufficientReps {
        /// Reps achieved
        reps: u32,
    },
    /// Success with no failure streak to clear
    NoChange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyApplied => write!(f, "progression already applied for this trigger"),
            Self::TriggerNotHandled { trigger } => write!(f, "rule does not handle {trigger}"),
            Self::InsufficientReps { reps } => {
                write!(f, "{reps} reps is below every progression bucket")
            }
            Self::NoChange => write!(f, "nothing to change"),
        }
    }
}

/// Everything the caller must persist after an applied progression
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedProgression {
    /// Log row; its key is the idempotency boundary
    pub log: ProgressionLog,
    /// New reference max row, when the value changed
    pub new_max: Option<ReferenceMax>,
    /// Updated failure counter (`DELOAD_ON_FAILURE`)
    pub failure_counter: Option<FailureCounter>,
    /// Updated stage state (`STAGE`)
    pub stage_state: Option<UserProgressionState>,
    /// The user should retest their one-rep max
    pub retest_required: bool,
}

/// Result of one trigger
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressionResult {
    /// The rule ran and produced records to persist
    Applied(Box<AppliedProgression>),
    /// Nothing to persist
    Skipped {
        /// Why
        reason: SkipReason,
    },
}

impl ProgressionResult {
    /// Whether the rule was applied
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Whether the trigger was skipped
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Applied records, if any
    #[must_use]
    pub fn applied(&self) -> Option<&AppliedProgression> {
        match self {
            Self::Applied(applied) => Some(applied.as_ref()),
            Self::Skipped { .. } => None,
        }
    }

    /// Skip reason, if skipped
    #[must_use]
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Applied(_) => None,
            Self::Skipped { reason } => Some(*reason),
        }
    }
}

/// One trigger for one (user, lift, progression) together with the user's current records
#[derive(Debug, Clone)]
pub struct ProgressionInput<'a> {
    /// Owner
    pub user_id: UserId,
    /// Lift progressed
    pub lift_id: LiftId,
    /// Rule
    pub definition: &'a ProgressionDefinition,
    /// Program-level replacement for the rule's increment
    pub increment_override: Option<f64>,
    /// Current value of the rule's max kind
    pub current_max: Option<f64>,
    /// Existing failure counter
    pub failure_counter: Option<&'a FailureCounter>,
    /// Existing stage state
    pub stage_state: Option<&'a UserProgressionState>,
    /// Whether the log key for this trigger already exists
    pub already_applied: bool,
    /// Trigger event
    pub context: &'a TriggerContext,
    /// Wall-clock time used for the log and any new max row
    pub applied_at: DateTime<Utc>,
}

impl<'a> ProgressionInput<'a> {
    /// Input with no current max or bookkeeping records
    #[must_use]
    pub const fn new(
        user_id: UserId,
        lift_id: LiftId,
        definition: &'a ProgressionDefinition,
        context: &'a TriggerContext,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            lift_id,
            definition,
            increment_override: None,
            current_max: None,
            failure_counter: None,
            stage_state: None,
            already_applied: false,
            context,
            applied_at,
        }
    }

    /// Set the current max
    #[must_use]
    pub const fn with_current_max(mut self, current_max: Option<f64>) -> Self {
        self.current_max = current_max;
        self
    }

    /// Set the increment override
    #[must_use]
    pub const fn with_increment_override(mut self, increment: Option<f64>) -> Self {
        self.increment_override = increment;
        self
    }

    /// Set the failure counter
    #[must_use]
    pub const fn with_failure_counter(mut self, counter: Option<&'a FailureCounter>) -> Self {
        self.failure_counter = counter;
        self
    }

    /// Set the stage state
    #[must_use]
    pub const fn with_stage_state(mut self, state: Option<&'a UserProgressionState>) -> Self {
        self.stage_state = state;
        self
    }

    /// Mark the trigger as a duplicate
    #[must_use]
    pub const fn already_applied(mut self, already_applied: bool) -> Self {
        self.already_applied = already_applied;
        self
    }
}

/// Stateless progression evaluator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionEngine {
    round_to: Option<f64>,
    max_deload_percent: f64,
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self {
            round_to: None,
            max_deload_percent: MAX_DELOAD_PERCENT,
        }
    }
}

impl ProgressionEngine {
    /// Engine with no rounding and the default deload cap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Round multiplicative reductions (deloads, resets) to this increment
    #[must_use]
    pub const fn with_round_to(mut self, round_to: Option<f64>) -> Self {
        self.round_to = round_to;
        self
    }

    /// Cap applied to every deload percentage
    #[must_use]
    pub const fn with_max_deload_percent(mut self, percent: f64) -> Self {
        self.max_deload_percent = percent;
        self
    }

    /// Evaluate one trigger
    ///
    /// # Errors
    ///
    /// - `MissingReferenceMax` when the rule's max kind has no current value
    /// - `MissingTriggerContext` when an `AMRAP_GUIDED` trigger lacks AMRAP reps
    /// - `Invariant` when stored stage state points past the rule's stage list
    pub fn apply(&self, input: &ProgressionInput<'_>) -> EngineResult<ProgressionResult> {
        let definition = input.definition;
        let rule = &definition.rule;
        let trigger = input.context.trigger_type;

        if input.already_applied {
            debug!(
                user_id = %input.user_id,
                lift_id = %input.lift_id,
                progression_id = %definition.id,
                %trigger,
                "duplicate trigger skipped"
            );
            return Ok(skipped(SkipReason::AlreadyApplied));
        }
        if !rule.listens_to(trigger) {
            return Ok(skipped(SkipReason::TriggerNotHandled { trigger }));
        }

        let max_kind = rule.max_kind();
        let previous = input.current_max.ok_or(EngineError::MissingReferenceMax {
            lift_id: input.lift_id,
            kind: max_kind,
        })?;

        let evaluation = self.evaluate(rule, input, previous)?;
        let outcome = match evaluation {
            Evaluation::Skip(reason) => return Ok(skipped(reason)),
            Evaluation::Apply(outcome) => outcome,
        };

        let log = ProgressionLog {
            id: ProgressionLogId::new(),
            user_id: input.user_id,
            progression_id: definition.id,
            lift_id: input.lift_id,
            max_kind,
            trigger_type: trigger,
            previous_value: previous,
            new_value: outcome.new_value,
            delta: outcome.new_value - previous,
            context: input.context.clone(),
            applied_at: input.applied_at,
        };
        let new_max = outcome.max_changed.then(|| {
            ReferenceMax::new(
                input.user_id,
                input.lift_id,
                max_kind,
                outcome.new_value,
                input.applied_at,
            )
        });

        info!(
            user_id = %input.user_id,
            lift_id = %input.lift_id,
            progression_id = %definition.id,
            progression_type = %rule.progression_type(),
            %trigger,
            previous,
            new = outcome.new_value,
            "progression applied"
        );

        Ok(ProgressionResult::Applied(Box::new(AppliedProgression {
            log,
            new_max,
            failure_counter: outcome.failure_counter,
            stage_state: outcome.stage_state,
            retest_required: outcome.retest_required,
        })))
    }

    fn evaluate(
        &self,
        rule: &ProgressionRule,
        input: &ProgressionInput<'_>,
        previous: f64,
    ) -> EngineResult<Evaluation> {
        match rule {
            ProgressionRule::Linear { increment, .. } | ProgressionRule::Cycle { increment, .. } => {
                Ok(rules::add_increment(
                    previous,
                    input.increment_override.unwrap_or(*increment),
                ))
            }
            ProgressionRule::AmrapGuided { buckets, .. } => {
                rules::amrap_guided(previous, buckets, input.context.amrap_reps)
            }
            ProgressionRule::Stage {
                stages,
                on_final_failure,
                reset_percent,
                ..
            } => {
                let state = input.stage_state.cloned().unwrap_or_else(|| {
                    UserProgressionState::new(input.user_id, input.lift_id, input.definition.id)
                });
                let stage_rule = StageRule {
                    stages,
                    on_final_failure: *on_final_failure,
                    reset_percent: *reset_percent,
                    round_to: self.round_to,
                };
                rules::stage_failure(previous, &stage_rule, state)
            }
            ProgressionRule::DeloadOnFailure {
                failure_threshold,
                deload_percent,
                ..
            } => {
                let counter = input.failure_counter.cloned().unwrap_or_else(|| {
                    FailureCounter::new(input.user_id, input.lift_id, input.definition.id)
                });
                let deload_rule = DeloadRule {
                    failure_threshold: *failure_threshold,
                    deload_percent: deload_percent.min(self.max_deload_percent),
                    round_to: self.round_to,
                };
                Ok(rules::deload_on_failure(
                    previous,
                    &deload_rule,
                    counter,
                    input.context.trigger_type,
                    input.context.triggered_at,
                ))
            }
        }
    }
}

const fn skipped(reason: SkipReason) -> ProgressionResult {
    ProgressionResult::Skipped { reason }
}

/// Trigger type for a logged set: short of target is a failure
#[must_use]
pub const fn classify_set(target_reps: u32, actual_reps: u32) -> TriggerType {
    if actual_reps < target_reps {
        TriggerType::OnFailure
    } else {
        TriggerType::AfterSet
    }
}

/// Trigger context for a logged set; AMRAP sets also report their reps as AMRAP reps
#[must_use]
pub fn set_trigger(
    target_reps: u32,
    actual_reps: u32,
    is_amrap: bool,
    triggered_at: DateTime<Utc>,
) -> TriggerContext {
    let context = TriggerContext::new(classify_set(target_reps, actual_reps), triggered_at)
        .with_set_reps(target_reps, actual_reps);
    if is_amrap {
        context.with_amrap_reps(actual_reps)
    } else {
        context
    }
}
