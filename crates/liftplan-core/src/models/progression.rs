// ABOUTME: Progression rule definitions, trigger events, and per-user progression bookkeeping
// ABOUTME: Defines the log uniqueness key that makes progression application exactly-once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::MaxKind;
use crate::constants::progression::MAX_DELOAD_PERCENT;
use crate::errors::ValidationError;
use crate::ids::{LiftId, ProgressionId, ProgressionLogId, SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event that may cause a progression rule to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// A workout session was completed
    AfterSession,
    /// A training week was completed
    AfterWeek,
    /// A cycle iteration was completed
    AfterCycle,
    /// A set was logged at or above target
    AfterSet,
    /// A set fell short of its target
    OnFailure,
}

impl TriggerType {
    /// Whether the event reports a failed performance
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::OnFailure)
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AfterSession => write!(f, "AFTER_SESSION"),
            Self::AfterWeek => write!(f, "AFTER_WEEK"),
            Self::AfterCycle => write!(f, "AFTER_CYCLE"),
            Self::AfterSet => write!(f, "AFTER_SET"),
            Self::OnFailure => write!(f, "ON_FAILURE"),
        }
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AFTER_SESSION" => Ok(Self::AfterSession),
            "AFTER_WEEK" => Ok(Self::AfterWeek),
            "AFTER_CYCLE" => Ok(Self::AfterCycle),
            "AFTER_SET" => Ok(Self::AfterSet),
            "ON_FAILURE" => Ok(Self::OnFailure),
            _ => Err(format!("Unknown trigger type: {s}")),
        }
    }
}

/// Inclusive rep range mapped to an increment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepBucket {
    /// Lowest rep count in the bucket
    pub min_reps: u32,
    /// Highest rep count in the bucket
    pub max_reps: u32,
    /// Increment applied when the bucket is selected
    pub increment: f64,
}

impl RepBucket {
    /// Whether `reps` falls in this bucket
    #[must_use]
    pub const fn contains(&self, reps: u32) -> bool {
        reps >= self.min_reps && reps <= self.max_reps
    }
}

/// One stage of a staged progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Display name (e.g. "5x3")
    pub name: String,
    /// Sets while the stage is active
    pub sets: u32,
    /// Reps per set while the stage is active
    pub reps: u32,
    /// Total reps the stage targets, when it differs from `sets * reps`
    #[serde(default)]
    pub target_volume: Option<u32>,
}

/// What happens when the last stage also fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalFailureAction {
    /// Keep the max and flag that the user should retest their 1RM
    #[serde(rename = "RETEST_1RM")]
    Retest1Rm,
    /// Return the max to the checkpoint recorded when the round began, or reduce it
    /// by the rule's reset percentage when it has not risen since
    ResetWeight,
}

/// Rule type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressionType {
    /// Add an increment on every matching trigger
    Linear,
    /// Add an increment once per cycle
    Cycle,
    /// Increment selected from AMRAP performance
    AmrapGuided,
    /// Change rep scheme on failure, reset after the last stage
    Stage,
    /// Count failures and deload at a threshold
    DeloadOnFailure,
}

impl fmt::Display for ProgressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "LINEAR"),
            Self::Cycle => write!(f, "CYCLE"),
            Self::AmrapGuided => write!(f, "AMRAP_GUIDED"),
            Self::Stage => write!(f, "STAGE"),
            Self::DeloadOnFailure => write!(f, "DELOAD_ON_FAILURE"),
        }
    }
}

const fn default_max_kind() -> MaxKind {
    MaxKind::TrainingMax
}

const fn default_linear_trigger() -> TriggerType {
    TriggerType::AfterSession
}

const fn default_amrap_trigger() -> TriggerType {
    TriggerType::AfterCycle
}

/// Typed parameters for each rule type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressionRule {
    /// `new = previous + increment` on `trigger`
    Linear {
        /// Amount added
        increment: f64,
        /// Trigger listened to
        #[serde(default = "default_linear_trigger")]
        trigger: TriggerType,
        /// Max kind progressed
        #[serde(default = "default_max_kind")]
        max_kind: MaxKind,
    },
    /// `new = previous + increment` after each cycle
    Cycle {
        /// Amount added
        increment: f64,
        /// Max kind progressed
        #[serde(default = "default_max_kind")]
        max_kind: MaxKind,
    },
    /// Increment chosen from the bucket containing the AMRAP rep count
    AmrapGuided {
        /// Ordered, non-overlapping rep buckets
        buckets: Vec<RepBucket>,
        /// `AFTER_CYCLE` or `AFTER_SESSION`
        #[serde(default = "default_amrap_trigger")]
        trigger: TriggerType,
        /// Max kind progressed
        #[serde(default = "default_max_kind")]
        max_kind: MaxKind,
    },
    /// Advance through rep schemes on failure
    Stage {
        /// Stages in order
        stages: Vec<StageDefinition>,
        /// Action after the last stage fails
        on_final_failure: FinalFailureAction,
        /// Reduction used by `RESET_WEIGHT` when the max is not above the checkpoint
        #[serde(default)]
        reset_percent: Option<f64>,
        /// Max kind affected by resets
        #[serde(default = "default_max_kind")]
        max_kind: MaxKind,
    },
    /// Multiplicative deload after consecutive failures
    DeloadOnFailure {
        /// Failures needed before deloading
        failure_threshold: u32,
        /// Reduction in percent (10 = max * 0.9)
        deload_percent: f64,
        /// Max kind deloaded
        #[serde(default = "default_max_kind")]
        max_kind: MaxKind,
    },
}

impl ProgressionRule {
    /// Rule type discriminator
    #[must_use]
    pub const fn progression_type(&self) -> ProgressionType {
        match self {
            Self::Linear { .. } => ProgressionType::Linear,
            Self::Cycle { .. } => ProgressionType::Cycle,
            Self::AmrapGuided { .. } => ProgressionType::AmrapGuided,
            Self::Stage { .. } => ProgressionType::Stage,
            Self::DeloadOnFailure { .. } => ProgressionType::DeloadOnFailure,
        }
    }

    /// Max kind the rule reads and writes
    #[must_use]
    pub const fn max_kind(&self) -> MaxKind {
        match self {
            Self::Linear { max_kind, .. }
            | Self::Cycle { max_kind, .. }
            | Self::AmrapGuided { max_kind, .. }
            | Self::Stage { max_kind, .. }
            | Self::DeloadOnFailure { max_kind, .. } => *max_kind,
        }
    }

    /// Whether `trigger` is an event this rule evaluates
    #[must_use]
    pub fn listens_to(&self, trigger: TriggerType) -> bool {
        match self {
            Self::Linear { trigger: own, .. } | Self::AmrapGuided { trigger: own, .. } => {
                *own == trigger
            }
            Self::Cycle { .. } => trigger == TriggerType::AfterCycle,
            Self::Stage { .. } => trigger.is_failure(),
            Self::DeloadOnFailure { .. } => {
                matches!(trigger, TriggerType::OnFailure | TriggerType::AfterSet)
            }
        }
    }

    /// Check parameter ranges
    pub fn validate_into(&self, path: &str, errors: &mut ValidationError) {
        match self {
            Self::Linear { increment, .. } | Self::Cycle { increment, .. } => {
                if !increment.is_finite() {
                    errors.push(format!("{path}.increment"), "must be a finite number");
                }
            }
            Self::AmrapGuided {
                buckets, trigger, ..
            } => {
                if !matches!(trigger, TriggerType::AfterCycle | TriggerType::AfterSession) {
                    errors.push(
                        format!("{path}.trigger"),
                        format!("must be AFTER_CYCLE or AFTER_SESSION, got {trigger}"),
                    );
                }
                validate_buckets(buckets, path, errors);
            }
            Self::Stage {
                stages,
                reset_percent,
                ..
            } => {
                if stages.is_empty() {
                    errors.push(format!("{path}.stages"), "needs at least one stage");
                }
                for (index, stage) in stages.iter().enumerate() {
                    if stage.sets == 0 || stage.reps == 0 {
                        errors.push(
                            format!("{path}.stages[{index}]"),
                            "sets and reps must be at least 1",
                        );
                    }
                }
                if let Some(percent) = reset_percent {
                    if !(0.0..MAX_DELOAD_PERCENT).contains(percent) {
                        errors.push(
                            format!("{path}.reset_percent"),
                            format!("must be in [0, {MAX_DELOAD_PERCENT}), got {percent}"),
                        );
                    }
                }
            }
            Self::DeloadOnFailure {
                failure_threshold,
                deload_percent,
                ..
            } => {
                if *failure_threshold == 0 {
                    errors.push(format!("{path}.failure_threshold"), "must be at least 1");
                }
                if !(*deload_percent > 0.0 && *deload_percent <= MAX_DELOAD_PERCENT) {
                    errors.push(
                        format!("{path}.deload_percent"),
                        format!("must be in (0, {MAX_DELOAD_PERCENT}], got {deload_percent}"),
                    );
                }
            }
        }
    }
}

fn validate_buckets(buckets: &[RepBucket], path: &str, errors: &mut ValidationError) {
    if buckets.is_empty() {
        errors.push(format!("{path}.buckets"), "needs at least one rep bucket");
    }
    for (index, bucket) in buckets.iter().enumerate() {
        if bucket.min_reps > bucket.max_reps {
            errors.push(
                format!("{path}.buckets[{index}]"),
                format!("min_reps {} exceeds max_reps {}", bucket.min_reps, bucket.max_reps),
            );
        }
        if !bucket.increment.is_finite() {
            errors.push(format!("{path}.buckets[{index}].increment"), "must be finite");
        }
    }
    for (index, pair) in buckets.windows(2).enumerate() {
        if pair[1].min_reps <= pair[0].max_reps {
            errors.push(
                format!("{path}.buckets[{}]", index + 1),
                "buckets must be ordered and non-overlapping",
            );
        }
    }
}

/// A named progression rule in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionDefinition {
    /// Unique identifier
    pub id: ProgressionId,
    /// Display name
    pub name: String,
    /// Typed parameters
    pub rule: ProgressionRule,
}

/// Context carried by a trigger event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerContext {
    /// Event type
    pub trigger_type: TriggerType,
    /// Timestamp identifying the logical period (part of the idempotency key)
    pub triggered_at: DateTime<Utc>,
    /// Reps achieved on the AMRAP set, when relevant
    #[serde(default)]
    pub amrap_reps: Option<u32>,
    /// Target reps of the set that produced the event
    #[serde(default)]
    pub target_reps: Option<u32>,
    /// Reps actually performed
    #[serde(default)]
    pub actual_reps: Option<u32>,
    /// Session that produced the event
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Week number the event belongs to
    #[serde(default)]
    pub week_number: Option<u32>,
    /// Cycle iteration the event belongs to
    #[serde(default)]
    pub cycle_iteration: Option<u32>,
}

impl TriggerContext {
    /// Create a context with only the trigger and period timestamp
    #[must_use]
    pub const fn new(trigger_type: TriggerType, triggered_at: DateTime<Utc>) -> Self {
        Self {
            trigger_type,
            triggered_at,
            amrap_reps: None,
            target_reps: None,
            actual_reps: None,
            session_id: None,
            week_number: None,
            cycle_iteration: None,
        }
    }

    /// Attach AMRAP reps
    #[must_use]
    pub const fn with_amrap_reps(mut self, reps: u32) -> Self {
        self.amrap_reps = Some(reps);
        self
    }

    /// Attach target and actual reps of a logged set
    #[must_use]
    pub const fn with_set_reps(mut self, target: u32, actual: u32) -> Self {
        self.target_reps = Some(target);
        self.actual_reps = Some(actual);
        self
    }

    /// Attach the originating session
    #[must_use]
    pub const fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attach schedule coordinates
    #[must_use]
    pub const fn with_schedule(mut self, cycle_iteration: u32, week_number: u32) -> Self {
        self.cycle_iteration = Some(cycle_iteration);
        self.week_number = Some(week_number);
        self
    }
}

/// Uniqueness key of a progression log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressionLogKey {
    /// Owner
    pub user_id: UserId,
    /// Rule
    pub progression_id: ProgressionId,
    /// Lift
    pub lift_id: LiftId,
    /// Trigger type
    pub trigger_type: TriggerType,
    /// Logical period timestamp
    pub triggered_at: DateTime<Utc>,
}

/// Append-only record of an applied progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionLog {
    /// Row identifier
    pub id: ProgressionLogId,
    /// Owner
    pub user_id: UserId,
    /// Rule applied
    pub progression_id: ProgressionId,
    /// Lift affected
    pub lift_id: LiftId,
    /// Max kind affected
    pub max_kind: MaxKind,
    /// Trigger type
    pub trigger_type: TriggerType,
    /// Value before
    pub previous_value: f64,
    /// Value after
    pub new_value: f64,
    /// `new_value - previous_value`
    pub delta: f64,
    /// Trigger context
    pub context: TriggerContext,
    /// Wall-clock time the entry was written
    pub applied_at: DateTime<Utc>,
}

impl ProgressionLog {
    /// Uniqueness key
    #[must_use]
    pub const fn key(&self) -> ProgressionLogKey {
        ProgressionLogKey {
            user_id: self.user_id,
            progression_id: self.progression_id,
            lift_id: self.lift_id,
            trigger_type: self.trigger_type,
            triggered_at: self.context.triggered_at,
        }
    }
}

/// Consecutive failure tracking per (user, lift, progression)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounter {
    /// Owner
    pub user_id: UserId,
    /// Lift
    pub lift_id: LiftId,
    /// Rule
    pub progression_id: ProgressionId,
    /// Failures since the last success or deload
    pub consecutive_failures: u32,
    /// Last successful trigger
    pub last_success_at: Option<DateTime<Utc>>,
    /// Last failed trigger
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl FailureCounter {
    /// Fresh counter at zero
    #[must_use]
    pub const fn new(user_id: UserId, lift_id: LiftId, progression_id: ProgressionId) -> Self {
        Self {
            user_id,
            lift_id,
            progression_id,
            consecutive_failures: 0,
            last_success_at: None,
            last_failure_at: None,
        }
    }
}

/// Stage-specific state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageData {
    /// Max value recorded by the first failure of the current round; `None`
    /// between rounds
    #[serde(default)]
    pub checkpoint_value: Option<f64>,
    /// The final stage has already failed once this round
    #[serde(default)]
    pub final_stage_failed: bool,
    /// Set after `RETEST_1RM` until a new max is entered
    #[serde(default)]
    pub retest_pending: bool,
    /// Additional rule-specific fields
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Active stage per (user, lift, progression)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgressionState {
    /// Owner
    pub user_id: UserId,
    /// Lift
    pub lift_id: LiftId,
    /// Rule
    pub progression_id: ProgressionId,
    /// Index into the rule's stage list
    pub current_stage: usize,
    /// Stage-specific state
    #[serde(default)]
    pub stage_data: StageData,
}

impl UserProgressionState {
    /// State at stage 0
    #[must_use]
    pub fn new(user_id: UserId, lift_id: LiftId, progression_id: ProgressionId) -> Self {
        Self {
            user_id,
            lift_id,
            progression_id,
            current_stage: 0,
            stage_data: StageData::default(),
        }
    }
}
