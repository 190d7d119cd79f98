// ABOUTME: Persistence collaborator traits for per-user training records
// ABOUTME: Reference maxes, progression bookkeeping, enrollments, and workout sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Storage
//!
//! The service layer reads and writes per-user records through these traits and
//! never shares mutable state between users. Two storage invariants carry the
//! correctness guarantees of the engine:
//!
//! - `insert_progression_log` rejects a second log with the same
//!   [`ProgressionLogKey`] with [`StoreError::UniqueViolation`]. This is what makes
//!   progression application exactly-once across processes.
//! - `save_enrollment` is a compare-and-swap on `UserProgramState::version`.

/// In-memory implementation backed by `DashMap`
pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use liftplan_core::ids::{EnrollmentId, LiftId, ProgressionId, SessionId, UserId};
use liftplan_core::models::{
    FailureCounter, ProgressionLog, ProgressionLogKey, ReferenceMax, UserProgramState,
    UserProgressionState, WorkoutSession,
};
use thiserror::Error;

/// Storage failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A row with the same unique key already exists
    #[error("{entity} already exists for key {key}")]
    UniqueViolation {
        /// Table or record kind
        entity: &'static str,
        /// Conflicting key
        key: String,
    },

    /// Record not found
    #[error("{entity} {id} not found")]
    NotFound {
        /// Table or record kind
        entity: &'static str,
        /// Requested identifier
        id: String,
    },

    /// Optimistic concurrency check failed
    #[error("version conflict: expected {expected}, found {found}")]
    VersionConflict {
        /// Version the writer read
        expected: u64,
        /// Version currently stored
        found: u64,
    },

    /// Backend failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only reference max history
#[async_trait]
pub trait MaxRepository: Send + Sync {
    /// Append a reference max row
    async fn insert_reference_max(&self, max: ReferenceMax) -> StoreResult<()>;

    /// Every row for a user, in insertion order
    async fn list_reference_maxes(&self, user_id: UserId) -> StoreResult<Vec<ReferenceMax>>;
}

/// Progression logs, failure counters, stage state, and recent AMRAP results
#[async_trait]
pub trait ProgressionRepository: Send + Sync {
    /// Whether a log with this key exists
    async fn progression_log_exists(&self, key: &ProgressionLogKey) -> StoreResult<bool>;

    /// Insert a log; fails with `UniqueViolation` when the key is taken
    async fn insert_progression_log(&self, log: ProgressionLog) -> StoreResult<()>;

    /// Logs for a user, optionally for one lift, oldest first
    async fn list_progression_logs(
        &self,
        user_id: UserId,
        lift_id: Option<LiftId>,
    ) -> StoreResult<Vec<ProgressionLog>>;

    /// Failure counter for a (user, lift, progression)
    async fn get_failure_counter(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        progression_id: ProgressionId,
    ) -> StoreResult<Option<FailureCounter>>;

    /// Insert or replace a failure counter
    async fn save_failure_counter(&self, counter: FailureCounter) -> StoreResult<()>;

    /// Stage state for a (user, lift, progression)
    async fn get_progression_state(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        progression_id: ProgressionId,
    ) -> StoreResult<Option<UserProgressionState>>;

    /// Every stage state a user holds for a lift
    async fn list_progression_states(
        &self,
        user_id: UserId,
        lift_id: LiftId,
    ) -> StoreResult<Vec<UserProgressionState>>;

    /// Insert or replace a stage state
    async fn save_progression_state(&self, state: UserProgressionState) -> StoreResult<()>;

    /// Remember the reps of the latest AMRAP set for a lift
    async fn record_amrap_result(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        reps: u32,
        recorded_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Reps of the latest AMRAP set for a lift
    async fn latest_amrap_result(&self, user_id: UserId, lift_id: LiftId)
        -> StoreResult<Option<u32>>;
}

/// Enrollments and workout sessions
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// The user's enrollment, if any
    async fn get_enrollment(&self, user_id: UserId) -> StoreResult<Option<UserProgramState>>;

    /// Store a new enrollment, replacing a quit one; fails with `UniqueViolation`
    /// while the user has an enrollment that has not quit
    async fn create_enrollment(&self, state: UserProgramState) -> StoreResult<()>;

    /// Replace the enrollment if its stored version is still `expected_version`
    async fn save_enrollment(
        &self,
        state: &UserProgramState,
        expected_version: u64,
    ) -> StoreResult<()>;

    /// Session by id
    async fn get_session(&self, session_id: SessionId) -> StoreResult<Option<WorkoutSession>>;

    /// The enrollment's in-progress session, if any
    async fn open_session(&self, enrollment_id: EnrollmentId)
        -> StoreResult<Option<WorkoutSession>>;

    /// Insert or replace a session
    async fn save_session(&self, session: WorkoutSession) -> StoreResult<()>;
}

/// Everything the training service needs from storage
pub trait TrainingStore: MaxRepository + ProgressionRepository + EnrollmentRepository {}

impl<T> TrainingStore for T where T: MaxRepository + ProgressionRepository + EnrollmentRepository {}
