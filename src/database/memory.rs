// ABOUTME: In-memory training store using sharded concurrent maps
// ABOUTME: Enforces the progression log unique key and enrollment version checks atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{
    EnrollmentRepository, MaxRepository, ProgressionRepository, StoreError, StoreResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use liftplan_core::ids::{EnrollmentId, LiftId, ProgressionId, SessionId, UserId};
use liftplan_core::models::{
    EnrollmentStatus, FailureCounter, ProgressionLog, ProgressionLogKey, ReferenceMax,
    UserProgramState, UserProgressionState, WorkoutSession, WorkoutStatus,
};
use tracing::debug;

type ProgressionKey = (UserId, LiftId, ProgressionId);

/// Process-local store.
///
/// Every map is a `DashMap`, so writes lock one shard rather than the whole store.
/// Uniqueness checks use the entry API, which holds the shard lock between the
/// check and the insert.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    maxes: DashMap<UserId, Vec<ReferenceMax>>,
    logs: DashMap<ProgressionLogKey, ProgressionLog>,
    failure_counters: DashMap<ProgressionKey, FailureCounter>,
    progression_states: DashMap<ProgressionKey, UserProgressionState>,
    amrap_results: DashMap<(UserId, LiftId), (u32, DateTime<Utc>)>,
    enrollments: DashMap<UserId, UserProgramState>,
    sessions: DashMap<SessionId, WorkoutSession>,
}

impl InMemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored progression logs
    #[must_use]
    pub fn progression_log_count(&self) -> usize {
        self.logs.len()
    }
}

#[async_trait]
impl MaxRepository for InMemoryStore {
    async fn insert_reference_max(&self, max: ReferenceMax) -> StoreResult<()> {
        debug!(user_id = %max.user_id, lift_id = %max.lift_id, kind = %max.kind, value = max.value, "reference max stored");
        self.maxes.entry(max.user_id).or_default().push(max);
        Ok(())
    }

    async fn list_reference_maxes(&self, user_id: UserId) -> StoreResult<Vec<ReferenceMax>> {
        Ok(self
            .maxes
            .get(&user_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProgressionRepository for InMemoryStore {
    async fn progression_log_exists(&self, key: &ProgressionLogKey) -> StoreResult<bool> {
        Ok(self.logs.contains_key(key))
    }

    async fn insert_progression_log(&self, log: ProgressionLog) -> StoreResult<()> {
        match self.logs.entry(log.key()) {
            Entry::Occupied(existing) => Err(StoreError::UniqueViolation {
                entity: "progression_log",
                key: format!(
                    "{}/{}/{}/{}@{}",
                    existing.key().user_id,
                    existing.key().progression_id,
                    existing.key().lift_id,
                    existing.key().trigger_type,
                    existing.key().triggered_at.to_rfc3339()
                ),
            }),
            Entry::Vacant(slot) => {
                slot.insert(log);
                Ok(())
            }
        }
    }

    async fn list_progression_logs(
        &self,
        user_id: UserId,
        lift_id: Option<LiftId>,
    ) -> StoreResult<Vec<ProgressionLog>> {
        let mut logs: Vec<ProgressionLog> = self
            .logs
            .iter()
            .filter(|entry| {
                entry.user_id == user_id && lift_id.is_none_or(|lift| entry.lift_id == lift)
            })
            .map(|entry| entry.value().clone())
            .collect();
        logs.sort_by_key(|log| (log.applied_at, log.context.triggered_at));
        Ok(logs)
    }

    async fn get_failure_counter(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        progression_id: ProgressionId,
    ) -> StoreResult<Option<FailureCounter>> {
        Ok(self
            .failure_counters
            .get(&(user_id, lift_id, progression_id))
            .map(|counter| counter.value().clone()))
    }

    async fn save_failure_counter(&self, counter: FailureCounter) -> StoreResult<()> {
        self.failure_counters.insert(
            (counter.user_id, counter.lift_id, counter.progression_id),
            counter,
        );
        Ok(())
    }

    async fn get_progression_state(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        progression_id: ProgressionId,
    ) -> StoreResult<Option<UserProgressionState>> {
        Ok(self
            .progression_states
            .get(&(user_id, lift_id, progression_id))
            .map(|state| state.value().clone()))
    }

    async fn list_progression_states(
        &self,
        user_id: UserId,
        lift_id: LiftId,
    ) -> StoreResult<Vec<UserProgressionState>> {
        Ok(self
            .progression_states
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.lift_id == lift_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn save_progression_state(&self, state: UserProgressionState) -> StoreResult<()> {
        self.progression_states
            .insert((state.user_id, state.lift_id, state.progression_id), state);
        Ok(())
    }

    async fn record_amrap_result(
        &self,
        user_id: UserId,
        lift_id: LiftId,
        reps: u32,
        recorded_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.amrap_results
            .insert((user_id, lift_id), (reps, recorded_at));
        Ok(())
    }

    async fn latest_amrap_result(
        &self,
        user_id: UserId,
        lift_id: LiftId,
    ) -> StoreResult<Option<u32>> {
        Ok(self
            .amrap_results
            .get(&(user_id, lift_id))
            .map(|result| result.value().0))
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryStore {
    async fn get_enrollment(&self, user_id: UserId) -> StoreResult<Option<UserProgramState>> {
        Ok(self
            .enrollments
            .get(&user_id)
            .map(|state| state.value().clone()))
    }

    async fn create_enrollment(&self, state: UserProgramState) -> StoreResult<()> {
        match self.enrollments.entry(state.user_id) {
            Entry::Occupied(existing)
                if existing.get().statuses.enrollment != EnrollmentStatus::Quit =>
            {
                Err(StoreError::UniqueViolation {
                    entity: "enrollment",
                    key: state.user_id.to_string(),
                })
            }
            Entry::Occupied(mut existing) => {
                existing.insert(state);
                Ok(())
            }
            Entry::Vacant(slot) => {
                slot.insert(state);
                Ok(())
            }
        }
    }

    async fn save_enrollment(
        &self,
        state: &UserProgramState,
        expected_version: u64,
    ) -> StoreResult<()> {
        let mut stored = self
            .enrollments
            .get_mut(&state.user_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "enrollment",
                id: state.user_id.to_string(),
            })?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: stored.version,
            });
        }
        *stored = state.clone();
        Ok(())
    }

    async fn get_session(&self, session_id: SessionId) -> StoreResult<Option<WorkoutSession>> {
        Ok(self
            .sessions
            .get(&session_id)
            .map(|session| session.value().clone()))
    }

    async fn open_session(
        &self,
        enrollment_id: EnrollmentId,
    ) -> StoreResult<Option<WorkoutSession>> {
        Ok(self
            .sessions
            .iter()
            .find(|entry| {
                entry.enrollment_id == enrollment_id && entry.status == WorkoutStatus::InProgress
            })
            .map(|entry| entry.value().clone()))
    }

    async fn save_session(&self, session: WorkoutSession) -> StoreResult<()> {
        self.sessions.insert(session.id, session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftplan_core::ids::{ProgramId, ProgressionLogId};
    use liftplan_core::models::{MaxKind, TriggerContext, TriggerType};

    fn log(user_id: UserId, lift_id: LiftId, at: DateTime<Utc>) -> ProgressionLog {
        ProgressionLog {
            id: ProgressionLogId::new(),
            user_id,
            progression_id: ProgressionId::new(),
            lift_id,
            max_kind: MaxKind::TrainingMax,
            trigger_type: TriggerType::AfterSession,
            previous_value: 100.0,
            new_value: 105.0,
            delta: 5.0,
            context: TriggerContext::new(TriggerType::AfterSession, at),
            applied_at: at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_log_key_rejected() {
        let store = InMemoryStore::new();
        let first = log(UserId::new(), LiftId::new(), Utc::now());
        let mut second = first.clone();
        second.id = ProgressionLogId::new();

        assert!(store.insert_progression_log(first).await.is_ok());
        assert!(matches!(
            store.insert_progression_log(second).await,
            Err(StoreError::UniqueViolation { .. })
        ));
        assert_eq!(store.progression_log_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_enrollment_write_rejected() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let state = UserProgramState::new(UserId::new(), ProgramId::new(), now);
        assert!(store.create_enrollment(state.clone()).await.is_ok());

        let mut first = state.clone();
        first.touch(now);
        assert!(store.save_enrollment(&first, 0).await.is_ok());

        let mut stale = state;
        stale.touch(now);
        assert_eq!(
            store.save_enrollment(&stale, 0).await,
            Err(StoreError::VersionConflict {
                expected: 0,
                found: 1
            })
        );
    }
}
