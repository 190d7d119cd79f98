// ABOUTME: Engine error taxonomy with stable error codes and recoverability hints
// ABOUTME: Every failure in the engine is a returned value; nothing here aborts the process
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Engine Error Types
//!
//! - `ErrorCode` - stable, serializable codes grouped in numeric ranges
//! - `EngineError` - the error enum returned by resolution, progression, and state
//!   machine operations
//! - `ValidationError` - a collection of catalog defects reported together

mod validation;

pub use validation::{ValidationError, ValidationIssue};

use crate::ids::{LiftId, PrescriptionId, SessionId};
use crate::models::{MaxKind, StateMachineKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Resolution (1000-1999)
    /// A reference max needed for a load calculation is absent
    #[serde(rename = "MISSING_REFERENCE_MAX")]
    MissingReferenceMax = 1000,
    /// A lookup table has no entry for the requested coordinate
    #[serde(rename = "LOOKUP_MISS")]
    LookupMiss = 1001,
    /// A set scheme produced no sets for the active coordinate
    #[serde(rename = "EMPTY_SCHEME")]
    EmptyScheme = 1002,

    // State (2000-2999)
    /// Status change not present in the state machine graph
    #[serde(rename = "INVALID_TRANSITION")]
    InvalidTransition = 2000,
    /// Another workout session is still open
    #[serde(rename = "SESSION_IN_PROGRESS")]
    SessionAlreadyInProgress = 2001,
    /// Enrollment is not in a status that allows the operation
    #[serde(rename = "ENROLLMENT_NOT_ACTIVE")]
    EnrollmentNotActive = 2002,

    // Validation (3000-3999)
    /// Malformed catalog or request data
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError = 3000,
    /// A trigger was missing context required by the rule
    #[serde(rename = "MISSING_TRIGGER_CONTEXT")]
    MissingTriggerContext = 3001,

    // Resources (4000-4999)
    /// Referenced entity does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// A stored record changed underneath the caller, or a unique key already exists
    #[serde(rename = "RESOURCE_CONFLICT")]
    ResourceConflict = 4001,

    // Internal (9000-9999)
    /// Data corruption or broken invariant
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// The persistence collaborator failed
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9001,
    /// Engine configuration is out of range
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 9002,
}

impl ErrorCode {
    /// HTTP status an API layer would typically use for this code
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError | Self::MissingTriggerContext => 400,
            Self::ResourceNotFound => 404,
            Self::InvalidTransition
            | Self::SessionAlreadyInProgress
            | Self::EnrollmentNotActive
            | Self::ResourceConflict => 409,
            Self::MissingReferenceMax => 422,
            Self::LookupMiss
            | Self::EmptyScheme
            | Self::InternalError
            | Self::StorageError
            | Self::ConfigInvalid => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::MissingReferenceMax => "A reference max must be entered before this lift can be prescribed",
            Self::LookupMiss => "The program's lookup table is incomplete",
            Self::EmptyScheme => "The set scheme produced no sets",
            Self::InvalidTransition => "The requested status change is not allowed",
            Self::SessionAlreadyInProgress => "A workout session is already in progress",
            Self::EnrollmentNotActive => "The enrollment is not active",
            Self::ValidationError => "The provided data is invalid",
            Self::MissingTriggerContext => "The progression trigger is missing required context",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceConflict => "The resource was modified concurrently or already exists",
            Self::InternalError => "An internal error occurred",
            Self::StorageError => "Storage operation failed",
            Self::ConfigInvalid => "Configuration is invalid",
        }
    }
}

/// Errors produced by the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A reference max of the required kind is absent for the lift
    #[error("missing {kind} reference max for lift {lift_id}")]
    MissingReferenceMax {
        /// Lift lacking the max
        lift_id: LiftId,
        /// Kind of max the load strategy needs
        kind: MaxKind,
    },

    /// A lookup table has no row for the requested key
    #[error("lookup table '{table}' has no entry for {key}")]
    LookupMiss {
        /// Name of the table
        table: String,
        /// Human-readable coordinate that missed
        key: String,
    },

    /// A set scheme produced zero sets
    #[error("prescription {prescription_id} produced no sets: {reason}")]
    EmptyScheme {
        /// Prescription whose scheme was empty
        prescription_id: PrescriptionId,
        /// What was empty
        reason: String,
    },

    /// Status change not present in the machine's graph
    #[error("invalid {machine} transition from {from} to {to}")]
    InvalidTransition {
        /// Which sub-machine rejected the change
        machine: StateMachineKind,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// A workout session is already open for the enrollment
    #[error("workout session {session_id} is already in progress")]
    SessionAlreadyInProgress {
        /// The open session
        session_id: SessionId,
    },

    /// Enrollment status does not permit the operation
    #[error("enrollment is {status}, operation requires an active enrollment")]
    EnrollmentNotActive {
        /// Current enrollment status
        status: String,
    },

    /// Malformed catalog or request data
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Trigger is missing context the rule needs
    #[error("trigger context is missing '{field}'")]
    MissingTriggerContext {
        /// Name of the absent field
        field: &'static str,
    },

    /// Referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Broken invariant, indicates corrupted data
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl EngineError {
    /// Create a "not found" error
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a lookup miss error
    #[must_use]
    pub fn lookup_miss(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::LookupMiss {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a single-issue validation error
    #[must_use]
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::single(path, message))
    }

    /// Create an invalid transition error
    #[must_use]
    pub fn invalid_transition(
        machine: StateMachineKind,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            machine,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Stable code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingReferenceMax { .. } => ErrorCode::MissingReferenceMax,
            Self::LookupMiss { .. } => ErrorCode::LookupMiss,
            Self::EmptyScheme { .. } => ErrorCode::EmptyScheme,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::SessionAlreadyInProgress { .. } => ErrorCode::SessionAlreadyInProgress,
            Self::EnrollmentNotActive { .. } => ErrorCode::EnrollmentNotActive,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::MissingTriggerContext { .. } => ErrorCode::MissingTriggerContext,
            Self::NotFound { .. } => ErrorCode::ResourceNotFound,
            Self::Invariant(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the caller can fix this by supplying data (e.g. entering a max)
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingReferenceMax { .. }
                | Self::SessionAlreadyInProgress { .. }
                | Self::MissingTriggerContext { .. }
        )
    }

    /// Whether this error points at a defect in authored program content
    #[must_use]
    pub const fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Self::LookupMiss { .. } | Self::EmptyScheme { .. } | Self::Validation(_)
        )
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
