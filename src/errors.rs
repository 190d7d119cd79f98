// ABOUTME: Application error type wrapping engine, storage, and configuration failures
// ABOUTME: Carries a stable error code, a message, structured details, and the source error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! Every service operation returns [`AppResult`]. Engine errors keep their
//! `ErrorCode` and stay reachable through [`AppError::engine_error`], so callers can
//! prompt for a missing max without string matching.

use crate::config::ConfigError;
use crate::database::StoreError;
use liftplan_core::errors::{EngineError, ErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt;

/// Unified error type for the service layer
#[derive(Debug)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Structured context (missing max kind, validation issues, ...)
    pub details: Value,
    /// Source error for error chaining
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Value::Null,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Concurrent modification or duplicate key
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceConflict, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// HTTP status hint for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Whether the caller can fix the problem by supplying more data
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.engine_error().is_some_and(EngineError::is_recoverable)
    }

    /// Engine error this was converted from, if any
    #[must_use]
    pub fn engine_error(&self) -> Option<&EngineError> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<EngineError>())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Serialized error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable error code
    pub code: ErrorCode,
    /// Message
    pub message: String,
    /// Structured details
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub details: Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                details: error.details,
            },
        }
    }
}

fn engine_details(error: &EngineError) -> Value {
    match error {
        EngineError::MissingReferenceMax { lift_id, kind } => json!({
            "lift_id": lift_id,
            "kind": kind,
        }),
        EngineError::LookupMiss { table, key } => json!({ "table": table, "key": key }),
        EngineError::InvalidTransition { machine, from, to } => json!({
            "machine": machine,
            "from": from,
            "to": to,
        }),
        EngineError::SessionAlreadyInProgress { session_id } => json!({ "session_id": session_id }),
        EngineError::Validation(validation) => json!({ "issues": validation.issues }),
        EngineError::MissingTriggerContext { field } => json!({ "field": field }),
        EngineError::EmptyScheme { .. }
        | EngineError::EnrollmentNotActive { .. }
        | EngineError::NotFound { .. }
        | EngineError::Invariant(_) => Value::Null,
    }
}

impl From<EngineError> for AppError {
    fn from(error: EngineError) -> Self {
        Self::new(error.code(), error.to_string())
            .with_details(engine_details(&error))
            .with_source(error)
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        let code = match &error {
            StoreError::NotFound { .. } => ErrorCode::ResourceNotFound,
            StoreError::UniqueViolation { .. } | StoreError::VersionConflict { .. } => {
                ErrorCode::ResourceConflict
            }
            StoreError::Backend(_) => ErrorCode::StorageError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::new(ErrorCode::ConfigInvalid, error.to_string()).with_source(error)
    }
}

/// Conversion from `anyhow::Error` to `AppError`
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.source() {
            Some(source) => Self::internal(error.to_string()).with_details(json!({
                "source": source.to_string()
            })),
            None => Self::internal(error.to_string()),
        }
    }
}
