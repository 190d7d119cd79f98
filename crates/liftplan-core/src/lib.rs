// ABOUTME: Core types and constants for the liftplan strength-programming engine
// ABOUTME: Foundation crate with identifiers, data model, error taxonomy, and catalog validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Liftplan Core
//!
//! Foundation crate providing shared types for the liftplan engine. It holds two
//! ownership domains that never mix:
//!
//! - **Catalog data** (lifts, prescriptions, lookup tables, progression rules, program
//!   structure) which is shared and read-only for every per-user operation.
//! - **Per-user records** (reference maxes, progression logs, failure counters, stage
//!   state, enrollment state, workout sessions) which are loaded per request and
//!   written back explicitly by the caller.
//!
//! ## Modules
//!
//! - **ids**: Type-safe identifier newtypes
//! - **errors**: `EngineError`, `ErrorCode`, and collected `ValidationError`
//! - **constants**: Default values and limits
//! - **models**: Catalog and per-user data model
//! - **catalog**: In-memory catalog with eager, exhaustive validation

/// Type-safe identifiers for catalog and per-user entities
pub mod ids;

/// Engine error taxonomy with stable error codes
pub mod errors;

/// Default values, limits, and formula coefficients
pub mod constants;

/// Catalog and per-user data model
pub mod models;

/// Program catalog with load-time validation
pub mod catalog;

pub use catalog::Catalog;
pub use errors::{EngineError, EngineResult, ErrorCode, ValidationError, ValidationIssue};
