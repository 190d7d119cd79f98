// ABOUTME: Main library entry point for the liftplan strength-training engine
// ABOUTME: Service facade, storage collaborator, configuration, logging, and application errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Liftplan
//!
//! Computes what a lifter should do on a given training day and how their working
//! numbers move afterwards.
//!
//! The pure algorithms live in the workspace crates:
//!
//! - `liftplan-core`: identifiers, the catalog data model, error taxonomy, constants
//! - `liftplan-engine`: lookup resolution, load strategies, set schemes, prescription
//!   resolution, progression rules, and the enrollment state machine
//!
//! This crate wires them to per-user storage:
//!
//! - **Services**: [`services::TrainingService`] loads a user's records, runs the
//!   engine, and writes the results back
//! - **Database**: repository traits plus an in-memory store
//! - **Config**: environment-driven engine defaults
//! - **Logging**: `tracing` subscriber setup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use liftplan::config::EngineConfig;
//! use liftplan::database::InMemoryStore;
//! use liftplan::errors::AppResult;
//! use liftplan::services::TrainingService;
//! use liftplan_core::ids::UserId;
//! use liftplan_core::Catalog;
//! use std::sync::Arc;
//!
//! async fn first_workout(catalog_json: &str, user_id: UserId) -> AppResult<()> {
//!     let catalog = Arc::new(Catalog::from_json(catalog_json)?);
//!     let service = TrainingService::new(
//!         catalog,
//!         Arc::new(InMemoryStore::new()),
//!         EngineConfig::from_env()?,
//!     );
//!     let workout = service.resolve_current_workout(user_id).await?;
//!     println!("{} exercises", workout.workout.exercises.len());
//!     Ok(())
//! }
//! ```

/// Environment configuration for engine defaults
pub mod config;

/// Repository traits and the in-memory store
pub mod database;

/// Application error type wrapping engine and storage failures
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Training service facade
pub mod services;
