// ABOUTME: Configuration management module for engine defaults and deployment settings
// ABOUTME: Loads typed settings from environment variables and validates their ranges
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for liftplan
//!
//! Configuration comes from environment variables only. Every value has a default
//! taken from `liftplan_core::constants`, so an empty environment yields a valid
//! configuration.

/// Environment variable parsing and the engine configuration
pub mod environment;

pub use environment::{ConfigError, EngineConfig, Environment, LogLevel};
