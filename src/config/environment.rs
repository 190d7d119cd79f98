// ABOUTME: Environment configuration for engine defaults and deployment mode
// ABOUTME: Parses ENGINE_* variables with fallbacks to engine constants and validates ranges
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration

use liftplan_core::constants::progression::MAX_DELOAD_PERCENT;
use liftplan_core::constants::training_max::{
    DEFAULT_PERCENT_OF_ONE_RM, MAX_PERCENT_OF_ONE_RM, MIN_PERCENT_OF_ONE_RM,
};
use liftplan_engine::{E1rmFormula, ProgressionEngine};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use thiserror::Error;
use tracing::{info, Level};

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric value outside valid range for parameter
    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    /// Failed to parse configuration value
    #[error("Parse error for {key}: {message}")]
    Parse {
        /// Environment variable
        key: &'static str,
        /// What went wrong
        message: String,
    },
}

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational
    #[default]
    Info,
    /// Debugging
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a testing environment
    #[must_use]
    pub const fn is_testing(&self) -> bool {
        matches!(self, Self::Testing)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Engine defaults applied by the service layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
    /// Rounding increment for deloads and stage resets
    pub default_round_to: Option<f64>,
    /// Training max as a percentage of the one-rep max
    pub training_max_percent: f64,
    /// Formula for estimated one-rep maxes
    pub e1rm_formula: E1rmFormula,
    /// Upper bound for any deload percentage
    pub max_deload_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: LogLevel::default(),
            default_round_to: None,
            training_max_percent: DEFAULT_PERCENT_OF_ONE_RM,
            e1rm_formula: E1rmFormula::default(),
            max_deload_percent: MAX_DELOAD_PERCENT,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but unparseable or out of range
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            environment: Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development")),
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")),
            default_round_to: parse_optional_f64("ENGINE_DEFAULT_ROUND_TO")?,
            training_max_percent: parse_optional_f64("ENGINE_TRAINING_MAX_PERCENT")?
                .unwrap_or(DEFAULT_PERCENT_OF_ONE_RM),
            e1rm_formula: match env::var("ENGINE_E1RM_FORMULA") {
                Ok(value) => value.parse().map_err(|message| ConfigError::Parse {
                    key: "ENGINE_E1RM_FORMULA",
                    message,
                })?,
                Err(_) => E1rmFormula::default(),
            },
            max_deload_percent: parse_optional_f64("ENGINE_MAX_DELOAD_PERCENT")?
                .unwrap_or(MAX_DELOAD_PERCENT),
        };
        config.validate()?;
        info!(
            environment = %config.environment,
            round_to = ?config.default_round_to,
            training_max_percent = config.training_max_percent,
            formula = %config.e1rm_formula,
            "engine configuration loaded"
        );
        Ok(config)
    }

    /// Validate value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValueOutOfRange` naming the first offending value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(round_to) = self.default_round_to {
            if !round_to.is_finite() || round_to <= 0.0 {
                return Err(ConfigError::ValueOutOfRange(format!(
                    "ENGINE_DEFAULT_ROUND_TO must be positive, got {round_to}"
                )));
            }
        }
        if !(MIN_PERCENT_OF_ONE_RM..=MAX_PERCENT_OF_ONE_RM).contains(&self.training_max_percent) {
            return Err(ConfigError::ValueOutOfRange(format!(
                "ENGINE_TRAINING_MAX_PERCENT must be in [{MIN_PERCENT_OF_ONE_RM}, {MAX_PERCENT_OF_ONE_RM}], got {}",
                self.training_max_percent
            )));
        }
        if !(self.max_deload_percent > 0.0 && self.max_deload_percent <= MAX_DELOAD_PERCENT) {
            return Err(ConfigError::ValueOutOfRange(format!(
                "ENGINE_MAX_DELOAD_PERCENT must be in (0, {MAX_DELOAD_PERCENT}], got {}",
                self.max_deload_percent
            )));
        }
        Ok(())
    }

    /// Progression engine using these defaults
    #[must_use]
    pub fn progression_engine(&self) -> ProgressionEngine {
        ProgressionEngine::new()
            .with_round_to(self.default_round_to)
            .with_max_deload_percent(self.max_deload_percent)
    }

    /// One-line summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} log_level={} round_to={} training_max_percent={} e1rm_formula={} max_deload_percent={}",
            self.environment,
            self.log_level,
            self.default_round_to
                .map_or_else(|| "none".to_owned(), |value| value.to_string()),
            self.training_max_percent,
            self.e1rm_formula,
            self.max_deload_percent,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_optional_f64(key: &'static str) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                key,
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
