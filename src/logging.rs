// ABOUTME: Tracing subscriber setup for services embedding the liftplan engine
// ABOUTME: Derives level and format from the environment or an EngineConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging setup

use crate::config::{EngineConfig, Environment, LogLevel};
use anyhow::Result;
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Crates whose events follow the configured level; everything else logs warnings
const ENGINE_TARGETS: [&str; 3] = ["liftplan", "liftplan_engine", "liftplan_core"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-field human readable lines
    #[default]
    Pretty,
    /// Single-line events without targets
    Compact,
}

impl LogFormat {
    /// Parse from string with fallback to `Pretty`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    /// Level for the liftplan crates
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Deployment environment reported at startup
    pub environment: Environment,
    /// Source file and line on every event
    pub include_location: bool,
    /// Events when `#[instrument]` spans open and close
    pub include_spans: bool,
}

impl LoggingConfig {
    /// Settings matching an engine configuration. Production logs JSON with
    /// locations and span events.
    #[must_use]
    pub const fn for_engine(config: &EngineConfig) -> Self {
        let production = config.environment.is_production();
        Self {
            level: config.log_level,
            format: if production {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            environment: config.environment,
            include_location: production,
            include_spans: production,
        }
    }

    /// Read `LOG_LEVEL`, `LOG_FORMAT`, `ENVIRONMENT`, `LOG_INCLUDE_LOCATION` and
    /// `LOG_INCLUDE_SPANS`. Unset format and flags follow [`Self::for_engine`].
    #[must_use]
    pub fn from_env() -> Self {
        let environment =
            Environment::from_str_or_default(&env::var("ENVIRONMENT").unwrap_or_default());
        let level = LogLevel::from_str_or_default(&env::var("LOG_LEVEL").unwrap_or_default());
        let defaults = Self::for_engine(&EngineConfig {
            environment,
            log_level: level,
            ..EngineConfig::default()
        });

        Self {
            format: env::var("LOG_FORMAT")
                .map_or(defaults.format, |format| LogFormat::from_str_or_default(&format)),
            include_location: defaults.include_location || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: defaults.include_spans || env::var("LOG_INCLUDE_SPANS").is_ok(),
            ..defaults
        }
    }

    /// `RUST_LOG` when set, otherwise `warn` plus the configured level for the
    /// liftplan crates
    #[must_use]
    pub fn filter_directives(&self) -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| {
            let mut directives = vec!["warn".to_owned()];
            directives.extend(
                ENGINE_TARGETS
                    .iter()
                    .map(|target| format!("{target}={}", self.level)),
            );
            directives.join(",")
        })
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable filter directives or when a global
    /// subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_span_events(span_events);
        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Pretty => layer.boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(EnvFilter::try_new(self.filter_directives())?)
            .try_init()?;

        info!(
            environment = %self.environment,
            level = %self.level,
            format = ?self.format,
            version = env!("CARGO_PKG_VERSION"),
            "liftplan logging initialized"
        );
        Ok(())
    }
}

/// Install the global subscriber from environment variables
///
/// # Errors
///
/// See [`LoggingConfig::init`]
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}
