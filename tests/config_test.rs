// ABOUTME: Integration tests for environment-driven engine and logging configuration
// ABOUTME: Mutates ENGINE_* variables, so every test runs serially
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use liftplan::config::{ConfigError, EngineConfig, Environment, LogLevel};
use liftplan::errors::AppError;
use liftplan::logging::{LogFormat, LoggingConfig};
use liftplan_core::constants::progression::MAX_DELOAD_PERCENT;
use liftplan_core::errors::ErrorCode;
use liftplan_engine::E1rmFormula;
use serial_test::serial;
use std::env;

const VARS: [&str; 10] = [
    "ENVIRONMENT",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "LOG_INCLUDE_LOCATION",
    "LOG_INCLUDE_SPANS",
    "RUST_LOG",
    "ENGINE_DEFAULT_ROUND_TO",
    "ENGINE_TRAINING_MAX_PERCENT",
    "ENGINE_E1RM_FORMULA",
    "ENGINE_MAX_DELOAD_PERCENT",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_empty_environment_uses_defaults() {
    clear_env();
    let config = EngineConfig::from_env().unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.environment, Environment::Development);
    assert!((config.training_max_percent - 90.0).abs() < f64::EPSILON);
    assert!(config.default_round_to.is_none());
    assert!((config.max_deload_percent - MAX_DELOAD_PERCENT).abs() < f64::EPSILON);
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var("ENVIRONMENT", "prod");
    env::set_var("LOG_LEVEL", "debug");
    env::set_var("ENGINE_DEFAULT_ROUND_TO", "2.5");
    env::set_var("ENGINE_TRAINING_MAX_PERCENT", "85");
    env::set_var("ENGINE_E1RM_FORMULA", "Brzycki");
    env::set_var("ENGINE_MAX_DELOAD_PERCENT", "20");

    let config = EngineConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.default_round_to, Some(2.5));
    assert!((config.training_max_percent - 85.0).abs() < f64::EPSILON);
    assert_eq!(config.e1rm_formula, E1rmFormula::Brzycki);
    assert!(config.summary().contains("round_to=2.5"));
}

#[test]
#[serial]
fn test_blank_round_to_means_no_rounding() {
    clear_env();
    env::set_var("ENGINE_DEFAULT_ROUND_TO", "  ");
    let config = EngineConfig::from_env().unwrap();
    clear_env();
    assert!(config.default_round_to.is_none());
    assert!(config.summary().contains("round_to=none"));
}

#[test]
#[serial]
fn test_unparseable_values_name_the_variable() {
    clear_env();
    env::set_var("ENGINE_TRAINING_MAX_PERCENT", "ninety");
    let error = EngineConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(
        error,
        ConfigError::Parse {
            key: "ENGINE_TRAINING_MAX_PERCENT",
            ..
        }
    ));

    env::set_var("ENGINE_E1RM_FORMULA", "lombardi");
    let error = EngineConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(
        error,
        ConfigError::Parse {
            key: "ENGINE_E1RM_FORMULA",
            ..
        }
    ));
}

#[test]
#[serial]
fn test_out_of_range_values_are_rejected() {
    for (var, value) in [
        ("ENGINE_TRAINING_MAX_PERCENT", "40"),
        ("ENGINE_TRAINING_MAX_PERCENT", "101"),
        ("ENGINE_DEFAULT_ROUND_TO", "0"),
        ("ENGINE_DEFAULT_ROUND_TO", "-2.5"),
        ("ENGINE_MAX_DELOAD_PERCENT", "0"),
        ("ENGINE_MAX_DELOAD_PERCENT", "75"),
    ] {
        clear_env();
        env::set_var(var, value);
        let error = EngineConfig::from_env().unwrap_err();
        assert!(
            matches!(error, ConfigError::ValueOutOfRange(ref message) if message.contains(var)),
            "{var}={value} gave {error}"
        );
    }
    clear_env();
}

#[test]
fn test_config_error_maps_to_config_invalid() {
    let error = AppError::from(ConfigError::ValueOutOfRange("bad".into()));
    assert_eq!(error.code, ErrorCode::ConfigInvalid);
}

#[test]
#[serial]
fn test_logging_from_env() {
    clear_env();
    assert_eq!(LoggingConfig::from_env(), LoggingConfig::default());

    env::set_var("LOG_LEVEL", "debug");
    env::set_var("LOG_FORMAT", "compact");
    env::set_var("LOG_INCLUDE_SPANS", "1");
    let config = LoggingConfig::from_env();
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Compact);
    assert!(config.include_spans);
    assert!(!config.include_location);
    assert_eq!(
        config.filter_directives(),
        "warn,liftplan=debug,liftplan_engine=debug,liftplan_core=debug"
    );

    env::set_var("RUST_LOG", "trace");
    assert_eq!(config.filter_directives(), "trace");
    clear_env();

    // Production defaults to JSON unless LOG_FORMAT says otherwise
    env::set_var("ENVIRONMENT", "production");
    let production = LoggingConfig::from_env();
    clear_env();
    assert_eq!(production.format, LogFormat::Json);
    assert!(production.include_location);
}

#[test]
#[serial]
fn test_logging_installs_one_global_subscriber() {
    clear_env();
    let config = LoggingConfig::from_env();
    assert!(config.init().is_ok());
    assert!(config.init().is_err());
}
