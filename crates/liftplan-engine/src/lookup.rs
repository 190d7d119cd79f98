// ABOUTME: Resolves schedule coordinates against a program's weekly and daily lookup tables
// ABOUTME: A missing row is a LookupMiss error, never a default or an interpolated value
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::models::{
    DailyKey, DailyLookup, DailyLookupEntry, Program, ScheduleCoordinate, WeeklyKey,
    WeeklyLookup, WeeklyLookupEntry,
};
use liftplan_core::Catalog;

/// Lookup tables attached to the program being resolved
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramTables<'a> {
    /// Weekly table, if the program has one
    pub weekly: Option<&'a WeeklyLookup>,
    /// Daily table, if the program has one
    pub daily: Option<&'a DailyLookup>,
}

impl<'a> ProgramTables<'a> {
    /// Tables referenced by `program`
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the program references a table the catalog lacks
    pub fn for_program(catalog: &'a Catalog, program: &Program) -> EngineResult<Self> {
        let weekly = program
            .weekly_lookup_id
            .map(|id| catalog.weekly_lookup(id))
            .transpose()?;
        let daily = program
            .daily_lookup_id
            .map(|id| catalog.daily_lookup(id))
            .transpose()?;
        Ok(Self { weekly, daily })
    }

    /// Weekly table or a validation error naming what needed it
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` when the program has no weekly table
    pub fn require_weekly(&self, needed_by: &str) -> EngineResult<&'a WeeklyLookup> {
        self.weekly.ok_or_else(|| {
            EngineError::validation(
                "program.weekly_lookup_id",
                format!("{needed_by} requires a weekly lookup"),
            )
        })
    }

    /// Daily table or a validation error naming what needed it
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` when the program has no daily table
    pub fn require_daily(&self, needed_by: &str) -> EngineResult<&'a DailyLookup> {
        self.daily.ok_or_else(|| {
            EngineError::validation(
                "program.daily_lookup_id",
                format!("{needed_by} requires a daily lookup"),
            )
        })
    }
}

/// Key into a weekly table for `week_number` and an optional set.
///
/// Tables with per-set rows are keyed by (week, set), defaulting to set 1. Tables
/// without them are keyed by week alone and ignore the set number.
#[must_use]
pub fn weekly_key(table: &WeeklyLookup, week_number: u32, set_number: Option<u32>) -> WeeklyKey {
    if table.has_per_set_rows() {
        WeeklyKey::WeekSet(week_number, set_number.unwrap_or(1))
    } else {
        WeeklyKey::Week(week_number)
    }
}

/// Key into a daily table for `coordinate`.
///
/// Tables keyed by identifier use the day slug when the coordinate carries one;
/// otherwise the 1-based day position is used.
#[must_use]
pub fn daily_key(table: &DailyLookup, coordinate: &ScheduleCoordinate) -> DailyKey {
    let keyed_by_identifier = table.entries.iter().any(|entry| entry.day_key.is_some());
    match (&coordinate.day_slug, keyed_by_identifier) {
        (Some(slug), true) => DailyKey::Identifier(slug.clone()),
        _ => DailyKey::Position(coordinate.day_position()),
    }
}

/// Row of `table` for `key`
///
/// # Errors
///
/// Returns `EngineError::LookupMiss` when the table has no such row
pub fn resolve_weekly(table: &WeeklyLookup, key: WeeklyKey) -> EngineResult<&WeeklyLookupEntry> {
    table
        .entries
        .iter()
        .find(|entry| entry.key() == key)
        .ok_or_else(|| EngineError::lookup_miss(&table.name, key.to_string()))
}

/// Row of `table` for `key`
///
/// # Errors
///
/// Returns `EngineError::LookupMiss` when the table has no such row
pub fn resolve_daily<'a>(table: &'a DailyLookup, key: &DailyKey) -> EngineResult<&'a DailyLookupEntry> {
    table
        .entries
        .iter()
        .find(|entry| entry.matches(key))
        .ok_or_else(|| EngineError::lookup_miss(&table.name, key.to_string()))
}

/// Percentage carried by a weekly row
///
/// # Errors
///
/// Returns `EngineError::LookupMiss` if the row has no percentage
pub fn weekly_percentage(table: &WeeklyLookup, key: WeeklyKey) -> EngineResult<f64> {
    resolve_weekly(table, key)?
        .percentage
        .ok_or_else(|| EngineError::lookup_miss(&table.name, format!("{key} percentage")))
}

/// Percentage carried by a daily row
///
/// # Errors
///
/// Returns `EngineError::LookupMiss` if the row has no percentage
pub fn daily_percentage(table: &DailyLookup, key: &DailyKey) -> EngineResult<f64> {
    resolve_daily(table, key)?
        .percentage
        .ok_or_else(|| EngineError::lookup_miss(&table.name, format!("{key} percentage")))
}
