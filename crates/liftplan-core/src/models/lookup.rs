// ABOUTME: Weekly and daily lookup tables that vary prescriptions across a program timeline
// ABOUTME: Entries are keyed by week (optionally set) or by day position / day identifier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::load::MAX_PERCENTAGE;
use crate::errors::ValidationError;
use crate::ids::LookupId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Coordinate into a weekly table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeeklyKey {
    /// Whole-week row
    Week(u32),
    /// Per-set row within a week
    WeekSet(u32, u32),
}

impl fmt::Display for WeeklyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Week(week) => write!(f, "week {week}"),
            Self::WeekSet(week, set) => write!(f, "week {week} set {set}"),
        }
    }
}

/// Coordinate into a daily table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DailyKey {
    /// One-based position of the day within its week
    Position(u32),
    /// Day identifier (slug)
    Identifier(String),
}

impl fmt::Display for DailyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(position) => write!(f, "day position {position}"),
            Self::Identifier(id) => write!(f, "day '{id}'"),
        }
    }
}

/// One row of a weekly table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLookupEntry {
    /// Week number (1-based)
    pub week: u32,
    /// Set number (1-based) for per-set tables
    #[serde(default)]
    pub set_number: Option<u32>,
    /// Percentage of the reference max
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Target reps
    #[serde(default)]
    pub reps: Option<u32>,
    /// Number of sets
    #[serde(default)]
    pub sets: Option<u32>,
    /// The set is AMRAP
    #[serde(default)]
    pub is_amrap: bool,
}

impl WeeklyLookupEntry {
    /// Key this row answers to
    #[must_use]
    pub fn key(&self) -> WeeklyKey {
        self.set_number
            .map_or(WeeklyKey::Week(self.week), |set| WeeklyKey::WeekSet(self.week, set))
    }
}

/// Named weekly percentage/volume table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLookup {
    /// Unique identifier
    pub id: LookupId,
    /// Table name
    pub name: String,
    /// Rows
    pub entries: Vec<WeeklyLookupEntry>,
}

impl WeeklyLookup {
    /// Whether rows are keyed per set
    #[must_use]
    pub fn has_per_set_rows(&self) -> bool {
        self.entries.iter().any(|entry| entry.set_number.is_some())
    }

    /// Check rows for duplicates, ranges, and mixed keying
    pub fn validate_into(&self, path: &str, errors: &mut ValidationError) {
        if self.entries.is_empty() {
            errors.push(format!("{path}.entries"), "table has no entries");
        }
        let per_set = self.has_per_set_rows();
        let mut seen = HashSet::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let row = format!("{path}.entries[{index}]");
            if entry.week == 0 {
                errors.push(format!("{row}.week"), "week numbers start at 1");
            }
            if per_set && entry.set_number.is_none() {
                errors.push(
                    format!("{row}.set_number"),
                    "table mixes per-week and per-set rows",
                );
            }
            if entry.set_number == Some(0) {
                errors.push(format!("{row}.set_number"), "set numbers start at 1");
            }
            validate_percentage(entry.percentage, &row, errors);
            if !seen.insert(entry.key()) {
                errors.push(row, format!("duplicate entry for {}", entry.key()));
            }
        }
    }
}

/// One row of a daily table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLookupEntry {
    /// One-based day position
    #[serde(default)]
    pub day_position: Option<u32>,
    /// Day identifier (slug)
    #[serde(default)]
    pub day_key: Option<String>,
    /// Percentage of the reference max
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Target reps
    #[serde(default)]
    pub reps: Option<u32>,
    /// Number of sets
    #[serde(default)]
    pub sets: Option<u32>,
    /// Intensity label (heavy / light / medium)
    #[serde(default)]
    pub intensity: Option<String>,
}

impl DailyLookupEntry {
    /// Whether this row answers `key`
    #[must_use]
    pub fn matches(&self, key: &DailyKey) -> bool {
        match key {
            DailyKey::Position(position) => self.day_position == Some(*position),
            DailyKey::Identifier(id) => self.day_key.as_deref() == Some(id.as_str()),
        }
    }
}

/// Named daily percentage/volume table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLookup {
    /// Unique identifier
    pub id: LookupId,
    /// Table name
    pub name: String,
    /// Rows
    pub entries: Vec<DailyLookupEntry>,
}

impl DailyLookup {
    /// Check rows for missing keys, duplicates, and ranges
    pub fn validate_into(&self, path: &str, errors: &mut ValidationError) {
        if self.entries.is_empty() {
            errors.push(format!("{path}.entries"), "table has no entries");
        }
        let mut positions = HashSet::new();
        let mut keys = HashSet::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let row = format!("{path}.entries[{index}]");
            if entry.day_position.is_none() && entry.day_key.is_none() {
                errors.push(row.clone(), "entry needs a day_position or day_key");
            }
            if entry.day_position == Some(0) {
                errors.push(format!("{row}.day_position"), "day positions start at 1");
            }
            if let Some(position) = entry.day_position {
                if !positions.insert(position) {
                    errors.push(row.clone(), format!("duplicate day position {position}"));
                }
            }
            if let Some(key) = &entry.day_key {
                if !keys.insert(key.clone()) {
                    errors.push(row.clone(), format!("duplicate day key '{key}'"));
                }
            }
            validate_percentage(entry.percentage, &row, errors);
        }
    }
}

fn validate_percentage(percentage: Option<f64>, row: &str, errors: &mut ValidationError) {
    if let Some(percentage) = percentage {
        if !percentage.is_finite() || percentage <= 0.0 || percentage > MAX_PERCENTAGE {
            errors.push(
                format!("{row}.percentage"),
                format!("must be in (0, {MAX_PERCENTAGE}], got {percentage}"),
            );
        }
    }
}
