// ABOUTME: Collected validation errors for catalog and request data
// ABOUTME: Gathers every defect with its path so authors see all problems at once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// One defect found while validating data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path to the offending value (e.g. `prescriptions[3].set_scheme.steps`)
    pub path: String,
    /// What is wrong with it
    pub message: String,
}

/// All defects found in one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationError {
    /// Issues in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Create an empty collector
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Create an error carrying one issue
    #[must_use]
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new();
        error.push(path, message);
        error
    }

    /// Record an issue
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Append another collector's issues
    pub fn extend(&mut self, other: Self) {
        self.issues.extend(other.issues);
    }

    /// True when nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of recorded issues
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    ///
    /// # Errors
    ///
    /// Returns the collector itself if any issue was recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed with {} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "; {}: {}", issue.path, issue.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}
