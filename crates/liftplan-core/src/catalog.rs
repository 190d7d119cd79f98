// ABOUTME: In-memory program catalog: lifts, prescriptions, lookups, progressions, structure
// ABOUTME: Validates every cross reference and parameter eagerly, reporting all defects together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Catalog
//!
//! Shared reference data. The catalog is built once (from code or JSON), validated,
//! and then only read by resolution and progression paths.

use crate::errors::{EngineError, EngineResult, ValidationError};
use crate::ids::{CycleId, DayId, LiftId, LookupId, PrescriptionId, ProgramId, ProgressionId, WeekId};
use crate::models::{
    Cycle, Day, DailyLookup, Lift, LoadStrategy, MaxSource, Prescription, Program, ProgramProgression,
    ProgressionDefinition, SetScheme, Week, WeeklyLookup,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Serialized catalog content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Lifts
    #[serde(default)]
    pub lifts: Vec<Lift>,
    /// Prescriptions
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    /// Days
    #[serde(default)]
    pub days: Vec<Day>,
    /// Weeks
    #[serde(default)]
    pub weeks: Vec<Week>,
    /// Cycles
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    /// Programs
    #[serde(default)]
    pub programs: Vec<Program>,
    /// Weekly lookups
    #[serde(default)]
    pub weekly_lookups: Vec<WeeklyLookup>,
    /// Daily lookups
    #[serde(default)]
    pub daily_lookups: Vec<DailyLookup>,
    /// Progression rules
    #[serde(default)]
    pub progressions: Vec<ProgressionDefinition>,
    /// Program-lift-progression links
    #[serde(default)]
    pub program_progressions: Vec<ProgramProgression>,
}

/// Indexed catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    lifts: HashMap<LiftId, Lift>,
    prescriptions: HashMap<PrescriptionId, Prescription>,
    days: HashMap<DayId, Day>,
    weeks: HashMap<WeekId, Week>,
    cycles: HashMap<CycleId, Cycle>,
    programs: HashMap<ProgramId, Program>,
    weekly_lookups: HashMap<LookupId, WeeklyLookup>,
    daily_lookups: HashMap<LookupId, DailyLookup>,
    progressions: HashMap<ProgressionId, ProgressionDefinition>,
    program_progressions: Vec<ProgramProgression>,
}

impl Catalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse catalog JSON and validate it
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` when the JSON is malformed (including unknown
    /// strategy, scheme, or rule tags) or when any reference or parameter is invalid
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| EngineError::validation("$", format!("malformed catalog: {e}")))?;
        Self::from_document(document)
    }

    /// Index and validate a parsed document
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` listing every defect found
    pub fn from_document(document: CatalogDocument) -> EngineResult<Self> {
        let mut catalog = Self::new();
        for lift in document.lifts {
            catalog.insert_lift(lift);
        }
        for prescription in document.prescriptions {
            catalog.insert_prescription(prescription);
        }
        for day in document.days {
            catalog.insert_day(day);
        }
        for week in document.weeks {
            catalog.insert_week(week);
        }
        for cycle in document.cycles {
            catalog.insert_cycle(cycle);
        }
        for program in document.programs {
            catalog.insert_program(program);
        }
        for lookup in document.weekly_lookups {
            catalog.insert_weekly_lookup(lookup);
        }
        for lookup in document.daily_lookups {
            catalog.insert_daily_lookup(lookup);
        }
        for progression in document.progressions {
            catalog.insert_progression(progression);
        }
        for link in document.program_progressions {
            catalog.link_progression(link);
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Add a lift
    pub fn insert_lift(&mut self, lift: Lift) -> LiftId {
        let id = lift.id;
        self.lifts.insert(id, lift);
        id
    }

    /// Add a prescription
    pub fn insert_prescription(&mut self, prescription: Prescription) -> PrescriptionId {
        let id = prescription.id;
        self.prescriptions.insert(id, prescription);
        id
    }

    /// Add a day
    pub fn insert_day(&mut self, day: Day) -> DayId {
        let id = day.id;
        self.days.insert(id, day);
        id
    }

    /// Add a week
    pub fn insert_week(&mut self, week: Week) -> WeekId {
        let id = week.id;
        self.weeks.insert(id, week);
        id
    }

    /// Add a cycle
    pub fn insert_cycle(&mut self, cycle: Cycle) -> CycleId {
        let id = cycle.id;
        self.cycles.insert(id, cycle);
        id
    }

    /// Add a program
    pub fn insert_program(&mut self, program: Program) -> ProgramId {
        let id = program.id;
        self.programs.insert(id, program);
        id
    }

    /// Add a weekly lookup
    pub fn insert_weekly_lookup(&mut self, lookup: WeeklyLookup) -> LookupId {
        let id = lookup.id;
        self.weekly_lookups.insert(id, lookup);
        id
    }

    /// Add a daily lookup
    pub fn insert_daily_lookup(&mut self, lookup: DailyLookup) -> LookupId {
        let id = lookup.id;
        self.daily_lookups.insert(id, lookup);
        id
    }

    /// Add a progression rule
    pub fn insert_progression(&mut self, progression: ProgressionDefinition) -> ProgressionId {
        let id = progression.id;
        self.progressions.insert(id, progression);
        id
    }

    /// Link a progression rule to a lift within a program
    pub fn link_progression(&mut self, link: ProgramProgression) {
        self.program_progressions.push(link);
    }

    /// Lift by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn lift(&self, id: LiftId) -> EngineResult<&Lift> {
        self.lifts.get(&id).ok_or_else(|| EngineError::not_found("lift", id))
    }

    /// Every lift
    pub fn lifts(&self) -> impl Iterator<Item = &Lift> {
        self.lifts.values()
    }

    /// Lift by slug
    #[must_use]
    pub fn lift_by_slug(&self, slug: &str) -> Option<&Lift> {
        self.lifts.values().find(|lift| lift.slug == slug)
    }

    /// Prescription by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn prescription(&self, id: PrescriptionId) -> EngineResult<&Prescription> {
        self.prescriptions
            .get(&id)
            .ok_or_else(|| EngineError::not_found("prescription", id))
    }

    /// Day by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn day(&self, id: DayId) -> EngineResult<&Day> {
        self.days.get(&id).ok_or_else(|| EngineError::not_found("day", id))
    }

    /// Week by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn week(&self, id: WeekId) -> EngineResult<&Week> {
        self.weeks.get(&id).ok_or_else(|| EngineError::not_found("week", id))
    }

    /// Cycle by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn cycle(&self, id: CycleId) -> EngineResult<&Cycle> {
        self.cycles.get(&id).ok_or_else(|| EngineError::not_found("cycle", id))
    }

    /// Program by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn program(&self, id: ProgramId) -> EngineResult<&Program> {
        self.programs
            .get(&id)
            .ok_or_else(|| EngineError::not_found("program", id))
    }

    /// Program by slug
    #[must_use]
    pub fn program_by_slug(&self, slug: &str) -> Option<&Program> {
        self.programs.values().find(|program| program.slug == slug)
    }

    /// Weekly lookup by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn weekly_lookup(&self, id: LookupId) -> EngineResult<&WeeklyLookup> {
        self.weekly_lookups
            .get(&id)
            .ok_or_else(|| EngineError::not_found("weekly lookup", id))
    }

    /// Daily lookup by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn daily_lookup(&self, id: LookupId) -> EngineResult<&DailyLookup> {
        self.daily_lookups
            .get(&id)
            .ok_or_else(|| EngineError::not_found("daily lookup", id))
    }

    /// Progression rule by id
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if absent
    pub fn progression(&self, id: ProgressionId) -> EngineResult<&ProgressionDefinition> {
        self.progressions
            .get(&id)
            .ok_or_else(|| EngineError::not_found("progression", id))
    }

    /// Enabled progression links of a program
    pub fn program_progressions(
        &self,
        program_id: ProgramId,
    ) -> impl Iterator<Item = &ProgramProgression> {
        self.program_progressions
            .iter()
            .filter(move |link| link.program_id == program_id && link.enabled)
    }

    /// Enabled link for a (program, lift, progression), if one exists
    #[must_use]
    pub fn program_progression(
        &self,
        program_id: ProgramId,
        lift_id: LiftId,
        progression_id: ProgressionId,
    ) -> Option<&ProgramProgression> {
        self.program_progressions.iter().find(|link| {
            link.program_id == program_id
                && link.lift_id == lift_id
                && link.progression_id == progression_id
                && link.enabled
        })
    }

    /// Week of a program by 1-based week number
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the program, cycle, or week is absent
    pub fn program_week(&self, program_id: ProgramId, week_number: u32) -> EngineResult<&Week> {
        let program = self.program(program_id)?;
        let cycle = self.cycle(program.cycle_id)?;
        let week_id = cycle
            .week_id(week_number)
            .ok_or_else(|| EngineError::not_found("week number", week_number))?;
        self.week(week_id)
    }

    /// Day of a program by week number and 0-based day index
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if any level is absent
    pub fn program_day(
        &self,
        program_id: ProgramId,
        week_number: u32,
        day_index: u32,
    ) -> EngineResult<&Day> {
        let week = self.program_week(program_id, week_number)?;
        let day_id = usize::try_from(day_index)
            .ok()
            .and_then(|index| week.days.get(index))
            .ok_or_else(|| EngineError::not_found("day index", day_index))?;
        self.day(*day_id)
    }

    /// Validate every entity and cross reference
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` listing every defect found
    pub fn validate(&self) -> EngineResult<()> {
        let mut errors = ValidationError::new();
        self.validate_lifts(&mut errors);
        self.validate_prescriptions(&mut errors);
        self.validate_structure(&mut errors);
        self.validate_lookups(&mut errors);
        self.validate_progressions(&mut errors);

        if errors.is_empty() {
            debug!(
                lifts = self.lifts.len(),
                prescriptions = self.prescriptions.len(),
                programs = self.programs.len(),
                "catalog validated"
            );
            Ok(())
        } else {
            warn!(issues = errors.len(), "catalog validation failed");
            Err(EngineError::Validation(errors))
        }
    }

    fn validate_lifts(&self, errors: &mut ValidationError) {
        let mut slugs = HashSet::new();
        for lift in self.lifts.values() {
            let path = format!("lifts[{}]", lift.slug);
            if !slugs.insert(lift.slug.as_str()) {
                errors.push(path.clone(), "duplicate lift slug");
            }
            if let Some(parent) = lift.parent_lift_id {
                if parent == lift.id {
                    errors.push(format!("{path}.parent_lift_id"), "lift cannot be its own parent");
                } else if !self.lifts.contains_key(&parent) {
                    errors.push(format!("{path}.parent_lift_id"), format!("unknown lift {parent}"));
                }
            }
            if let MaxSource::DeriveFromParent { percent } = lift.max_source {
                if lift.parent_lift_id.is_none() {
                    errors.push(
                        format!("{path}.max_source"),
                        "derivation requires a parent lift",
                    );
                }
                if !percent.is_finite() || percent <= 0.0 {
                    errors.push(format!("{path}.max_source.percent"), "must be positive");
                }
            }
        }
    }

    fn validate_prescriptions(&self, errors: &mut ValidationError) {
        for prescription in self.prescriptions.values() {
            let path = format!("prescriptions[{}]", prescription.id);
            if !self.lifts.contains_key(&prescription.lift_id) {
                errors.push(
                    format!("{path}.lift_id"),
                    format!("unknown lift {}", prescription.lift_id),
                );
            }
            prescription.validate_into(&path, errors);
        }
    }

    fn validate_structure(&self, errors: &mut ValidationError) {
        for day in self.days.values() {
            let path = format!("days[{}]", day.slug);
            if day.prescriptions.is_empty() {
                errors.push(format!("{path}.prescriptions"), "day has no prescriptions");
            }
            for id in &day.prescriptions {
                if !self.prescriptions.contains_key(id) {
                    errors.push(format!("{path}.prescriptions"), format!("unknown prescription {id}"));
                }
            }
        }
        for week in self.weeks.values() {
            let path = format!("weeks[{}]", week.id);
            if week.days.is_empty() {
                errors.push(format!("{path}.days"), "week has no days");
            }
            for id in &week.days {
                if !self.days.contains_key(id) {
                    errors.push(format!("{path}.days"), format!("unknown day {id}"));
                }
            }
        }
        for cycle in self.cycles.values() {
            let path = format!("cycles[{}]", cycle.name);
            if cycle.weeks.is_empty() {
                errors.push(format!("{path}.weeks"), "cycle has no weeks");
            }
            for (index, id) in cycle.weeks.iter().enumerate() {
                match self.weeks.get(id) {
                    None => errors.push(format!("{path}.weeks[{index}]"), format!("unknown week {id}")),
                    Some(week) if usize::try_from(week.week_number).ok() != Some(index + 1) => {
                        errors.push(
                            format!("{path}.weeks[{index}]"),
                            format!("week_number {} does not match position {}", week.week_number, index + 1),
                        );
                    }
                    Some(_) => {}
                }
            }
        }
        for program in self.programs.values() {
            self.validate_program(program, errors);
        }
    }

    fn validate_program(&self, program: &Program, errors: &mut ValidationError) {
        let path = format!("programs[{}]", program.slug);
        if !self.cycles.contains_key(&program.cycle_id) {
            errors.push(format!("{path}.cycle_id"), format!("unknown cycle {}", program.cycle_id));
        }
        if let Some(id) = program.weekly_lookup_id {
            if !self.weekly_lookups.contains_key(&id) {
                errors.push(format!("{path}.weekly_lookup_id"), format!("unknown weekly lookup {id}"));
            }
        }
        if let Some(id) = program.daily_lookup_id {
            if !self.daily_lookups.contains_key(&id) {
                errors.push(format!("{path}.daily_lookup_id"), format!("unknown daily lookup {id}"));
            }
        }
        if program.rotation_length == Some(0) {
            errors.push(format!("{path}.rotation_length"), "must be at least 1");
        }

        // Every prescription reachable from the program must have the tables it needs.
        for prescription in self.program_prescriptions(program) {
            let needs_weekly = matches!(prescription.load_strategy, LoadStrategy::WeeklyLookup { .. })
                || matches!(prescription.set_scheme, SetScheme::LookupDriven { .. });
            let needs_daily = matches!(prescription.load_strategy, LoadStrategy::DailyLookup { .. });
            if needs_weekly && program.weekly_lookup_id.is_none() {
                errors.push(
                    format!("{path}.weekly_lookup_id"),
                    format!("prescription {} requires a weekly lookup", prescription.id),
                );
            }
            if needs_daily && program.daily_lookup_id.is_none() {
                errors.push(
                    format!("{path}.daily_lookup_id"),
                    format!("prescription {} requires a daily lookup", prescription.id),
                );
            }
        }

        for link in self.program_progressions.iter().filter(|l| l.program_id == program.id) {
            if !self.lifts.contains_key(&link.lift_id) {
                errors.push(format!("{path}.progressions"), format!("unknown lift {}", link.lift_id));
            }
            if !self.progressions.contains_key(&link.progression_id) {
                errors.push(
                    format!("{path}.progressions"),
                    format!("unknown progression {}", link.progression_id),
                );
            }
            if link.increment_override.is_some_and(|inc| !inc.is_finite()) {
                errors.push(format!("{path}.progressions.increment_override"), "must be finite");
            }
        }
    }

    fn program_prescriptions<'a>(
        &'a self,
        program: &Program,
    ) -> impl Iterator<Item = &'a Prescription> + 'a {
        let mut seen = HashSet::new();
        let ids: Vec<PrescriptionId> = self
            .cycles
            .get(&program.cycle_id)
            .into_iter()
            .flat_map(|cycle| cycle.weeks.iter())
            .filter_map(|week_id| self.weeks.get(week_id))
            .flat_map(|week| week.days.iter())
            .filter_map(|day_id| self.days.get(day_id))
            .flat_map(|day| day.prescriptions.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect();
        ids.into_iter().filter_map(move |id| self.prescriptions.get(&id))
    }

    fn validate_lookups(&self, errors: &mut ValidationError) {
        for lookup in self.weekly_lookups.values() {
            lookup.validate_into(&format!("weekly_lookups[{}]", lookup.name), errors);
        }
        for lookup in self.daily_lookups.values() {
            lookup.validate_into(&format!("daily_lookups[{}]", lookup.name), errors);
        }
    }

    fn validate_progressions(&self, errors: &mut ValidationError) {
        for progression in self.progressions.values() {
            progression
                .rule
                .validate_into(&format!("progressions[{}].rule", progression.name), errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MaxKind;

    #[test]
    fn test_validation_collects_every_issue() {
        let mut catalog = Catalog::new();
        let squat = catalog.insert_lift(Lift::new("Squat", "squat"));
        catalog.insert_prescription(Prescription::new(
            squat,
            LoadStrategy::PercentOf {
                reference_kind: MaxKind::TrainingMax,
                percentage: 0.0,
                round_to: Some(-1.0),
            },
            SetScheme::Ramp {
                steps: Vec::new(),
                work_set_threshold: 80.0,
            },
            1,
        ));

        let Err(EngineError::Validation(errors)) = catalog.validate() else {
            unreachable!("catalog with bad prescription must fail validation");
        };
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_disabled_link_is_ignored() {
        let mut catalog = Catalog::new();
        let squat = catalog.insert_lift(Lift::new("Squat", "squat"));
        let (program_id, progression_id) = (ProgramId::new(), ProgressionId::new());
        catalog.link_progression(ProgramProgression {
            program_id,
            lift_id: squat,
            progression_id,
            increment_override: Some(10.0),
            enabled: false,
        });

        assert!(catalog
            .program_progression(program_id, squat, progression_id)
            .is_none());
        assert_eq!(catalog.program_progressions(program_id).count(), 0);
    }

    #[test]
    fn test_unknown_tag_is_validation_error() {
        let json = r#"{
            "prescriptions": [{
                "id": "6f1c6a57-56c2-4f1d-9d8e-2b0f5d0c3a11",
                "lift_id": "0b5e4a7b-9a3d-4e59-8f0e-5b7a1f1e2c33",
                "load_strategy": {"type": "FORMULA", "expression": "tm * 0.85"},
                "set_scheme": {"type": "FIXED", "sets": 5, "reps": 5},
                "order": 1
            }]
        }"#;
        let result = Catalog::from_json(json);
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
