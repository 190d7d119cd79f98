// ABOUTME: Composes expanded set schemes into full workouts for a day or a whole week
// ABOUTME: Failures are collected per prescription so one call reports every missing max
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Prescription Resolver
//!
//! Resolution never stops at the first failing slot. A day with five lifts and no
//! maxes entered yields five `ResolutionError`s alongside an empty workout, so the
//! caller can ask for every missing max at once.

use crate::load_strategy::LoadContext;
use crate::lookup::ProgramTables;
use crate::maxes::ReferenceMaxSource;
use crate::progression::ActiveStages;
use crate::set_scheme::{expand, expand_prescription, staged_scheme};
use liftplan_core::errors::{EngineError, EngineResult};
use liftplan_core::ids::{LiftId, PrescriptionId, ProgramId};
use liftplan_core::models::{
    Day, MaxKind, Prescription, Program, ResolvedExercise, ScheduleCoordinate, Workout,
};
use liftplan_core::Catalog;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// One prescription that could not be resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionError {
    /// Failing prescription
    pub prescription_id: PrescriptionId,
    /// Lift the prescription targets, when the prescription exists
    pub lift_id: Option<LiftId>,
    /// Lift display name, when the lift exists
    pub lift_name: Option<String>,
    /// What went wrong
    #[serde(serialize_with = "serialize_error")]
    pub error: EngineError,
}

fn serialize_error<S: serde::Serializer>(error: &EngineError, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;
    let mut state = serializer.serialize_struct("EngineError", 2)?;
    state.serialize_field("code", &error.code())?;
    state.serialize_field("message", &error.to_string())?;
    state.end()
}

/// A resolved day plus every per-prescription failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayResolution {
    /// Exercises that resolved, in prescription order
    pub workout: Workout,
    /// Prescriptions that failed, in prescription order
    pub errors: Vec<ResolutionError>,
}

impl DayResolution {
    /// Every prescription resolved
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Distinct (lift, kind) pairs the user still has to enter
    #[must_use]
    pub fn missing_maxes(&self) -> Vec<(LiftId, MaxKind)> {
        let mut missing = Vec::new();
        for failure in &self.errors {
            if let EngineError::MissingReferenceMax { lift_id, kind } = failure.error {
                if !missing.contains(&(lift_id, kind)) {
                    missing.push((lift_id, kind));
                }
            }
        }
        missing
    }
}

/// Resolves program days against the catalog
#[derive(Debug, Clone, Copy)]
pub struct PrescriptionResolver<'a> {
    catalog: &'a Catalog,
    stages: Option<&'a ActiveStages>,
}

impl<'a> PrescriptionResolver<'a> {
    /// Resolver over `catalog`
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            stages: None,
        }
    }

    /// Shape the sets of staged lifts by their active stage
    #[must_use]
    pub const fn with_stages(mut self, stages: &'a ActiveStages) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Resolve `day` of `program` at `coordinate`.
    ///
    /// Prescriptions run in ascending `order` (ties keep the day's listing order).
    ///
    /// # Errors
    ///
    /// Returns an error only when the program's lookup tables cannot be found;
    /// per-prescription failures are reported inside the `DayResolution`
    pub fn resolve_day(
        &self,
        program: &Program,
        day: &Day,
        maxes: &dyn ReferenceMaxSource,
        coordinate: &ScheduleCoordinate,
    ) -> EngineResult<DayResolution> {
        let tables = ProgramTables::for_program(self.catalog, program)?;
        let context = LoadContext::new(maxes, tables, coordinate);

        let mut prescriptions: Vec<Result<&Prescription, (PrescriptionId, EngineError)>> = day
            .prescriptions
            .iter()
            .map(|id| self.catalog.prescription(*id).map_err(|e| (*id, e)))
            .collect();
        prescriptions.sort_by_key(|entry| entry.as_ref().map_or(u32::MAX, |p| p.order));

        let mut exercises = Vec::new();
        let mut errors = Vec::new();
        for entry in prescriptions {
            let prescription = match entry {
                Ok(prescription) => prescription,
                Err((prescription_id, error)) => {
                    errors.push(ResolutionError {
                        prescription_id,
                        lift_id: None,
                        lift_name: None,
                        error,
                    });
                    continue;
                }
            };
            match self.resolve_prescription(prescription, &context) {
                Ok(exercise) => exercises.push(exercise),
                Err(error) => {
                    warn!(
                        prescription_id = %prescription.id,
                        lift_id = %prescription.lift_id,
                        code = ?error.code(),
                        "prescription did not resolve: {error}"
                    );
                    errors.push(ResolutionError {
                        prescription_id: prescription.id,
                        lift_id: Some(prescription.lift_id),
                        lift_name: self.catalog.lift(prescription.lift_id).ok().map(|l| l.name.clone()),
                        error,
                    });
                }
            }
        }

        debug!(
            program_id = %program.id,
            day = %day.slug,
            week = coordinate.week_number,
            exercises = exercises.len(),
            failures = errors.len(),
            "resolved day"
        );

        Ok(DayResolution {
            workout: Workout {
                program_id: program.id,
                day_id: day.id,
                day_name: day.name.clone(),
                coordinate: coordinate.clone(),
                exercises,
            },
            errors,
        })
    }

    fn resolve_prescription(
        &self,
        prescription: &Prescription,
        context: &LoadContext<'_>,
    ) -> EngineResult<ResolvedExercise> {
        let lift = self.catalog.lift(prescription.lift_id)?;
        let stage = self.stages.and_then(|stages| stages.get(lift.id));
        let sets = match stage {
            Some(stage) => expand(
                prescription.id,
                &staged_scheme(&prescription.set_scheme, stage),
                &prescription.load_strategy,
                lift.id,
                context,
            )?,
            None => expand_prescription(prescription, context)?,
        };
        Ok(ResolvedExercise {
            prescription_id: prescription.id,
            lift_id: lift.id,
            lift_name: lift.name.clone(),
            order: prescription.order,
            notes: prescription.notes.clone(),
            rest_seconds: prescription.rest_seconds,
            sets,
            stage: stage.map(|stage| stage.name.clone()),
            target_volume: stage.map(|stage| stage.target_volume.unwrap_or(stage.sets * stage.reps)),
        })
    }

    /// Resolve the program day at `coordinate`, filling in the day slug.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` when the week or day index does not exist
    pub fn resolve_program_day(
        &self,
        program_id: ProgramId,
        maxes: &dyn ReferenceMaxSource,
        coordinate: &ScheduleCoordinate,
    ) -> EngineResult<DayResolution> {
        let program = self.catalog.program(program_id)?;
        let day = self
            .catalog
            .program_day(program_id, coordinate.week_number, coordinate.day_index)?;
        let coordinate = if coordinate.day_slug.is_some() {
            coordinate.clone()
        } else {
            coordinate.clone().with_day_slug(day.slug.clone())
        };
        self.resolve_day(program, day, maxes, &coordinate)
    }

    /// Resolve every day of a week in parallel, in day order
    ///
    /// # Errors
    ///
    /// Returns the first structural error (unknown program, week, or table)
    pub fn resolve_week(
        &self,
        program_id: ProgramId,
        maxes: &dyn ReferenceMaxSource,
        cycle_iteration: u32,
        week_number: u32,
    ) -> EngineResult<Vec<DayResolution>> {
        let week = self.catalog.program_week(program_id, week_number)?;
        (0..week.day_count())
            .into_par_iter()
            .map(|day_index| {
                let coordinate = ScheduleCoordinate::new(cycle_iteration, week_number, day_index);
                self.resolve_program_day(program_id, maxes, &coordinate)
            })
            .collect()
    }
}
