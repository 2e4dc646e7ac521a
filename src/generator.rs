//! End-to-end generation: validate, derive, place, replicate, measure.

use std::time::Instant;

use log::{info, warn};

use crate::assignments::{self, Assignment};
use crate::config::GeneratorConfig;
use crate::data::{
    GenerationInput, GenerationOutput, SemesterSchedule, Shortfall, WeekIndex, new_id,
};
use crate::error::ValidationError;
use crate::scheduler;
use crate::stats::{self, RunSummary};

/// Checks the run's preconditions in a fixed order and returns the number of
/// weeks in the semester.
pub fn validate_input(
    input: &GenerationInput,
    config: &GeneratorConfig,
) -> Result<WeekIndex, ValidationError> {
    if input.teachers.is_empty() {
        return Err(ValidationError::NoTeachers);
    }
    if input.groups.is_empty() {
        return Err(ValidationError::NoGroups);
    }
    if input.subjects.is_empty() {
        return Err(ValidationError::NoSubjects);
    }
    if input.rooms.is_empty() {
        return Err(ValidationError::NoRooms);
    }

    let weeks = input.semester_weeks.unwrap_or(config.default_semester_weeks);
    if weeks == 0 {
        return Err(ValidationError::NoWeeks);
    }
    if weeks > config.max_semester_weeks {
        return Err(ValidationError::TooManyWeeks {
            weeks,
            max: config.max_semester_weeks,
        });
    }
    Ok(weeks)
}

/// Generates a full semester schedule for `input`.
///
/// Only the preconditions in [`validate_input`] fail the run. Everything the
/// scheduler could not honour is reported through the output's statistics
/// and diagnostics.
pub fn generate(
    input: &GenerationInput,
    config: &GeneratorConfig,
) -> Result<GenerationOutput, ValidationError> {
    let start_time = Instant::now();
    let semester_weeks = validate_input(input, config)?;

    info!(
        "Generating schedule for {} groups, {} subjects, {} teachers over {} weeks",
        input.groups.len(),
        input.subjects.len(),
        input.teachers.len(),
        semester_weeks
    );

    let derivation = assignments::derive_assignments(input, semester_weeks, config);
    let room = &input.rooms[0];
    let placement = scheduler::place_week(
        &derivation.assignments,
        &input.groups,
        input.teachers.len(),
        room,
        config,
    );

    let shortfalls = collect_shortfalls(&derivation.assignments, &placement.placed);
    for shortfall in &shortfalls {
        warn!("Under-placed: {}", shortfall);
    }

    let schedule = SemesterSchedule {
        id: new_id("sched"),
        semester_label: input
            .semester_label
            .clone()
            .unwrap_or_else(|| config.semester_label.clone()),
        weeks: scheduler::replicate_week(&placement.lessons, semester_weeks),
    };

    let stats = stats::aggregate(
        &schedule,
        input,
        config.hours_per_pair,
        RunSummary {
            shortfalls,
            iterations: placement.iterations,
            timed_out: placement.timed_out,
        },
    );

    info!(
        "Generated {} lessons ({} per week) in {:.2?}: {} conflicts, {}% satisfied, \
         load balance {}, {} under-placed",
        stats.total_lessons,
        stats.lessons_per_week,
        start_time.elapsed(),
        stats.conflicts,
        stats.satisfaction_rate,
        stats.teacher_load_balance,
        stats.shortfalls.len()
    );

    Ok(GenerationOutput {
        schedule,
        stats,
        diagnostics: derivation.diagnostics,
    })
}

fn collect_shortfalls(assignments: &[Assignment<'_>], placed: &[u32]) -> Vec<Shortfall> {
    assignments
        .iter()
        .zip(placed)
        .filter(|(assignment, placed)| **placed < assignment.required_pairs)
        .map(|(assignment, placed)| Shortfall {
            group_name: assignment.group.name.clone(),
            subject_name: assignment.subject.name.clone(),
            teacher_name: assignment.teacher.full_name.clone(),
            required_pairs: assignment.required_pairs,
            placed_pairs: *placed,
        })
        .collect()
}
