use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use crate::data::{
    GenerationInput, GroupLoad, SemesterSchedule, Shortfall, Statistics, Teacher,
    TeacherPreference, TeacherSatisfaction, Weekday,
};
use crate::preference::PreferenceRules;
use crate::resolver::PreferenceIndex;

const UNKNOWN_GROUP: &str = "Unknown group";

/// Outcome of the placement loop that statistics report alongside the lesson metrics.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub shortfalls: Vec<Shortfall>,
    pub iterations: u32,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Occupant {
    Teacher,
    Group,
}

/// Computes every statistic over `schedule`.
pub fn aggregate(
    schedule: &SemesterSchedule,
    input: &GenerationInput,
    hours_per_pair: u32,
    run: RunSummary,
) -> Statistics {
    let total_lessons = schedule.lessons().count() as u32;
    let lessons_per_week = schedule
        .weeks
        .first()
        .map(|week| week.lessons.len() as u32)
        .unwrap_or(0);

    let satisfaction = teacher_satisfaction(schedule, &input.teachers, &input.preferences);
    let satisfaction_rate = percentage(satisfaction.satisfied, satisfaction.total);

    Statistics {
        total_lessons,
        lessons_per_week,
        satisfied_preferences: satisfaction.satisfied,
        total_preferences: satisfaction.total,
        conflicts: count_conflicts(schedule),
        satisfaction_rate,
        teacher_load_balance: teacher_load_balance(schedule),
        teacher_satisfaction: satisfaction.per_teacher,
        group_loads: group_loads(schedule, input, hours_per_pair),
        shortfalls: run.shortfalls,
        iterations: run.iterations,
        timed_out: run.timed_out,
    }
}

/// Replays every week into a fresh occupancy set and counts the keys booked
/// more than once.
pub fn count_conflicts(schedule: &SemesterSchedule) -> u32 {
    let mut conflicts = 0;
    for week in &schedule.weeks {
        let mut seen = HashSet::new();
        let mut repeated = HashSet::new();
        for lesson in &week.lessons {
            let keys = [
                (Occupant::Teacher, lesson.weekday, lesson.pair_index, lesson.teacher_id.as_str()),
                (Occupant::Group, lesson.weekday, lesson.pair_index, lesson.group_id.as_str()),
            ];
            for key in keys {
                if !seen.insert(key) {
                    repeated.insert(key);
                }
            }
        }
        conflicts += repeated.len() as u32;
    }
    conflicts
}

#[derive(Debug, Default)]
struct SatisfactionTally {
    per_teacher: Vec<TeacherSatisfaction>,
    /// Over preference-bearing lessons only.
    satisfied: u32,
    total: u32,
}

/// Per-teacher satisfaction in order of first appearance. Lessons of
/// teachers without a preference always count as satisfied.
fn teacher_satisfaction(
    schedule: &SemesterSchedule,
    teachers: &[Teacher],
    preferences: &[TeacherPreference],
) -> SatisfactionTally {
    let mut by_id: HashMap<&str, &Teacher> = HashMap::with_capacity(teachers.len());
    for teacher in teachers {
        by_id.entry(teacher.id.as_str()).or_insert(teacher);
    }
    let preference_index = PreferenceIndex::new(preferences);
    let mut rules: HashMap<&str, Option<PreferenceRules>> = HashMap::new();

    let mut tally = SatisfactionTally::default();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for lesson in schedule.lessons() {
        let Some(&teacher) = by_id.get(lesson.teacher_id.as_str()) else {
            continue;
        };
        let Some(day) = Weekday::from_number(lesson.weekday) else {
            continue;
        };
        let teacher_rules = rules.entry(teacher.id.as_str()).or_insert_with(|| {
            preference_index
                .for_teacher(teacher)
                .map(|p| PreferenceRules::parse(&p.schedule_preference))
        });

        let satisfied = match teacher_rules {
            Some(parsed) => {
                let ok = parsed.is_satisfied(day, lesson.pair_index);
                tally.total += 1;
                tally.satisfied += u32::from(ok);
                ok
            }
            None => true,
        };

        let position = *positions
            .entry(teacher.full_name.as_str())
            .or_insert_with(|| {
                tally.per_teacher.push(TeacherSatisfaction {
                    teacher_name: teacher.full_name.clone(),
                    satisfied: 0,
                    total: 0,
                    rate: 100,
                });
                tally.per_teacher.len() - 1
            });
        let entry = &mut tally.per_teacher[position];
        entry.total += 1;
        entry.satisfied += u32::from(satisfied);
        entry.rate = percentage(entry.satisfied, entry.total);
    }

    tally
}

/// `max(0, 100 - round(stddev / mean * 100))` over lessons per teacher; 100
/// for an empty schedule.
pub fn teacher_load_balance(schedule: &SemesterSchedule) -> u32 {
    let loads: Vec<f64> = schedule
        .lessons()
        .counts_by(|lesson| lesson.teacher_id.as_str())
        .into_values()
        .map(|count| count as f64)
        .collect();
    if loads.is_empty() {
        return 100;
    }

    let mean = loads.iter().sum::<f64>() / loads.len() as f64;
    if mean <= 0.0 {
        return 100;
    }
    let variance = loads.iter().map(|load| (load - mean).powi(2)).sum::<f64>() / loads.len() as f64;
    let spread = (variance.sqrt() / mean * 100.0).round();
    (100.0 - spread).max(0.0) as u32
}

fn group_loads(
    schedule: &SemesterSchedule,
    input: &GenerationInput,
    hours_per_pair: u32,
) -> Vec<GroupLoad> {
    let mut names: HashMap<&str, &str> = HashMap::with_capacity(input.groups.len());
    for group in &input.groups {
        names.entry(group.id.as_str()).or_insert(group.name.as_str());
    }

    let mut loads: Vec<GroupLoad> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for lesson in schedule.lessons() {
        let position = *positions.entry(lesson.group_id.as_str()).or_insert_with(|| {
            let name = names.get(lesson.group_id.as_str()).copied().unwrap_or(UNKNOWN_GROUP);
            loads.push(GroupLoad {
                group_name: name.to_string(),
                lessons: 0,
                hours: 0,
            });
            loads.len() - 1
        });
        let load = &mut loads[position];
        load.lessons += 1;
        load.hours += hours_per_pair;
    }
    loads
}

fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 100;
    }
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
}
