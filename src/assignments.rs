//! Derives weekly scheduling obligations from (group, subject) pairs.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::{GeneratorConfig, WeeklyPairs};
use crate::data::{
    AmbiguousTeacher, Diagnostics, GenerationInput, Group, SkipReason, SkippedSubject, Subject,
    Teacher, TeacherPreference, WeekIndex,
};
use crate::preference::PreferenceRules;
use crate::resolver::{self, PreferenceIndex, TeacherIndex};

/// One group taking one subject with one teacher, `required_pairs` times a week.
#[derive(Debug, Clone)]
pub struct Assignment<'a> {
    pub group: &'a Group,
    /// Position of the group in the input list; the last tie-break when ordering.
    pub group_index: usize,
    pub subject: &'a Subject,
    pub teacher: &'a Teacher,
    pub preference: Option<&'a TeacherPreference>,
    /// Parsed `preference` text; empty when there is none.
    pub rules: PreferenceRules,
    pub required_pairs: u32,
}

impl Assignment<'_> {
    pub fn has_preference(&self) -> bool {
        self.preference.is_some()
    }
}

#[derive(Debug)]
pub struct Derivation<'a> {
    pub assignments: Vec<Assignment<'a>>,
    pub diagnostics: Diagnostics,
}

/// Pairs per week a subject needs under the configured policy. Never below 1.
pub fn required_pairs(
    subject: &Subject,
    semester_weeks: WeekIndex,
    config: &GeneratorConfig,
) -> u32 {
    let hours_per_pair = f64::from(config.hours_per_pair.max(1));
    let hours_per_week = match config.weekly_pairs {
        WeeklyPairs::TotalHours => subject.total_hours / f64::from(semester_weeks.max(1)),
        WeeklyPairs::HoursPerUnit => subject.hours_per_unit,
    };
    let pairs = (hours_per_week / hours_per_pair).ceil();
    if pairs.is_finite() && pairs > 1.0 {
        pairs as u32
    } else {
        1
    }
}

/// Builds every assignment of the run.
///
/// Subjects without hours and subjects whose teacher cannot be resolved are
/// skipped and recorded in the returned diagnostics; nothing here fails.
pub fn derive_assignments<'a>(
    input: &'a GenerationInput,
    semester_weeks: WeekIndex,
    config: &GeneratorConfig,
) -> Derivation<'a> {
    let teacher_index = TeacherIndex::new(&input.teachers);
    let preference_index = PreferenceIndex::new(&input.preferences);
    debug!(
        "Indexed {} teachers and {} preferences",
        teacher_index.len(),
        preference_index.len()
    );

    let mut assignments = Vec::new();
    let mut diagnostics = Diagnostics::default();
    let mut reported_ambiguities = HashSet::new();

    for (group_index, group) in input.groups.iter().enumerate() {
        let mut matched_any = false;

        for subject in input
            .subjects
            .iter()
            .filter(|s| resolver::group_matches_subject(&group.name, &s.groups))
        {
            matched_any = true;

            if subject.total_hours.is_nan() || subject.total_hours <= 0.0 {
                warn!(
                    "Subject '{}' for group '{}' has no hours (total_hours={})",
                    subject.name, group.name, subject.total_hours
                );
                diagnostics.skipped_subjects.push(SkippedSubject {
                    group_name: group.name.clone(),
                    subject_name: subject.name.clone(),
                    reason: SkipReason::NoHours,
                });
                continue;
            }

            let Some(found) = teacher_index.resolve(&subject.teacher_name) else {
                warn!(
                    "Teacher '{}' for subject '{}' (group '{}') not found",
                    subject.teacher_name, subject.name, group.name
                );
                diagnostics.skipped_subjects.push(SkippedSubject {
                    group_name: group.name.clone(),
                    subject_name: subject.name.clone(),
                    reason: SkipReason::TeacherNotFound {
                        raw_name: subject.teacher_name.clone(),
                    },
                });
                continue;
            };

            if found.is_ambiguous() && reported_ambiguities.insert(subject.teacher_name.clone()) {
                let candidates = resolver::candidate_names(&found);
                warn!(
                    "Teacher name '{}' is ambiguous ({:?}), using '{}'",
                    subject.teacher_name, candidates, found.teacher.full_name
                );
                diagnostics.ambiguous_teachers.push(AmbiguousTeacher {
                    raw_name: subject.teacher_name.clone(),
                    chosen: found.teacher.full_name.clone(),
                    candidates,
                });
            }

            let preference = preference_index.for_teacher(found.teacher);
            let rules = preference
                .map(|p| PreferenceRules::parse(&p.schedule_preference))
                .unwrap_or_default();

            assignments.push(Assignment {
                group,
                group_index,
                subject,
                teacher: found.teacher,
                preference,
                rules,
                required_pairs: required_pairs(subject, semester_weeks, config),
            });
        }

        if !matched_any {
            warn!(
                "Group '{}' is not listed by any subject; check the subjects' groups field",
                group.name
            );
            diagnostics.unmatched_groups.push(group.name.clone());
        }
    }

    info!(
        "Derived {} assignments for {} groups ({} skipped subjects)",
        assignments.len(),
        input.groups.len(),
        diagnostics.skipped_subjects.len()
    );

    Derivation {
        assignments,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Room;

    fn input() -> GenerationInput {
        GenerationInput::new(
            vec![
                Teacher::new("t1", "Иванов И.И."),
                Teacher::new("t2", "Смирнова Е.А."),
            ],
            vec![Group::new("g1", "G1"), Group::new("g2", "G2"), Group::new("g3", "X9")],
            vec![
                Subject::new("s1", "Алгоритмы", 84.0)
                    .with_groups("G1, G2")
                    .with_teacher("Иванов И.И."),
                Subject::new("s2", "Дизайн", 0.0)
                    .with_groups("G1")
                    .with_teacher("Смирнова Е.А."),
                Subject::new("s3", "Сети", 42.0)
                    .with_groups("G2")
                    .with_teacher("Кузнецов"),
            ],
            vec![Room::new("r1", "301")],
        )
        .with_preferences(vec![TeacherPreference::new("иванов и.и.", "только пн")])
    }

    #[test]
    fn test_required_pairs_from_total_hours() {
        let config = GeneratorConfig::default();
        // 84 / 21 = 4 hours a week = 2 pairs
        assert_eq!(required_pairs(&Subject::new("s", "s", 84.0), 21, &config), 2);
        // 42 / 21 = 2 hours = 1 pair
        assert_eq!(required_pairs(&Subject::new("s", "s", 42.0), 21, &config), 1);
        // 50 / 21 = 2.38 hours, rounded up
        assert_eq!(required_pairs(&Subject::new("s", "s", 50.0), 21, &config), 2);
        // never below one pair
        assert_eq!(required_pairs(&Subject::new("s", "s", 1.0), 21, &config), 1);
    }

    #[test]
    fn test_required_pairs_from_hours_per_unit() {
        let config = GeneratorConfig {
            weekly_pairs: WeeklyPairs::HoursPerUnit,
            ..GeneratorConfig::default()
        };
        let subject = Subject::new("s", "s", 84.0).with_hours_per_unit(6.0);
        assert_eq!(required_pairs(&subject, 21, &config), 3);
        let subject = Subject::new("s", "s", 84.0);
        assert_eq!(required_pairs(&subject, 21, &config), 1);
    }

    #[test]
    fn test_derive_assignments() {
        let input = input();
        let derivation = derive_assignments(&input, 21, &GeneratorConfig::default());

        let pairs: Vec<(&str, &str, u32)> = derivation
            .assignments
            .iter()
            .map(|a| (a.group.id.as_str(), a.subject.id.as_str(), a.required_pairs))
            .collect();
        assert_eq!(pairs, vec![("g1", "s1", 2), ("g2", "s1", 2)]);

        let first = &derivation.assignments[0];
        assert_eq!(first.teacher.id, "t1");
        assert!(first.has_preference());
        assert!(!first.rules.is_empty());
        assert_eq!(derivation.assignments[1].group_index, 1);
    }

    #[test]
    fn test_derive_records_skips() {
        let input = input();
        let diagnostics = derive_assignments(&input, 21, &GeneratorConfig::default()).diagnostics;

        assert_eq!(
            diagnostics.skipped_subjects,
            vec![
                SkippedSubject {
                    group_name: "G1".into(),
                    subject_name: "Дизайн".into(),
                    reason: SkipReason::NoHours,
                },
                SkippedSubject {
                    group_name: "G2".into(),
                    subject_name: "Сети".into(),
                    reason: SkipReason::TeacherNotFound {
                        raw_name: "Кузнецов".into()
                    },
                },
            ]
        );
        assert_eq!(diagnostics.unmatched_groups, vec!["X9".to_string()]);
        assert!(diagnostics.ambiguous_teachers.is_empty());
    }

    #[test]
    fn test_ambiguous_teacher_reported_once() {
        let input = GenerationInput::new(
            vec![
                Teacher::new("t1", "Петрова А.С."),
                Teacher::new("t2", "Петров О.В."),
            ],
            vec![Group::new("g1", "G1"), Group::new("g2", "G2")],
            vec![Subject::new("s1", "Физика", 42.0)
                .with_groups("G1 G2")
                .with_teacher("Петров")],
            vec![Room::new("r1", "301")],
        );
        let derivation = derive_assignments(&input, 21, &GeneratorConfig::default());

        assert_eq!(derivation.assignments.len(), 2);
        assert!(derivation.assignments.iter().all(|a| a.teacher.id == "t1"));
        assert_eq!(
            derivation.diagnostics.ambiguous_teachers,
            vec![AmbiguousTeacher {
                raw_name: "Петров".into(),
                chosen: "Петрова А.С.".into(),
                candidates: vec!["Петрова А.С.".into(), "Петров О.В.".into()],
            }]
        );
    }
}
