use std::collections::HashMap;

use itertools::Itertools;
use log::trace;

use crate::data::{Teacher, TeacherPreference};

const GROUP_SEPARATORS: [char; 5] = [',', ' ', ';', '\n', '\t'];

/// Lowercased, trimmed matching key.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether `group_name` is one of the groups listed in a subject's raw groups field.
///
/// Checks, in order: whole-string equality, token equality or containment in
/// either direction, then plain substring search on the raw string.
pub fn group_matches_subject(group_name: &str, subject_groups_raw: &str) -> bool {
    let group = normalize(group_name);
    if group.is_empty() {
        return false;
    }
    let raw = normalize(subject_groups_raw);
    if raw == group {
        return true;
    }

    let token_hit = raw
        .split(&GROUP_SEPARATORS[..])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .any(|token| token == group || token.contains(&group) || group.contains(token));

    token_hit || raw.contains(&group)
}

/// How a teacher name was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Exact,
    /// First token (surname) of the raw name against the teacher keys.
    Surname,
    /// Either name contains the other.
    Substring,
}

#[derive(Debug, Clone)]
pub struct TeacherMatch<'a> {
    pub teacher: &'a Teacher,
    pub method: MatchMethod,
    /// Every teacher the winning step accepted, in declaration order. The
    /// chosen teacher is always first.
    pub candidates: Vec<&'a Teacher>,
}

impl TeacherMatch<'_> {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// Teachers keyed by normalized full name, in declaration order.
#[derive(Debug)]
pub struct TeacherIndex<'a> {
    entries: Vec<(String, &'a Teacher)>,
    by_key: HashMap<String, &'a Teacher>,
}

impl<'a> TeacherIndex<'a> {
    /// Duplicate names keep the first declared teacher.
    pub fn new(teachers: &'a [Teacher]) -> Self {
        let mut entries = Vec::with_capacity(teachers.len());
        let mut by_key = HashMap::with_capacity(teachers.len());
        for teacher in teachers {
            let key = normalize(&teacher.full_name);
            if by_key.contains_key(&key) {
                continue;
            }
            by_key.insert(key.clone(), teacher);
            entries.push((key, teacher));
        }
        Self { entries, by_key }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a subject's raw teacher name.
    ///
    /// 1. exact match on the normalized name;
    /// 2. the raw name's first token against each key's first token, or
    ///    contained in the key, or containing the key's first token;
    /// 3. either of key and raw name containing the other.
    pub fn resolve(&self, raw_name: &str) -> Option<TeacherMatch<'a>> {
        let raw = normalize(raw_name);
        if raw.is_empty() {
            return None;
        }

        if let Some(&teacher) = self.by_key.get(&raw) {
            return Some(TeacherMatch {
                teacher,
                method: MatchMethod::Exact,
                candidates: vec![teacher],
            });
        }

        if let Some(surname) = raw.split_whitespace().next() {
            let hits = self.scan(|key| {
                let key_first = key.split_whitespace().next().unwrap_or_default();
                key_first == surname || key.contains(surname) || surname.contains(key_first)
            });
            if let Some(found) = Self::pick(hits, MatchMethod::Surname) {
                trace!("Resolved teacher '{}' by surname '{}'", raw_name, surname);
                return Some(found);
            }
        }

        let hits = self.scan(|key| key.contains(raw.as_str()) || raw.contains(key));
        let found = Self::pick(hits, MatchMethod::Substring);
        if found.is_some() {
            trace!("Resolved teacher '{}' by substring", raw_name);
        }
        found
    }

    fn scan(&self, accept: impl Fn(&str) -> bool) -> Vec<&'a Teacher> {
        self.entries
            .iter()
            .filter(|(key, _)| !key.is_empty() && accept(key))
            .map(|(_, teacher)| *teacher)
            .collect()
    }

    fn pick(candidates: Vec<&'a Teacher>, method: MatchMethod) -> Option<TeacherMatch<'a>> {
        let teacher = *candidates.first()?;
        Some(TeacherMatch {
            teacher,
            method,
            candidates,
        })
    }
}

/// Preferences keyed by normalized teacher name. The first record per
/// teacher wins; later duplicates are ignored.
#[derive(Debug, Default)]
pub struct PreferenceIndex<'a> {
    by_key: HashMap<String, &'a TeacherPreference>,
}

impl<'a> PreferenceIndex<'a> {
    pub fn new(preferences: &'a [TeacherPreference]) -> Self {
        let mut by_key = HashMap::with_capacity(preferences.len());
        for preference in preferences {
            by_key
                .entry(normalize(&preference.teacher_full_name))
                .or_insert(preference);
        }
        Self { by_key }
    }

    pub fn for_teacher(&self, teacher: &Teacher) -> Option<&'a TeacherPreference> {
        self.by_key.get(&normalize(&teacher.full_name)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Names of the candidates, for logs and diagnostics.
pub fn candidate_names(found: &TeacherMatch<'_>) -> Vec<String> {
    found
        .candidates
        .iter()
        .map(|teacher| teacher.full_name.clone())
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teachers() -> Vec<Teacher> {
        vec![
            Teacher::new("t1", "Иванов Иван Иванович"),
            Teacher::new("t2", "Петрова Анна Сергеевна"),
            Teacher::new("t3", "Петров Олег Викторович"),
        ]
    }

    #[test]
    fn test_group_exact_and_token_matches() {
        assert!(group_matches_subject("1ИТ1.9.25", "1ит1.9.25"));
        assert!(group_matches_subject("1ИТ1.9.25", "2Д1.9.24, 1ИТ1.9.25"));
        assert!(group_matches_subject("1ИТ1.9.25", "2Д1.9.24;1ИТ1.9.25\n3ИТ"));
        assert!(group_matches_subject(" G1 ", "G1\tG2"));
    }

    #[test]
    fn test_group_partial_token_matches() {
        // Token contains the group name
        assert!(group_matches_subject("1ИТ1", "1ИТ1.9.25"));
        // Group name contains the token
        assert!(group_matches_subject("1ИТ1.9.25", "1ИТ1"));
    }

    #[test]
    fn test_group_no_match() {
        assert!(!group_matches_subject("2Д1.9.24", "1ИТ1.9.25, 1ИТП1.11.252"));
        assert!(!group_matches_subject("G3", ""));
    }

    #[test]
    fn test_blank_group_name_matches_nothing() {
        assert!(!group_matches_subject("  ", "G1, G2"));
    }

    #[test]
    fn test_resolve_exact() {
        let teachers = teachers();
        let index = TeacherIndex::new(&teachers);

        let found = index.resolve("  иванов иван иванович ").unwrap();
        assert_eq!(found.teacher.id, "t1");
        assert_eq!(found.method, MatchMethod::Exact);
        assert!(!found.is_ambiguous());
    }

    #[test]
    fn test_resolve_by_surname() {
        let teachers = teachers();
        let index = TeacherIndex::new(&teachers);

        let found = index.resolve("Иванов И.И.").unwrap();
        assert_eq!(found.teacher.id, "t1");
        assert_eq!(found.method, MatchMethod::Surname);
    }

    #[test]
    fn test_surname_ambiguity_picks_first_declared() {
        let teachers = teachers();
        let index = TeacherIndex::new(&teachers);

        // "петров" is contained in "петрова анна сергеевна" as well
        let found = index.resolve("Петров О.В.").unwrap();
        assert_eq!(found.teacher.id, "t2");
        assert!(found.is_ambiguous());
        assert_eq!(
            candidate_names(&found),
            vec!["Петрова Анна Сергеевна", "Петров Олег Викторович"]
        );
    }

    #[test]
    fn test_resolve_by_substring() {
        let teachers = vec![Teacher::new("t1", "Анна")];
        let index = TeacherIndex::new(&teachers);

        // First token "преп." misses, but the raw name contains the key
        let found = index.resolve("преп. анна").unwrap();
        assert_eq!(found.teacher.id, "t1");
        assert_eq!(found.method, MatchMethod::Substring);
    }

    #[test]
    fn test_resolve_not_found() {
        let teachers = teachers();
        let index = TeacherIndex::new(&teachers);

        assert!(index.resolve("Сидоров С.С.").is_none());
        assert!(index.resolve("   ").is_none());
    }

    #[test]
    fn test_duplicate_teacher_names_keep_first() {
        let teachers = vec![Teacher::new("a", "Иванов И.И."), Teacher::new("b", "иванов и.и.")];
        let index = TeacherIndex::new(&teachers);

        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("Иванов И.И.").unwrap().teacher.id, "a");
    }

    #[test]
    fn test_preference_lookup_first_wins() {
        let preferences = vec![
            TeacherPreference::new("Иванов И.И.", "только пн"),
            TeacherPreference::new(" ИВАНОВ И.И.", "только пт"),
        ];
        let index = PreferenceIndex::new(&preferences);
        let teacher = Teacher::new("t1", "иванов и.и.");

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.for_teacher(&teacher).unwrap().schedule_preference,
            "только пн"
        );
        assert!(index.for_teacher(&Teacher::new("t2", "Петров")).is_none());
    }
}
