use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// Type aliases for clarity
pub type EntityId = String;
pub type WeekIndex = u32;
pub type PairIndex = u8;

/// Fresh record id such as `l_6f1c...`.
pub fn new_id(prefix: &str) -> EntityId {
    format!("{prefix}_{}", Uuid::new_v4())
}

/// Number of teaching days in the weekly grid.
pub const DAYS_PER_WEEK: usize = 5;
/// Number of pairs (double periods) per teaching day.
pub const PAIRS_PER_DAY: PairIndex = 4;

/// A teaching day. Numbered 1=Monday .. 5=Friday on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
}

impl Weekday {
    pub const ALL: [Weekday; DAYS_PER_WEEK] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// Short day token as it appears in preference texts.
    pub fn token(self) -> &'static str {
        match self {
            Weekday::Monday => "пн",
            Weekday::Tuesday => "вт",
            Weekday::Wednesday => "ср",
            Weekday::Thursday => "чт",
            Weekday::Friday => "пт",
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize - 1
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A teacher. `full_name` is the key subjects and preferences refer to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: EntityId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Teacher {
    pub fn new(id: impl Into<EntityId>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            number: None,
            short_name: None,
            email: None,
            phone: None,
            is_online: None,
            notes: None,
        }
    }
}

/// A student group, e.g. "1ИТ1.9.25".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl Group {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            faculty: None,
            size: None,
        }
    }
}

/// Represents a physical room. Only its existence matters to the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: EntityId,
    pub number: String,
    #[serde(rename = "type", default)]
    pub room_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
}

impl Room {
    pub fn new(id: impl Into<EntityId>, number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            room_type: "other".to_string(),
            additional_type: None,
            capacity: None,
            equipment: Vec::new(),
        }
    }
}

/// A subject as entered by the curriculum office.
///
/// `groups` and `teacher_name` are free text and get resolved against the
/// group and teacher lists at generation time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: EntityId,
    #[serde(default)]
    pub direction: String,
    pub name: String,
    /// Academic hours over the whole semester.
    #[serde(default)]
    pub total_hours: f64,
    /// Hours per week, used by the hours-per-unit pair policy.
    #[serde(default)]
    pub hours_per_unit: f64,
    #[serde(default)]
    pub groups: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week21: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
}

impl Subject {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, total_hours: f64) -> Self {
        Self {
            id: id.into(),
            direction: String::new(),
            name: name.into(),
            total_hours,
            hours_per_unit: 0.0,
            groups: String::new(),
            teacher_name: String::new(),
            week21: None,
            course: None,
        }
    }

    pub fn with_groups(mut self, groups: impl Into<String>) -> Self {
        self.groups = groups.into();
        self
    }

    pub fn with_teacher(mut self, teacher_name: impl Into<String>) -> Self {
        self.teacher_name = teacher_name.into();
        self
    }

    pub fn with_hours_per_unit(mut self, hours_per_unit: f64) -> Self {
        self.hours_per_unit = hours_per_unit;
        self
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = direction.into();
        self
    }
}

/// A teacher's free-text wish list, e.g. "Не занимать ВТ и ЧТ".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherPreference {
    #[serde(default)]
    pub id: EntityId,
    pub teacher_full_name: String,
    #[serde(default)]
    pub schedule_preference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<f64>,
}

impl TeacherPreference {
    pub fn new(
        teacher_full_name: impl Into<String>,
        schedule_preference: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            teacher_full_name: teacher_full_name.into(),
            schedule_preference: schedule_preference.into(),
            satisfaction: None,
        }
    }
}

/// The complete input for one generation run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInput {
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub preferences: Vec<TeacherPreference>,
    /// Falls back to the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_weeks: Option<WeekIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_label: Option<String>,
}

impl GenerationInput {
    pub fn new(
        teachers: Vec<Teacher>,
        groups: Vec<Group>,
        subjects: Vec<Subject>,
        rooms: Vec<Room>,
    ) -> Self {
        Self {
            teachers,
            groups,
            subjects,
            rooms,
            ..Self::default()
        }
    }

    pub fn with_preferences(mut self, preferences: Vec<TeacherPreference>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_semester_weeks(mut self, weeks: WeekIndex) -> Self {
        self.semester_weeks = Some(weeks);
        self
    }
}

/// One placed lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: EntityId,
    pub week_index: WeekIndex,
    /// 1=Monday .. 5=Friday
    pub weekday: u8,
    /// 1..=4
    pub pair_index: PairIndex,
    pub group_id: EntityId,
    pub subject_id: EntityId,
    pub teacher_id: EntityId,
    pub room_id: EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    pub id: EntityId,
    pub week_index: WeekIndex,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterSchedule {
    pub id: EntityId,
    pub semester_label: String,
    pub weeks: Vec<WeeklySchedule>,
}

impl SemesterSchedule {
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.weeks.iter().flat_map(|week| week.lessons.iter())
    }
}

/// Satisfaction tally for one teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSatisfaction {
    pub teacher_name: String,
    pub satisfied: u32,
    pub total: u32,
    /// 0..=100
    pub rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLoad {
    pub group_name: String,
    pub lessons: u32,
    pub hours: u32,
}

/// An assignment that ended below its weekly pair count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub group_name: String,
    pub subject_name: String,
    pub teacher_name: String,
    pub required_pairs: u32,
    pub placed_pairs: u32,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} ({}): {} of {} pairs placed",
            self.group_name,
            self.subject_name,
            self.teacher_name,
            self.placed_pairs,
            self.required_pairs
        )
    }
}

/// Post-hoc statistics over the whole semester.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_lessons: u32,
    pub lessons_per_week: u32,
    pub satisfied_preferences: u32,
    pub total_preferences: u32,
    pub conflicts: u32,
    /// 0..=100
    pub satisfaction_rate: u32,
    /// 0..=100
    pub teacher_load_balance: u32,
    pub teacher_satisfaction: Vec<TeacherSatisfaction>,
    pub group_loads: Vec<GroupLoad>,
    pub shortfalls: Vec<Shortfall>,
    pub iterations: u32,
    pub timed_out: bool,
}

/// Why a (group, subject) pair produced no assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SkipReason {
    NoHours,
    TeacherNotFound {
        #[serde(rename = "rawName")]
        raw_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSubject {
    pub group_name: String,
    pub subject_name: String,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::NoHours => write!(
                f,
                "[no hours] subject '{}' for group '{}' has no hours",
                self.subject_name, self.group_name
            ),
            SkipReason::TeacherNotFound { raw_name } => write!(
                f,
                "[teacher not found] '{}' for subject '{}' (group '{}')",
                raw_name, self.subject_name, self.group_name
            ),
        }
    }
}

/// A fuzzy teacher lookup that had more than one plausible hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguousTeacher {
    pub raw_name: String,
    pub chosen: String,
    pub candidates: Vec<String>,
}

/// Everything the resolver could not match cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub skipped_subjects: Vec<SkippedSubject>,
    pub unmatched_groups: Vec<String>,
    pub ambiguous_teachers: Vec<AmbiguousTeacher>,
}

/// The final output of the generator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub schedule: SemesterSchedule,
    pub stats: Statistics,
    pub diagnostics: Diagnostics,
}
