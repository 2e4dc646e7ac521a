use thiserror::Error;

/// Preconditions checked before a generation run. Data-quality problems
/// inside the collections are never reported here; they end up in the
/// run's diagnostics instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no teachers supplied: add at least one teacher")]
    NoTeachers,

    #[error("no groups supplied: add at least one group")]
    NoGroups,

    #[error("no subjects supplied: add at least one subject")]
    NoSubjects,

    #[error("no rooms supplied: add at least one room")]
    NoRooms,

    #[error("semester must span at least one week")]
    NoWeeks,

    #[error("semester of {weeks} weeks exceeds the limit of {max}")]
    TooManyWeeks { weeks: u32, max: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}
