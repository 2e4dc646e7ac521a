//! Runtime configuration from `SCHEDULE_*` variables. Blank means unset.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const MAX_ITERATIONS_KEY: &str = "SCHEDULE_MAX_ITERATIONS";
pub const HOURS_PER_PAIR_KEY: &str = "SCHEDULE_HOURS_PER_PAIR";
pub const DEFAULT_WEEKS_KEY: &str = "SCHEDULE_DEFAULT_WEEKS";
pub const MAX_WEEKS_KEY: &str = "SCHEDULE_MAX_WEEKS";
pub const SEMESTER_LABEL_KEY: &str = "SCHEDULE_SEMESTER_LABEL";
pub const TIME_BUDGET_KEY: &str = "SCHEDULE_TIME_BUDGET_MS";
pub const WEEKLY_PAIRS_KEY: &str = "SCHEDULE_WEEKLY_PAIRS";
pub const BIND_ADDR_KEY: &str = "SCHEDULE_BIND_ADDR";

/// How many pairs per week a subject needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeeklyPairs {
    /// `ceil(total_hours / weeks / hours_per_pair)`
    #[default]
    TotalHours,
    /// `ceil(hours_per_unit / hours_per_pair)`
    HoursPerUnit,
}

impl FromStr for WeeklyPairs {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "total-hours" | "total_hours" => Ok(WeeklyPairs::TotalHours),
            "hours-per-unit" | "hours_per_unit" => Ok(WeeklyPairs::HoursPerUnit),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Upper bound on placement passes over the representative week.
    pub max_iterations: u32,
    pub hours_per_pair: u32,
    /// Used when the request does not name a semester length.
    pub default_semester_weeks: u32,
    /// Longest semester a request may ask for; every week is materialised.
    pub max_semester_weeks: u32,
    pub semester_label: String,
    /// Wall-clock budget for the placement loop. `None` = unbounded.
    pub time_budget: Option<Duration>,
    pub weekly_pairs: WeeklyPairs,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            hours_per_pair: 2,
            default_semester_weeks: 21,
            max_semester_weeks: 52,
            semester_label: "2 семестр 2025-26".to_string(),
            time_budget: None,
            weekly_pairs: WeeklyPairs::TotalHours,
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = parse_var(&lookup, MAX_ITERATIONS_KEY)? {
            config.max_iterations = value;
        }
        if let Some(raw) = read_var(&lookup, HOURS_PER_PAIR_KEY) {
            config.hours_per_pair = match raw.parse::<u32>() {
                Ok(hours) if hours > 0 => hours,
                _ => return Err(invalid(HOURS_PER_PAIR_KEY, raw)),
            };
        }
        if let Some(value) = parse_var(&lookup, DEFAULT_WEEKS_KEY)? {
            config.default_semester_weeks = value;
        }
        if let Some(value) = parse_var(&lookup, MAX_WEEKS_KEY)? {
            config.max_semester_weeks = value;
        }
        if let Some(label) = read_var(&lookup, SEMESTER_LABEL_KEY) {
            config.semester_label = label;
        }
        if let Some(millis) = parse_var::<u64>(&lookup, TIME_BUDGET_KEY)? {
            config.time_budget = Some(Duration::from_millis(millis));
        }
        if let Some(raw) = read_var(&lookup, WEEKLY_PAIRS_KEY) {
            config.weekly_pairs = raw.parse().map_err(|_| invalid(WEEKLY_PAIRS_KEY, raw))?;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(addr) = parse_var(&lookup, BIND_ADDR_KEY)? {
            config.bind_addr = addr;
        }
        Ok(config)
    }
}

fn read_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match read_var(lookup, key) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| invalid(key, raw)),
    }
}

fn invalid(key: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue { key, value }
}
