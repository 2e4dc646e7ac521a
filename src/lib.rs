//! Timetable generation for a teaching semester.
//!
//! Subjects are matched to groups and teachers, one representative week is
//! placed greedily against the teachers' free-text preferences, and the week
//! is copied across the semester.

pub mod assignments;
pub mod config;
pub mod data;
pub mod error;
pub mod generator;
pub mod preference;
pub mod resolver;
pub mod scheduler;
pub mod scoring;
pub mod server;
pub mod stats;

pub use config::GeneratorConfig;
pub use error::{ConfigError, ValidationError};
pub use generator::{generate, validate_input};
