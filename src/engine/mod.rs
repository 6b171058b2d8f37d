//! Streak and consistency calculations.
//!
//! Everything here is a pure function of a habit's completion dates and the
//! caller's notion of "today". Storage backends fetch the dates; this module
//! never touches them.

pub mod dates;
pub mod streak;

use thiserror::Error;

pub use dates::{format_date, parse_date, parse_dates};
pub use streak::{
    calculate_consistency, calculate_streak, is_active, round2, DEFAULT_ACTIVE_DAYS,
    DEFAULT_CONSISTENCY_DAYS,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid date: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),
}
