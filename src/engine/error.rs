use chrono::{NaiveDate, Weekday};
use ulid::Ulid;

use crate::model::InstanceStatus;

use super::store::StoreError;

/// The booking an overlap conflict was detected against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapInfo {
    pub status: InstanceStatus,
    pub schedule: String,
    pub date: NaiveDate,
}

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    /// Candidate range collides with an existing booking on the court.
    Overlap(OverlapInfo),
    /// Candidate slot collides with another fixed reservation defined for
    /// the same court and weekday.
    DefinitionOverlap {
        other: Ulid,
        schedule: String,
        weekday: Weekday,
    },
    WeekdayMismatch {
        expected: Weekday,
        actual: Weekday,
    },
    InvalidTimeRange(String),
    Store(StoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::Overlap(info) => write!(
                f,
                "conflicts with a {} booking at {} on {}",
                info.status, info.schedule, info.date
            ),
            EngineError::DefinitionOverlap {
                other,
                schedule,
                weekday,
            } => write!(
                f,
                "overlaps fixed reservation {other} ({schedule}) every {weekday}"
            ),
            EngineError::WeekdayMismatch { expected, actual } => write!(
                f,
                "date falls on {actual} but the fixed reservation runs on {expected}"
            ),
            EngineError::InvalidTimeRange(detail) => {
                write!(f, "invalid time range: {detail}")
            }
            EngineError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}
