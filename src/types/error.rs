use chrono::NaiveDate;
use thiserror::Error;

/// Returned by the window planner when it is asked for an impossible plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRangeError {
    #[error("Start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("Segment length must be at least one day, got {0}")]
    SegmentTooShort(u32),
}
