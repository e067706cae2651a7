use thiserror::Error;

/// Errors from constructing date values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date components: year {year}, month {month}, day {day}")]
    InvalidComponents { day: u8, month: u8, year: i32 },
}
