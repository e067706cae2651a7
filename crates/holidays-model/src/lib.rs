//! Value types shared by the holiday calculators.
//!
//! The central type is [`HolidayDate`], a timeless (day, month, year)
//! triple that is fixed across time zones. It is deliberately minimal:
//! anything beyond naming a calendar day (times, zones, durations) belongs
//! to `chrono`, which this crate converts to and from.

pub mod date;
pub mod error;

pub use date::HolidayDate;
pub use error::DateError;
