//! Gregorian-calendar holiday calculation.

pub mod calculator;
pub mod context;

pub use calculator::GregorianCalculator;
pub use context::{GregorianContext, HolidayKey};
