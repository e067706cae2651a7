//! The public calculator seam.

use chrono::NaiveDateTime;
use holidays_model::HolidayDate;

use crate::context::CalculationContext;

/// A calculator that produces holiday dates for a fixed calendar.
///
/// Calculators are cheap to clone and safe to share across threads; all
/// clones feed one shared calculation context.
pub trait Calculator {
    /// The cache type this calculator uses.
    type Context: CalculationContext;

    /// Returns a point-in-time snapshot of the calculator's cache.
    ///
    /// The cache can change at any moment, so the snapshot may already be
    /// outdated by the time it is returned. Intended for inspection and
    /// for handing the resolved values to a serializer.
    fn context(&self) -> Self::Context;

    /// Replaces the calculator's cache with `context`.
    ///
    /// Useful for adopting the context of another calculator, or one
    /// restored from persisted state. Waiters parked on the replaced
    /// context are released and will recompute against the new one.
    fn reinitialize(&self, context: Self::Context);

    /// Converts a holiday date into a calendar timestamp, at midnight or
    /// (with `at_noon`) at noon.
    ///
    /// Returns `None` if the holiday date does not name an existing day.
    fn date(&self, holiday: HolidayDate, at_noon: bool) -> Option<NaiveDateTime> {
        holiday.naive_datetime(at_noon)
    }
}
