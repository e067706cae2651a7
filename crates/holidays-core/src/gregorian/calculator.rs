//! The memoizing Gregorian holiday calculator.

use std::convert::Infallible;
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use holidays_model::HolidayDate;
use tracing::debug;

use crate::calculator::Calculator;
use crate::context::CalculationContext;
use crate::context_ref::ContextReference;
use crate::gregorian::context::{GregorianContext, HolidayKey};
use crate::promise::CalculationPromise;

/// Calculates holiday dates in the proleptic Gregorian calendar.
///
/// Movable feasts are memoized per (holiday, year) in a shared context:
/// across any number of threads, each slot is computed at most once, and
/// callers that lose the creation race park until the winner publishes
/// the date. Cloning the calculator shares the context.
///
/// # Example
///
/// ```
/// use holidays_core::GregorianCalculator;
///
/// let calculator = GregorianCalculator::new();
/// assert_eq!(calculator.easter_sunday(2019).to_string(), "2019-04-21");
/// assert_eq!(calculator.good_friday(2019).to_string(), "2019-04-19");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GregorianCalculator {
    context_ref: Arc<ContextReference<GregorianContext>>,
}

impl GregorianCalculator {
    /// Creates a calculator with a fresh, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached date for a slot without blocking or computing.
    pub fn cached(&self, key: HolidayKey, year: i32) -> Option<HolidayDate> {
        self.context_ref.read(|context| match context.lookup(key, year) {
            Some(CalculationPromise::Fulfilled(date)) => Some(date),
            _ => None,
        })
    }

    /// Resolves the date for `key` in `year`, calling `calculate` only if
    /// no caller has resolved or started resolving the slot yet.
    ///
    /// Exactly one of any number of concurrent callers runs `calculate`;
    /// the others block until the result is published and then return the
    /// same date. `calculate` runs without any lock held, so resolving
    /// one slot never stalls lookups of other slots — and `calculate` may
    /// itself resolve further slots, which is how the Easter-relative
    /// holidays share a single Easter computation.
    pub fn date_for(
        &self,
        key: HolidayKey,
        year: i32,
        calculate: impl Fn(&Self, i32) -> HolidayDate,
    ) -> HolidayDate {
        self.try_date_for(key, year, |calculator, year| {
            Ok::<_, Infallible>(calculate(calculator, year))
        })
        .unwrap_or_else(|error| match error {})
    }

    /// Fallible variant of [`date_for`](Self::date_for).
    ///
    /// If `calculate` fails, the slot is released back to empty and its
    /// waiters are woken so one of them can retry as the new owner; the
    /// error is returned to the caller that ran the calculation.
    pub fn try_date_for<E>(
        &self,
        key: HolidayKey,
        year: i32,
        calculate: impl Fn(&Self, i32) -> Result<HolidayDate, E>,
    ) -> Result<HolidayDate, E> {
        loop {
            // Fast path: resolved and in-flight slots need no exclusive
            // access.
            match self.context_ref.read(|context| context.lookup(key, year)) {
                Some(CalculationPromise::Fulfilled(date)) => return Ok(date),
                Some(CalculationPromise::Waiting(handle)) => {
                    // The wake may mean fulfillment or a cleared cache;
                    // only a fresh lookup can tell, so go around again.
                    handle.wait();
                    continue;
                }
                None => {}
            }
            let (promise, created) = self
                .context_ref
                .with_context(|context| context.lookup_or_create(key, year));
            if created {
                return match calculate(self, year) {
                    Ok(date) => {
                        self.context_ref
                            .with_context(|context| context.fulfill(key, date));
                        debug!(%key, year, %date, "calculated holiday date");
                        Ok(date)
                    }
                    Err(error) => {
                        self.context_ref
                            .with_context(|context| context.abandon(key, year));
                        Err(error)
                    }
                };
            }
            match promise {
                CalculationPromise::Fulfilled(date) => return Ok(date),
                CalculationPromise::Waiting(handle) => handle.wait(),
            }
        }
    }
}

impl Calculator for GregorianCalculator {
    type Context = GregorianContext;

    fn context(&self) -> GregorianContext {
        self.context_ref.current()
    }

    fn reinitialize(&self, context: GregorianContext) {
        let mut old = self.context_ref.exchange(context);
        // Wake anything still parked on the replaced context; the waiters
        // re-query and recompute against the new one.
        old.clear();
    }
}

/// Shifts a calculated holiday date by a whole number of days.
fn by_adding(days: i64, base: HolidayDate) -> HolidayDate {
    let date = base
        .naive_date()
        .expect("calculated holiday dates are valid calendar days");
    let shifted = if days >= 0 {
        date + Days::new(days.unsigned_abs())
    } else {
        date - Days::new(days.unsigned_abs())
    };
    HolidayDate::from(shifted)
}

impl GregorianCalculator {
    fn calculate_easter_sunday(&self, year: i32) -> HolidayDate {
        // Gauss' Easter algorithm, in the parameterization valid for the
        // Gregorian calendar from 1900 through 2099.
        let d = (19 * (year % 19) + 24) % 30;
        let e = (2 * (year % 4) + 4 * (year % 7) + 6 * d + 5) % 7;
        let march_22 = NaiveDate::from_ymd_opt(year, 3, 22).expect("22 March exists in every year");
        HolidayDate::from(march_22 + Days::new((d + e) as u64))
    }

    fn calculate_palm_sunday(&self, year: i32) -> HolidayDate {
        by_adding(-7, self.easter_sunday(year))
    }

    fn calculate_maundy_thursday(&self, year: i32) -> HolidayDate {
        by_adding(-3, self.easter_sunday(year))
    }

    fn calculate_good_friday(&self, year: i32) -> HolidayDate {
        by_adding(-2, self.easter_sunday(year))
    }

    fn calculate_holy_saturday(&self, year: i32) -> HolidayDate {
        by_adding(-1, self.easter_sunday(year))
    }

    fn calculate_easter_monday(&self, year: i32) -> HolidayDate {
        by_adding(1, self.easter_sunday(year))
    }

    fn calculate_ascension_day(&self, year: i32) -> HolidayDate {
        by_adding(39, self.easter_sunday(year))
    }

    fn calculate_pentecost(&self, year: i32) -> HolidayDate {
        by_adding(49, self.easter_sunday(year))
    }

    fn calculate_whit_monday(&self, year: i32) -> HolidayDate {
        by_adding(50, self.easter_sunday(year))
    }

    fn calculate_corpus_christi(&self, year: i32) -> HolidayDate {
        by_adding(60, self.easter_sunday(year))
    }

    fn calculate_sunday_after_corpus_christi(&self, year: i32) -> HolidayDate {
        by_adding(63, self.easter_sunday(year))
    }

    fn calculate_fourth_sunday_of_advent(&self, year: i32) -> HolidayDate {
        // The latest Sunday on or before Christmas Day: when 25 December
        // is itself a Sunday, it is the fourth Sunday of Advent.
        let christmas = self
            .christmas_day(year)
            .naive_date()
            .expect("25 December exists in every year");
        let days_back = u64::from(christmas.weekday().num_days_from_sunday());
        HolidayDate::from(christmas - Days::new(days_back))
    }

    fn calculate_first_sunday_of_advent(&self, year: i32) -> HolidayDate {
        by_adding(-21, self.fourth_sunday_of_advent(year))
    }

    fn calculate_second_sunday_of_advent(&self, year: i32) -> HolidayDate {
        by_adding(-14, self.fourth_sunday_of_advent(year))
    }

    fn calculate_third_sunday_of_advent(&self, year: i32) -> HolidayDate {
        by_adding(-7, self.fourth_sunday_of_advent(year))
    }

    /// The date of New Year's Day (1 January) in `year`.
    pub fn new_years_day(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 1, 1)
    }

    /// The date of Epiphany (6 January) in `year`.
    pub fn epiphany(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 1, 6)
    }

    /// The date of Palm Sunday in `year`.
    pub fn palm_sunday(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::PalmSunday, year, Self::calculate_palm_sunday)
    }

    /// The date of Maundy Thursday in `year`.
    pub fn maundy_thursday(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::MaundyThursday, year, Self::calculate_maundy_thursday)
    }

    /// The date of Good Friday in `year`.
    pub fn good_friday(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::GoodFriday, year, Self::calculate_good_friday)
    }

    /// The date of Holy Saturday in `year`.
    pub fn holy_saturday(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::HolySaturday, year, Self::calculate_holy_saturday)
    }

    /// The date of Easter Sunday in `year`.
    pub fn easter_sunday(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::EasterSunday, year, Self::calculate_easter_sunday)
    }

    /// The date of Easter Monday in `year`.
    pub fn easter_monday(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::EasterMonday, year, Self::calculate_easter_monday)
    }

    /// The date of International Workers' Day (1 May) in `year`.
    pub fn international_workers_day(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 5, 1)
    }

    /// The date of Labor Day in `year`; an alias for
    /// [`international_workers_day`](Self::international_workers_day).
    pub fn labor_day(&self, year: i32) -> HolidayDate {
        self.international_workers_day(year)
    }

    /// The date of May Day in `year`; an alias for
    /// [`international_workers_day`](Self::international_workers_day).
    pub fn may_day(&self, year: i32) -> HolidayDate {
        self.international_workers_day(year)
    }

    /// The date of Ascension Day in `year`.
    pub fn ascension_day(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::AscensionDay, year, Self::calculate_ascension_day)
    }

    /// The date of Pentecost in `year`.
    pub fn pentecost(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::Pentecost, year, Self::calculate_pentecost)
    }

    /// The date of Whit Monday in `year`.
    pub fn whit_monday(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::WhitMonday, year, Self::calculate_whit_monday)
    }

    /// The date of Corpus Christi in `year`.
    pub fn corpus_christi(&self, year: i32) -> HolidayDate {
        self.date_for(HolidayKey::CorpusChristi, year, Self::calculate_corpus_christi)
    }

    /// The date of the Sunday after Corpus Christi in `year`.
    pub fn sunday_after_corpus_christi(&self, year: i32) -> HolidayDate {
        self.date_for(
            HolidayKey::SundayAfterCorpusChristi,
            year,
            Self::calculate_sunday_after_corpus_christi,
        )
    }

    /// The date of Halloween (31 October) in `year`.
    pub fn halloween(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 10, 31)
    }

    /// The date of All Saints' Day (1 November) in `year`.
    pub fn all_saints(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 11, 1)
    }

    /// The date of All Souls' Day (2 November) in `year`.
    pub fn all_souls(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 11, 2)
    }

    /// The date of the first Sunday of Advent in `year`.
    pub fn first_sunday_of_advent(&self, year: i32) -> HolidayDate {
        self.date_for(
            HolidayKey::FirstSundayOfAdvent,
            year,
            Self::calculate_first_sunday_of_advent,
        )
    }

    /// The date of the second Sunday of Advent in `year`.
    pub fn second_sunday_of_advent(&self, year: i32) -> HolidayDate {
        self.date_for(
            HolidayKey::SecondSundayOfAdvent,
            year,
            Self::calculate_second_sunday_of_advent,
        )
    }

    /// The date of the third Sunday of Advent in `year`.
    pub fn third_sunday_of_advent(&self, year: i32) -> HolidayDate {
        self.date_for(
            HolidayKey::ThirdSundayOfAdvent,
            year,
            Self::calculate_third_sunday_of_advent,
        )
    }

    /// The date of the fourth Sunday of Advent in `year`.
    pub fn fourth_sunday_of_advent(&self, year: i32) -> HolidayDate {
        self.date_for(
            HolidayKey::FourthSundayOfAdvent,
            year,
            Self::calculate_fourth_sunday_of_advent,
        )
    }

    /// The date of Christmas Eve (24 December) in `year`.
    pub fn christmas_eve(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 12, 24)
    }

    /// The date of Christmas Day (25 December) in `year`.
    pub fn christmas_day(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 12, 25)
    }

    /// The date of the day after Christmas Day (26 December) in `year`.
    pub fn day_after_christmas_day(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 12, 26)
    }

    /// The date of New Year's Eve (31 December) in `year`.
    pub fn new_years_eve(&self, year: i32) -> HolidayDate {
        HolidayDate::from_ymd(year, 12, 31)
    }
}
