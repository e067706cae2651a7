//! The promise cache backing the Gregorian calculator.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;

use holidays_model::HolidayDate;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::context::CalculationContext;
use crate::promise::{CalculationPromise, WaitHandle};

/// Identifies one cached holiday inside a [`GregorianContext`].
///
/// Only movable feasts appear here; fixed-date holidays are constant-time
/// constructions and bypass the cache entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HolidayKey {
    #[serde(rename = "palm_sunday")]
    PalmSunday,
    #[serde(rename = "maundy_thursday")]
    MaundyThursday,
    #[serde(rename = "good_friday")]
    GoodFriday,
    #[serde(rename = "holy_saturday")]
    HolySaturday,
    #[serde(rename = "easter_sunday")]
    EasterSunday,
    #[serde(rename = "easter_monday")]
    EasterMonday,
    #[serde(rename = "ascension_day")]
    AscensionDay,
    #[serde(rename = "pentecost")]
    Pentecost,
    #[serde(rename = "whit_monday")]
    WhitMonday,
    #[serde(rename = "corpus_christi")]
    CorpusChristi,
    #[serde(rename = "sunday_after_corpus_christi")]
    SundayAfterCorpusChristi,
    #[serde(rename = "first_advent")]
    FirstSundayOfAdvent,
    #[serde(rename = "second_advent")]
    SecondSundayOfAdvent,
    #[serde(rename = "third_advent")]
    ThirdSundayOfAdvent,
    #[serde(rename = "fourth_advent")]
    FourthSundayOfAdvent,
}

impl HolidayKey {
    /// Returns the stable storage name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PalmSunday => "palm_sunday",
            Self::MaundyThursday => "maundy_thursday",
            Self::GoodFriday => "good_friday",
            Self::HolySaturday => "holy_saturday",
            Self::EasterSunday => "easter_sunday",
            Self::EasterMonday => "easter_monday",
            Self::AscensionDay => "ascension_day",
            Self::Pentecost => "pentecost",
            Self::WhitMonday => "whit_monday",
            Self::CorpusChristi => "corpus_christi",
            Self::SundayAfterCorpusChristi => "sunday_after_corpus_christi",
            Self::FirstSundayOfAdvent => "first_advent",
            Self::SecondSundayOfAdvent => "second_advent",
            Self::ThirdSundayOfAdvent => "third_advent",
            Self::FourthSundayOfAdvent => "fourth_advent",
        }
    }
}

impl fmt::Display for HolidayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The context used by [`GregorianCalculator`](super::GregorianCalculator).
///
/// Two parallel maps, both keyed year-then-holiday: resolved dates, and
/// wait handles for calculations currently in flight. A given slot has an
/// entry in at most one of the two. Every handle in `handles` belongs to
/// exactly one caller that owns computing that slot; everyone else parks
/// on it.
///
/// All methods expect the caller to hold exclusive access through a
/// [`ContextReference`](crate::ContextReference).
#[derive(Debug, Clone, Default)]
pub struct GregorianContext {
    storage: BTreeMap<i32, BTreeMap<HolidayKey, HolidayDate>>,
    handles: BTreeMap<i32, BTreeMap<HolidayKey, WaitHandle>>,
}

impl GregorianContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the promise for a slot, if the slot is occupied.
    ///
    /// A resolved date wins over an in-flight handle, though the two
    /// never coexist for one slot.
    pub fn lookup(&self, key: HolidayKey, year: i32) -> Option<CalculationPromise<HolidayDate>> {
        if let Some(date) = self.storage.get(&year).and_then(|dates| dates.get(&key)) {
            return Some(CalculationPromise::Fulfilled(*date));
        }
        self.handles
            .get(&year)
            .and_then(|handles| handles.get(&key))
            .map(|handle| CalculationPromise::Waiting(handle.clone()))
    }

    /// Returns the promise for a slot, registering a fresh wait handle if
    /// the slot was empty.
    ///
    /// The returned flag is `true` for exactly one caller per slot: the
    /// one that created the handle, and with it the obligation to compute
    /// the date and [`fulfill`](Self::fulfill) (or
    /// [`abandon`](Self::abandon)) the slot. Allocation and registration
    /// happen under the same exclusive access, so two callers can never
    /// both see `true`.
    pub fn lookup_or_create(
        &mut self,
        key: HolidayKey,
        year: i32,
    ) -> (CalculationPromise<HolidayDate>, bool) {
        if let Some(existing) = self.lookup(key, year) {
            return (existing, false);
        }
        let handle = WaitHandle::new();
        self.handles.entry(year).or_default().insert(key, handle.clone());
        (CalculationPromise::Waiting(handle), true)
    }

    /// Stores `date` under `(date.year, key)` and signals the slot's wait
    /// handle, if one exists.
    ///
    /// Fulfilling a slot that nobody raced to create is fine (that is how
    /// merged and pre-seeded values land). Fulfilling an already-resolved
    /// slot with a *different* date is a caller bug: a slot has exactly
    /// one owning computer. The first value is kept.
    pub fn fulfill(&mut self, key: HolidayKey, date: HolidayDate) {
        let existing = self
            .storage
            .entry(date.year)
            .or_default()
            .entry(key)
            .or_insert(date);
        if *existing != date {
            debug_assert!(
                false,
                "slot ({key}, {year}) fulfilled twice: kept {existing}, rejected {date}",
                year = date.year,
            );
            warn!(
                %key,
                year = date.year,
                kept = %existing,
                rejected = %date,
                "slot fulfilled twice with different dates; keeping the first value"
            );
        }
        if let Some(handle) = self
            .handles
            .get_mut(&date.year)
            .and_then(|handles| handles.remove(&key))
        {
            handle.signal();
        }
    }

    /// Removes and signals a slot's wait handle without storing a value.
    ///
    /// This is the release path for a failed calculation: the slot
    /// returns to empty, and woken waiters re-query it, electing a new
    /// owning computer on the next lookup.
    pub fn abandon(&mut self, key: HolidayKey, year: i32) {
        if let Some(handle) = self
            .handles
            .get_mut(&year)
            .and_then(|handles| handles.remove(&key))
        {
            handle.signal();
        }
    }

    /// Returns `true` if the context holds no resolved dates.
    pub fn is_empty(&self) -> bool {
        self.storage.values().all(BTreeMap::is_empty)
    }

    /// Returns the number of resolved dates.
    pub fn len(&self) -> usize {
        self.storage.values().map(BTreeMap::len).sum()
    }

    /// The resolved dates, keyed year-then-holiday.
    ///
    /// This is the walkable structure a persistence layer serializes;
    /// it never contains in-flight slots.
    pub fn resolved(&self) -> &BTreeMap<i32, BTreeMap<HolidayKey, HolidayDate>> {
        &self.storage
    }
}

impl CalculationContext for GregorianContext {
    fn merge(&mut self, other: Self) {
        for (year, dates) in other.storage {
            for (key, date) in dates {
                match self.storage.get(&year).and_then(|dates| dates.get(&key)) {
                    Some(existing) if *existing != date => {
                        // Both sides are deterministic, so a mismatch means
                        // some caller merged unrelated caches.
                        warn!(
                            %key,
                            year,
                            kept = %existing,
                            rejected = %date,
                            "conflicting dates while merging contexts; keeping the existing value"
                        );
                    }
                    _ => self.fulfill(key, date),
                }
            }
        }
    }

    fn clear(&mut self) {
        self.storage.clear();
        let handles = mem::take(&mut self.handles);
        // Signal before dropping: a handle that goes away unsignaled
        // leaves its waiters parked forever.
        for handle in handles.into_values().flat_map(BTreeMap::into_values) {
            handle.signal();
        }
    }
}

impl Serialize for GregorianContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Resolved values only; skip years emptied by a merge of nothing.
        serializer.collect_map(self.storage.iter().filter(|(_, dates)| !dates.is_empty()))
    }
}

impl<'de> Deserialize<'de> for GregorianContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let storage = BTreeMap::deserialize(deserializer)?;
        Ok(Self {
            storage,
            handles: BTreeMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn easter_2019() -> HolidayDate {
        HolidayDate::from_ymd(2019, 4, 21)
    }

    #[test]
    fn lookup_on_empty_context_is_none() {
        let context = GregorianContext::new();
        assert!(context.lookup(HolidayKey::EasterSunday, 2019).is_none());
        assert!(context.is_empty());
    }

    #[test]
    fn lookup_or_create_creates_exactly_once() {
        let mut context = GregorianContext::new();
        let (first, created) = context.lookup_or_create(HolidayKey::EasterSunday, 2019);
        assert!(created);
        assert!(matches!(first, CalculationPromise::Waiting(_)));
        let (second, created) = context.lookup_or_create(HolidayKey::EasterSunday, 2019);
        assert!(!created);
        assert!(matches!(second, CalculationPromise::Waiting(_)));
        // A different year is a different slot.
        let (_, created) = context.lookup_or_create(HolidayKey::EasterSunday, 2020);
        assert!(created);
    }

    #[test]
    fn fulfill_resolves_the_slot_and_signals_the_handle() {
        let mut context = GregorianContext::new();
        let (promise, created) = context.lookup_or_create(HolidayKey::EasterSunday, 2019);
        assert!(created);
        context.fulfill(HolidayKey::EasterSunday, easter_2019());
        let CalculationPromise::Waiting(handle) = promise else {
            panic!("expected a waiting promise");
        };
        assert!(handle.is_signaled());
        match context.lookup(HolidayKey::EasterSunday, 2019) {
            Some(CalculationPromise::Fulfilled(date)) => assert_eq!(date, easter_2019()),
            other => panic!("expected a fulfilled promise, got {other:?}"),
        }
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn fulfill_without_a_pending_handle_preseeds() {
        let mut context = GregorianContext::new();
        context.fulfill(HolidayKey::GoodFriday, HolidayDate::from_ymd(2019, 4, 19));
        assert!(matches!(
            context.lookup(HolidayKey::GoodFriday, 2019),
            Some(CalculationPromise::Fulfilled(_))
        ));
    }

    #[test]
    fn refulfilling_with_the_same_date_is_a_no_op() {
        let mut context = GregorianContext::new();
        context.fulfill(HolidayKey::EasterSunday, easter_2019());
        context.fulfill(HolidayKey::EasterSunday, easter_2019());
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn clear_signals_every_pending_handle() {
        let mut context = GregorianContext::new();
        let (first, _) = context.lookup_or_create(HolidayKey::EasterSunday, 2019);
        let (second, _) = context.lookup_or_create(HolidayKey::Pentecost, 2020);
        context.fulfill(HolidayKey::GoodFriday, HolidayDate::from_ymd(2019, 4, 19));
        context.clear();
        assert!(context.is_empty());
        assert!(context.lookup(HolidayKey::EasterSunday, 2019).is_none());
        for promise in [first, second] {
            let CalculationPromise::Waiting(handle) = promise else {
                panic!("expected a waiting promise");
            };
            assert!(handle.is_signaled());
        }
    }

    #[test]
    fn merge_imports_resolved_values_and_is_idempotent() {
        let mut target = GregorianContext::new();
        target.fulfill(HolidayKey::EasterSunday, easter_2019());

        let mut other = GregorianContext::new();
        other.fulfill(HolidayKey::EasterSunday, easter_2019());
        other.fulfill(HolidayKey::Pentecost, HolidayDate::from_ymd(2019, 6, 9));

        target.merge(other.clone());
        assert_eq!(target.len(), 2);
        target.merge(other);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn merge_fulfills_into_pending_slots() {
        let mut target = GregorianContext::new();
        let (promise, created) = target.lookup_or_create(HolidayKey::EasterSunday, 2019);
        assert!(created);

        let mut other = GregorianContext::new();
        other.fulfill(HolidayKey::EasterSunday, easter_2019());
        target.merge(other);

        let CalculationPromise::Waiting(handle) = promise else {
            panic!("expected a waiting promise");
        };
        assert!(handle.is_signaled());
        assert!(matches!(
            target.lookup(HolidayKey::EasterSunday, 2019),
            Some(CalculationPromise::Fulfilled(_))
        ));
    }

    #[test]
    fn merge_keeps_the_existing_value_on_conflict() {
        let mut target = GregorianContext::new();
        target.fulfill(HolidayKey::EasterSunday, easter_2019());

        let mut other = GregorianContext::new();
        other.fulfill(HolidayKey::EasterSunday, HolidayDate::from_ymd(2019, 4, 22));
        target.merge(other);

        match target.lookup(HolidayKey::EasterSunday, 2019) {
            Some(CalculationPromise::Fulfilled(date)) => assert_eq!(date, easter_2019()),
            other => panic!("expected the original value, got {other:?}"),
        }
    }

    #[test]
    fn abandon_returns_the_slot_to_empty() {
        let mut context = GregorianContext::new();
        let (promise, created) = context.lookup_or_create(HolidayKey::EasterSunday, 2019);
        assert!(created);
        context.abandon(HolidayKey::EasterSunday, 2019);
        let CalculationPromise::Waiting(handle) = promise else {
            panic!("expected a waiting promise");
        };
        assert!(handle.is_signaled());
        assert!(context.lookup(HolidayKey::EasterSunday, 2019).is_none());
    }
}
