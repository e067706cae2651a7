//! Context snapshots, replacement, and persistence.

use std::sync::atomic::{AtomicUsize, Ordering};

use holidays_core::{
    CalculationContext, Calculator, ContextReference, GregorianCalculator, GregorianContext,
    HolidayKey,
};
use holidays_model::HolidayDate;
use serde_json::json;

fn easter_2019() -> HolidayDate {
    HolidayDate::from_ymd(2019, 4, 21)
}

#[test]
fn context_snapshot_is_point_in_time() {
    let calculator = GregorianCalculator::new();
    calculator.easter_sunday(2019);
    let snapshot = calculator.context();
    assert_eq!(snapshot.len(), 1);
    // Later work does not bleed into an already-taken snapshot.
    calculator.easter_sunday(2020);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(calculator.context().len(), 2);
}

#[test]
fn serializes_resolved_values_as_nested_maps() {
    let calculator = GregorianCalculator::new();
    calculator.date_for(HolidayKey::EasterSunday, 2019, |_, _| easter_2019());
    calculator.date_for(HolidayKey::Pentecost, 2020, |_, _| {
        HolidayDate::from_ymd(2020, 5, 31)
    });
    let value = serde_json::to_value(calculator.context()).expect("serialize context");
    assert_eq!(
        value,
        json!({
            "2019": { "easter_sunday": { "day": 21, "month": 4, "year": 2019 } },
            "2020": { "pentecost": { "day": 31, "month": 5, "year": 2020 } },
        })
    );
}

#[test]
fn in_flight_slots_are_never_serialized() {
    let reference = ContextReference::new(GregorianContext::new());
    reference.with_context(|context| {
        context.fulfill(HolidayKey::EasterSunday, easter_2019());
        // Leave a second slot in flight.
        let (_, created) = context.lookup_or_create(HolidayKey::Pentecost, 2019);
        assert!(created);
    });
    let value = serde_json::to_value(reference.current()).expect("serialize context");
    assert_eq!(
        value,
        json!({
            "2019": { "easter_sunday": { "day": 21, "month": 4, "year": 2019 } },
        })
    );
}

#[test]
fn deserialized_context_restores_the_cache() {
    let source = GregorianCalculator::new();
    source.date_for(HolidayKey::EasterSunday, 2019, |_, _| easter_2019());
    let serialized = serde_json::to_string(&source.context()).expect("serialize context");

    let restored: GregorianContext =
        serde_json::from_str(&serialized).expect("deserialize context");
    let calculator = GregorianCalculator::new();
    calculator.reinitialize(restored);

    let calls = AtomicUsize::new(0);
    let date = calculator.date_for(HolidayKey::EasterSunday, 2019, |_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        easter_2019()
    });
    assert_eq!(date, easter_2019());
    // The restored value made the calculation unnecessary.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn exchange_returns_the_prior_context() {
    let reference = ContextReference::new(GregorianContext::new());
    reference.with_context(|context| context.fulfill(HolidayKey::EasterSunday, easter_2019()));

    let mut old = reference.exchange(GregorianContext::new());
    assert_eq!(old.len(), 1);
    assert!(reference.current().is_empty());
    old.clear();
    assert!(old.is_empty());
}

#[test]
fn reinitialize_adopts_an_externally_built_context() {
    let mut seeded = GregorianContext::new();
    seeded.fulfill(HolidayKey::EasterSunday, easter_2019());

    let calculator = GregorianCalculator::new();
    calculator.easter_sunday(2022);
    calculator.reinitialize(seeded);

    assert_eq!(calculator.cached(HolidayKey::EasterSunday, 2019), Some(easter_2019()));
    // The replaced context is gone along with its 2022 entry.
    assert_eq!(calculator.cached(HolidayKey::EasterSunday, 2022), None);
}

#[test]
fn merged_contexts_combine_their_caches() {
    let first = GregorianCalculator::new();
    first.easter_sunday(2019);
    let second = GregorianCalculator::new();
    second.easter_sunday(2020);

    let mut combined = first.context();
    combined.merge(second.context());
    assert_eq!(combined.len(), 2);

    let calculator = GregorianCalculator::new();
    calculator.reinitialize(combined);
    assert_eq!(
        calculator.cached(HolidayKey::EasterSunday, 2020),
        Some(HolidayDate::from_ymd(2020, 4, 12))
    );
}
