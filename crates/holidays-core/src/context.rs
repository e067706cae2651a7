//! The calculation-context seam between calculators and their caches.

/// A cache of calculated holiday dates used by a calculator.
///
/// A context's resolved values can be serialized and later merged back;
/// the serialized form should be treated as opaque. In-flight wait
/// handles are process-local and never cross a serialization boundary.
pub trait CalculationContext {
    /// Merges the resolved values of `other` into `self`.
    ///
    /// Meant for combining caches that were computed independently but
    /// consistently. A pre-existing value that disagrees with an incoming
    /// one signals a caller bug and is surfaced as a warning, never a
    /// panic; the existing value is kept.
    fn merge(&mut self, other: Self);

    /// Removes all cached values, waking any parked waiters.
    ///
    /// Woken waiters observe their slot as empty and recompute.
    fn clear(&mut self);
}
