//! Concurrent, memoizing holiday-date calculation.
//!
//! Movable feasts (Easter and everything derived from it, the Sundays of
//! Advent) are expensive enough to be worth caching and pure enough to be
//! cached forever. This crate wraps those calculations in a per-(holiday,
//! year) promise cache: the first caller to ask for a slot computes it,
//! concurrent callers for the same slot park until the result is
//! published, and every later lookup is a read. The whole cache can be
//! snapshotted, serialized, merged, and swapped out at runtime without
//! stranding parked callers.
//!
//! # Example
//!
//! ```
//! use holidays_core::{Calculator, GregorianCalculator};
//!
//! let calculator = GregorianCalculator::new();
//! let easter = calculator.easter_sunday(2019);
//! assert_eq!(easter.to_string(), "2019-04-21");
//!
//! // Clones share the cache; this lookup is a cache hit.
//! let clone = calculator.clone();
//! assert_eq!(clone.easter_sunday(2019), easter);
//! assert_eq!(clone.context().len(), 1);
//! ```

pub mod calculator;
pub mod context;
pub mod context_ref;
pub mod gregorian;
pub mod promise;

pub use calculator::Calculator;
pub use holidays_model::HolidayDate;
pub use context::CalculationContext;
pub use context_ref::ContextReference;
pub use gregorian::{GregorianCalculator, GregorianContext, HolidayKey};
pub use promise::{CalculationPromise, WaitHandle};
