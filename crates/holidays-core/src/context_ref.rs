//! Shared, lock-guarded access to a single calculation context.

use std::mem;

use parking_lot::RwLock;

use crate::context::CalculationContext;

/// A by-reference wrapper around one [`CalculationContext`].
///
/// Calculators are cheap-to-clone values; wrapping the context in an
/// `Arc<ContextReference<_>>` is what makes every clone observe and feed
/// the same cache. Reads take the lock shared, so resolved slots stay
/// readable while other slots are being filled in; all mutation funnels
/// through [`with_context`](Self::with_context).
#[derive(Debug, Default)]
pub struct ContextReference<C> {
    context: RwLock<C>,
}

impl<C: CalculationContext> ContextReference<C> {
    /// Creates a reference holding `context`.
    pub fn new(context: C) -> Self {
        Self {
            context: RwLock::new(context),
        }
    }

    /// Returns a point-in-time snapshot of the stored context.
    pub fn current(&self) -> C
    where
        C: Clone,
    {
        self.context.read().clone()
    }

    /// Runs `work` with shared access to the context.
    pub fn read<T>(&self, work: impl FnOnce(&C) -> T) -> T {
        work(&self.context.read())
    }

    /// Runs `work` with exclusive access to the context.
    ///
    /// This is the only mutation path. The lock is released when `work`
    /// returns, on every exit path; `work` must not park on a wait handle
    /// that lives in this context.
    pub fn with_context<T>(&self, work: impl FnOnce(&mut C) -> T) -> T {
        work(&mut self.context.write())
    }

    /// Swaps in `new_context`, returning the previously stored one.
    ///
    /// The caller is responsible for clearing the returned context so
    /// that waiters still parked on it are released.
    #[must_use = "clear the returned context to release its waiters"]
    pub fn exchange(&self, new_context: C) -> C {
        let mut guard = self.context.write();
        mem::replace(&mut *guard, new_context)
    }
}
