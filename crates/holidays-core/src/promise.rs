//! One-shot wait handles and calculation promises.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// A one-shot broadcast primitive that parks callers until signaled.
///
/// Cloning shares the handle. Once signaled, the handle stays open: every
/// currently parked waiter wakes, and every later [`wait`](Self::wait)
/// returns immediately. This is the contract a calculation slot needs,
/// where a single fulfillment (or a cache clear) must release an unknown
/// number of waiters, some of which may arrive after the signal.
#[derive(Clone, Default)]
pub struct WaitHandle {
    inner: Arc<WaitInner>,
}

#[derive(Default)]
struct WaitInner {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl WaitHandle {
    /// Creates an unsignaled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the handle, waking all parked waiters. Idempotent.
    pub fn signal(&self) {
        let mut signaled = self.inner.signaled.lock();
        *signaled = true;
        self.inner.condvar.notify_all();
    }

    /// Parks the calling thread until the handle is signaled.
    ///
    /// Must not be called while holding the lock of the store that owns
    /// this handle; the fulfilling caller would never get in to signal.
    pub fn wait(&self) {
        let mut signaled = self.inner.signaled.lock();
        while !*signaled {
            self.inner.condvar.wait(&mut signaled);
        }
    }

    /// Returns whether the handle has already been signaled.
    pub fn is_signaled(&self) -> bool {
        *self.inner.signaled.lock()
    }
}

impl fmt::Debug for WaitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitHandle")
            .field("signaled", &self.is_signaled())
            .finish()
    }
}

/// The state of one calculation slot.
#[derive(Debug, Clone)]
pub enum CalculationPromise<V> {
    /// The value is being calculated by another caller; park on the
    /// handle, then look the slot up again. A wake can mean either a
    /// fulfillment or a cache clear, and only a fresh lookup can tell.
    Waiting(WaitHandle),
    /// The calculation is done.
    Fulfilled(V),
}
