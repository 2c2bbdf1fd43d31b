use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared "request in flight" flag.
///
/// Each `BusyGuard` counts one request in flight; the flag reads idle only
/// once every guard is dropped, on success, failure and early return alike.
#[derive(Clone, Debug, Default)]
pub struct BusyFlag {
    in_flight: Arc<AtomicUsize>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Raise the flag unconditionally, alongside any request already in
    /// flight.
    pub fn raise(&self) -> BusyGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            in_flight: self.in_flight.clone(),
        }
    }

    /// Raise the flag only if it is currently idle.
    pub fn try_raise(&self) -> Option<BusyGuard> {
        self.in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard {
                in_flight: self.in_flight.clone(),
            })
    }
}

#[must_use = "the flag is lowered as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BusyGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
