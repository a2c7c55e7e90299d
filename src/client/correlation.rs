//! Correlation-id allocation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic source of `MobileInternalIndex` values for one session.
///
/// Ids are the decimal image of a counter starting at 1. The counter is the
/// only session datum touched by caller tasks directly, so it is atomic rather
/// than routed through the dispatcher.
#[derive(Debug, Default)]
pub struct CorrelationIds {
    last: AtomicU64,
}

impl CorrelationIds {
    /// Create an allocator whose first id is `"1"`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id. Never returns the same value twice.
    pub fn next_id(&self) -> String {
        (self.last.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}
