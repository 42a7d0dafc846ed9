//! Single-flight guard for exclusive one-shot operations

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Allows at most one outstanding operation at a time.
///
/// `try_begin` hands out a guard; the slot is released when the guard drops,
/// so every exit path (success, error, cancellation of the future) frees it.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    /// Create an idle single-flight slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` if an operation is already outstanding
    pub fn try_begin(&self) -> Option<SingleFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SingleFlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Check if an operation is outstanding
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the slot on drop
#[derive(Debug)]
pub struct SingleFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SingleFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
