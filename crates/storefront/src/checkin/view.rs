//! Liveness flag for the check-in screen.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag telling in-flight work whether its screen is still open.
///
/// Clones share the flag. Once [`leave`](Self::leave) is called every clone
/// reports inactive for good, and responses that arrive afterwards are
/// dropped instead of applied.
#[derive(Debug, Clone)]
pub struct ViewGuard {
    active: Arc<AtomicBool>,
}

impl ViewGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the screen as left.
    pub fn leave(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl Default for ViewGuard {
    fn default() -> Self {
        Self::new()
    }
}
