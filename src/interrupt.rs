//! Cooperative cancellation for long-running enumerations.
//!
//! The resolution engine polls an [`InterruptMonitor`] at the top of every
//! main-loop iteration and exits promptly once the signal is raised. The
//! engine's state stays consistent, so a later call may restart the query.
//! The derivability engine runs to completion and never polls.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A poll-only cancellation signal.
pub trait InterruptMonitor {
    fn is_interrupted(&self) -> bool;
}

impl<T: InterruptMonitor + ?Sized> InterruptMonitor for &T {
    fn is_interrupted(&self) -> bool {
        (**self).is_interrupted()
    }
}

/// The default monitor: never signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupted;

impl InterruptMonitor for NeverInterrupted {
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// A clonable interrupt flag. One handle is kept by the caller (typically a
/// timer or a UI thread) while another is passed to the enumeration.
#[derive(Debug, Clone, Default)]
pub struct SharedInterrupt {
    flag: Arc<AtomicBool>,
}

impl SharedInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal. The engine exits at its next poll.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Lowers the signal so the same handle can guard a later query.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

impl InterruptMonitor for SharedInterrupt {
    fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
