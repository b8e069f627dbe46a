//! Progress reporting and cooperative cancellation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How far a reslice has come, in output steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Steps completed so far.
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * self.done as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reslice... {}/{} ({:.0}%)",
            self.done,
            self.total,
            self.percent()
        )
    }
}

/// Receives progress and may ask the run to stop.
///
/// The resampler calls [`Monitor::is_cancelled`] once per output step and
/// [`Monitor::progress`] after each completed step.
pub trait Monitor {
    fn progress(&mut self, _progress: &Progress) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// No reporting, never cancels.
impl Monitor for () {}

/// A cancellation switch that can be flipped from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Monitor for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Logs every step at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMonitor;

impl Monitor for LogMonitor {
    fn progress(&mut self, progress: &Progress) {
        log::debug!("{progress}");
    }
}
