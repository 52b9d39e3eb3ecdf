// Cooperative cancellation and deadlines for sampling loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::engine::SimulationError;

/// Cooperative cancellation token wrapping an `AtomicBool`.
///
/// Clones share the same flag, so a caller can keep one handle and pass
/// another into a long-running simulation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token (not cancelled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Optional stop conditions checked periodically while sampling.
#[derive(Debug, Clone, Default)]
pub struct RunLimits {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl RunLimits {
    /// No token, no deadline: sampling always runs to completion.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Fail if the run should stop. `completed`/`requested` are reported in
    /// the error so callers can tell how far sampling got.
    pub(crate) fn check(&self, completed: usize, requested: usize) -> Result<(), SimulationError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(SimulationError::Cancelled {
                completed,
                requested,
            });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(SimulationError::DeadlineExceeded {
                completed,
                requested,
            });
        }
        Ok(())
    }
}
