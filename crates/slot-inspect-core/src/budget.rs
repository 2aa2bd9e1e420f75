//! Cooperative cancellation and deadlines for long-running compute steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag that a caller on another thread can raise to stop work.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a budget check failed.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetExceeded {
    #[error("cancelled by caller")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline, polled at stage boundaries.
#[derive(Clone, Debug, Default)]
pub struct Budget {
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl Budget {
    /// No deadline; cancellable only through [`Budget::cancel_token`].
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancelToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Use an externally owned token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[inline]
    pub fn check(&self) -> Result<(), BudgetExceeded> {
        if self.cancel.is_cancelled() {
            return Err(BudgetExceeded::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(BudgetExceeded::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
