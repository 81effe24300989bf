//! Caller-supplied context carrying cancellation and deadlines.
//!
//! Every public operation takes a [`Context`]. It is the only source of
//! timeouts in the pipeline: the executor checks it before each attempt, races
//! every suspension point against it, and reports [`Error::Cancelled`] when it
//! fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Cancellation scope for one or more API calls.
///
/// Cloning a context yields a handle to the same scope. [`Context::child`],
/// [`Context::with_timeout`] and [`Context::with_deadline`] derive a new scope
/// that is cancelled together with its parent but can also be cancelled (or
/// expire) on its own.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Create a root context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a child context that shares this context's deadline.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context that expires at `deadline`.
    ///
    /// The effective deadline is the earlier of `deadline` and the parent's.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The effective deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.error().is_some()
    }

    /// Fail with [`Error::Cancelled`] if the context is already done.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when the context was cancelled or its
    /// deadline has passed.
    pub fn check(&self) -> Result<()> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Drive `future` to completion unless the context finishes first.
    ///
    /// When the context wins the race the future is dropped, which aborts any
    /// in-flight I/O it owns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the context finished before `future`.
    pub async fn run<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.check()?;
        tokio::select! {
            biased;
            () = self.done() => Err(self
                .error()
                .unwrap_or_else(|| Error::Cancelled("context cancelled".to_string()))),
            output = future => Ok(output),
        }
    }

    fn error(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled("context cancelled".to_string()));
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Some(Error::Cancelled("context deadline exceeded".to_string()))
            }
            _ => None,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
