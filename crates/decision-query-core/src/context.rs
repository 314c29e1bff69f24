// crates/decision-query-core/src/context.rs
// ============================================================================
// Module: Decision Query Context
// Description: Cancellation and deadline carried into the network exchange.
// Purpose: Abort an in-flight query promptly instead of waiting for a response.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! A [`QueryContext`] is created once per invocation and threaded into
//! [`crate::QueryClient::query`]. It may carry a deadline, a cancellation
//! signal driven by a [`CancelHandle`], both, or neither.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::future::pending;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::RequestFailure;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Cancellation and deadline scope for one invocation.
///
/// # Invariants
/// - Once canceled, a context stays canceled.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// Instant after which the exchange is abandoned.
    deadline: Option<Instant>,
    /// Cancellation flag; `true` once canceled.
    cancel: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every clone of its [`QueryContext`].
#[derive(Debug)]
pub struct CancelHandle {
    /// Sender side of the cancellation flag.
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels the associated context.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl QueryContext {
    /// Returns a context that is never canceled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a cancellable context and the handle that cancels it.
    #[must_use]
    pub fn cancellable() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let context = Self {
            deadline: None,
            cancel: Some(receiver),
        };
        (
            context,
            CancelHandle {
                sender,
            },
        )
    }

    /// Sets a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now().checked_add(timeout);
        Self {
            deadline,
            ..self
        }
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the context has been canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|receiver| *receiver.borrow())
    }

    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Runs `exchange` unless the context is canceled or expires first.
    ///
    /// A context that is already canceled or expired never polls `exchange`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestFailure::Canceled`] or [`RequestFailure::DeadlineExceeded`]
    /// when the context ends first, otherwise the exchange result.
    pub async fn run<F, T>(&self, exchange: F) -> Result<T, RequestFailure>
    where
        F: Future<Output = Result<T, RequestFailure>>,
    {
        if self.is_canceled() {
            return Err(RequestFailure::Canceled);
        }
        if self.is_expired() {
            return Err(RequestFailure::DeadlineExceeded);
        }
        tokio::select! {
            biased;
            () = self.canceled() => Err(RequestFailure::Canceled),
            () = self.expired() => Err(RequestFailure::DeadlineExceeded),
            result = exchange => result,
        }
    }

    /// Resolves when the context is canceled; pends forever otherwise.
    async fn canceled(&self) {
        let Some(receiver) = &self.cancel else {
            return pending().await;
        };
        let mut receiver = receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Handle dropped without canceling.
                return pending().await;
            }
        }
    }

    /// Resolves at the deadline; pends forever without one.
    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => pending().await,
        }
    }
}
