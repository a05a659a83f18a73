//! Deadlines and cancellation for long-running wallet calls.
//!
//! A [`CallContext`] is threaded through one flow. Ledger and prover calls are
//! raced against its deadline; expiry cancels the context so that a later
//! submission through it is skipped instead of sent.

use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, WalletError};

/// What happened to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Transaction accepted by the ledger
    Submitted { tx_hash: String },
    /// The context was cancelled before sending
    Skipped,
}

impl SubmitOutcome {
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Submitted { tx_hash } => Some(tx_hash),
            SubmitOutcome::Skipped => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl CallContext {
    /// No deadline, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            token: CancellationToken::new(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token shared with anything that wants to observe cancellation
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Run `fut` until it finishes, the deadline passes, or the context is cancelled
    ///
    /// Expiry cancels the context and yields [`WalletError::Timeout`].
    pub async fn run<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(WalletError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                _ = self.token.cancelled() => Err(WalletError::Cancelled),
                res = fut => res,
            }
        };

        match self.deadline {
            None => guarded.await,
            Some(deadline) => match timeout_at(deadline, guarded).await {
                Ok(res) => res,
                Err(_) => {
                    warn!("{what} exceeded its deadline, cancelling context");
                    self.cancel();
                    Err(WalletError::Timeout(what.to_string()))
                }
            },
        }
    }

    /// Send a transaction unless the context has been cancelled
    ///
    /// The deadline and token are checked once, before sending. The send
    /// itself is never raced against either.
    pub async fn submit<F>(&self, what: &str, fut: F) -> Result<SubmitOutcome>
    where
        F: Future<Output = Result<String>>,
    {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.cancel();
        }
        if self.is_cancelled() {
            warn!("{what} skipped: context cancelled");
            return Ok(SubmitOutcome::Skipped);
        }
        let tx_hash = fut.await?;
        Ok(SubmitOutcome::Submitted { tx_hash })
    }
}
