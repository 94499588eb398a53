//! First-settled-or-timeout combinator.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use tenantdesk_core::{AppError, AppResult};

/// Outcome of a fallible lookup raced against a time bound.
#[derive(Debug)]
pub enum Settled<T> {
    /// The lookup completed successfully within the bound.
    Value(T),
    /// The lookup completed with an error within the bound.
    Failed(AppError),
    /// The bound elapsed first. The lookup was dropped.
    TimedOut,
}

impl<T> Settled<T> {
    /// Returns whether the bound elapsed before the lookup settled.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// Collapses failure and timeout into `None`, logging which one happened.
    pub fn value(self, operation: &str) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Failed(error) => {
                debug!(operation, error = %error, "lookup failed");
                None
            }
            Self::TimedOut => {
                debug!(operation, "lookup timed out");
                None
            }
        }
    }
}

/// Races `future` against `bound` and reports whichever settles first.
pub async fn settle<F, T>(bound: Duration, future: F) -> Settled<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(bound, future).await {
        Ok(Ok(value)) => Settled::Value(value),
        Ok(Err(error)) => Settled::Failed(error),
        Err(_) => Settled::TimedOut,
    }
}
