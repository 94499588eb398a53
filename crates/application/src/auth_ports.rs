//! Ports consumed by the session tracker.
//!
//! All of them are implemented against the hosted auth/database service in
//! the infrastructure crate and by in-memory fakes in tests.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use tenantdesk_core::{AppResult, Identity, UserId};
use tenantdesk_domain::{AuthChange, Profile, Session};

/// Client-side view of the hosted auth service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Returns the locally cached session, if any.
    async fn cached_session(&self) -> AppResult<Option<Session>>;

    /// Asks the auth service who the current credentials belong to.
    async fn confirm_identity(&self) -> AppResult<Identity>;

    /// Starts listening for auth state changes.
    ///
    /// Only changes emitted after this call are delivered. Dropping the
    /// returned subscription unsubscribes.
    fn subscribe(&self) -> AuthSubscription;
}

/// Stream of auth state changes delivered to one listener.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthChange>,
}

impl AuthSubscription {
    /// Wraps a broadcast receiver fed by the auth backend.
    #[must_use]
    pub fn new(receiver: broadcast::Receiver<AuthChange>) -> Self {
        Self { receiver }
    }

    /// Waits for the next change. Returns `None` once the backend is gone.
    ///
    /// A listener that falls behind skips the missed changes; the next one
    /// it receives carries the full current session.
    pub async fn next(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth change listener lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Read access to application profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Looks up the profile belonging to an identity.
    async fn find_profile_by_identity(&self, user_id: UserId) -> AppResult<Option<Profile>>;
}

/// Server route that stamps a profile's last sign-in time.
#[async_trait]
pub trait LastLoginNotifier: Send + Sync {
    /// Requests a last-login update. The response body is ignored.
    async fn notify_last_login(&self, user_id: UserId) -> AppResult<()>;
}

/// Durable storage for the signed-in session.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Loads the stored session, if any.
    async fn load(&self) -> AppResult<Option<Session>>;

    /// Replaces the stored session.
    async fn store(&self, session: &Session) -> AppResult<()>;

    /// Removes the stored session.
    async fn clear(&self) -> AppResult<()>;
}
