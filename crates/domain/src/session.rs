//! Authenticated sessions and auth state change events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantdesk_core::Identity;

/// Seconds before the nominal expiry at which a session is treated as expired.
pub const SESSION_EXPIRY_SKEW_SECONDS: i64 = 10;

/// Proof of authentication issued by the hosted auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for API and REST calls.
    pub access_token: String,
    /// Token used to silently renew the session.
    pub refresh_token: String,
    /// Expiry as unix seconds.
    pub expires_at: i64,
    /// Principal the session belongs to.
    pub user: Identity,
}

impl Session {
    /// Returns the principal the session belongs to.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.user
    }

    /// Returns whether the session is expired, or about to be, at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at.saturating_sub(SESSION_EXPIRY_SKEW_SECONDS)
    }
}

/// Kind of auth state change pushed by the auth subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeKind {
    /// Session restored when a listener attaches.
    InitialSession,
    /// Explicit sign-in.
    SignedIn,
    /// Explicit sign-out.
    SignedOut,
    /// Access token renewed.
    TokenRefreshed,
    /// Identity attributes changed.
    UserUpdated,
    /// Sign-in through a password recovery link.
    PasswordRecovery,
}

/// Auth state change: the event kind and the session after the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    /// What happened.
    pub kind: AuthChangeKind,
    /// Session after the change, `None` when signed out or expired.
    pub session: Option<Session>,
}

impl AuthChange {
    /// Creates an auth change event.
    #[must_use]
    pub fn new(kind: AuthChangeKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }

    /// Returns the identity carried by the event, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(Session::identity)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tenantdesk_core::{Identity, UserId};

    use super::{AuthChangeKind, SESSION_EXPIRY_SKEW_SECONDS, Session};

    fn session_expiring_at(expires_at: i64) -> Session {
        Session {
            access_token: "access".to_owned(),
            refresh_token: "refresh".to_owned(),
            expires_at,
            user: Identity::new(UserId::new(), Some("ops@example.com".to_owned())),
        }
    }

    #[test]
    fn session_inside_skew_window_counts_as_expired() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
        let session = session_expiring_at(now.timestamp() + SESSION_EXPIRY_SKEW_SECONDS - 1);
        assert!(session.is_expired(now));
    }

    #[test]
    fn session_well_before_expiry_is_usable() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
        let session = session_expiring_at(now.timestamp() + 3600);
        assert!(!session.is_expired(now));
    }

    #[test]
    fn change_kind_uses_wire_names() {
        let encoded = serde_json::to_string(&AuthChangeKind::TokenRefreshed).unwrap_or_default();
        assert_eq!(encoded, "\"TOKEN_REFRESHED\"");
    }
}
