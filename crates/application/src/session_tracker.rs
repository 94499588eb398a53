//! Session bootstrap and auth state tracking.
//!
//! A [`SessionTracker`] owns the auth snapshot consumed by route guards. It is
//! mounted once by the composition root and lives until it is unmounted or
//! dropped. Mounting starts two tasks:
//!
//! - the bootstrap, which recovers the cached session or confirms the
//!   identity directly, each lookup bounded by its own timeout and the whole
//!   sequence bounded by an overarching one;
//! - the listener, which applies every auth change pushed by the backend.
//!
//! Profile fetches and last-login pings run as detached best-effort tasks.
//! Their failures are logged and never reach the snapshot's identity.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tenantdesk_core::{Identity, UserId};
use tenantdesk_domain::{AuthChange, AuthChangeKind, Profile};

use crate::settle::{Settled, settle};
use crate::{AuthBackend, AuthSubscription, LastLoginNotifier, ProfileRepository};


/// Time bounds applied while bootstrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerTimeouts {
    /// Bound on the local cached-session lookup.
    pub cached_session: Duration,
    /// Bound on the direct identity confirmation call.
    pub identity_confirmation: Duration,
    /// Bound on the whole bootstrap sequence.
    pub bootstrap: Duration,
}

impl Default for TrackerTimeouts {
    fn default() -> Self {
        Self {
            cached_session: Duration::from_secs(2),
            identity_confirmation: Duration::from_secs(2),
            bootstrap: Duration::from_secs(3),
        }
    }
}

/// Auth state published to consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Authenticated principal, `None` when anonymous.
    pub identity: Option<Identity>,
    /// Profile of the principal once fetched.
    pub profile: Option<Profile>,
    /// Bootstrap is in flight.
    pub loading: bool,
    /// Bootstrap finished or an auth change has been applied.
    pub initialized: bool,
}

/// Coarse lifecycle phase derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Not mounted yet.
    Uninitialized,
    /// Bootstrap in flight.
    Loading,
    /// Settled with an identity.
    Authenticated,
    /// Settled without an identity.
    Anonymous,
}

impl AuthSnapshot {
    /// Returns the lifecycle phase of this snapshot.
    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        match (self.initialized, self.loading, self.identity.is_some()) {
            (true, _, true) => AuthPhase::Authenticated,
            (true, _, false) => AuthPhase::Anonymous,
            (false, true, _) => AuthPhase::Loading,
            (false, false, _) => AuthPhase::Uninitialized,
        }
    }

    fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(Identity::id)
    }
}

/// Owned auth state container with a mount/unmount lifecycle.
pub struct SessionTracker {
    shared: Arc<TrackerShared>,
    bootstrap_task: JoinHandle<()>,
    listener_task: JoinHandle<()>,
}

struct TrackerShared {
    state: watch::Sender<AuthSnapshot>,
    profiles: Arc<dyn ProfileRepository>,
    last_login: Arc<dyn LastLoginNotifier>,
    last_login_sent: AtomicBool,
    change_applied: AtomicBool,
    /// Bumped per profile fetch; only the latest fetch may merge.
    profile_generation: AtomicU64,
}

impl SessionTracker {
    /// Mounts a tracker: subscribes to auth changes and starts the bootstrap.
    ///
    /// Must be called from within a tokio runtime. The subscription is taken
    /// before this returns, so no change emitted afterwards is missed.
    #[must_use]
    pub fn mount(
        backend: Arc<dyn AuthBackend>,
        profiles: Arc<dyn ProfileRepository>,
        last_login: Arc<dyn LastLoginNotifier>,
        timeouts: TrackerTimeouts,
    ) -> Self {
        let (state, _) = watch::channel(AuthSnapshot {
            loading: true,
            ..AuthSnapshot::default()
        });
        let shared = Arc::new(TrackerShared {
            state,
            profiles,
            last_login,
            last_login_sent: AtomicBool::new(false),
            change_applied: AtomicBool::new(false),
            profile_generation: AtomicU64::new(0),
        });

        let subscription = backend.subscribe();
        let listener_task = tokio::spawn(listen(subscription, shared.clone()));
        let bootstrap_task = tokio::spawn(bootstrap(backend, shared.clone(), timeouts));

        Self {
            shared,
            bootstrap_task,
            listener_task,
        }
    }

    /// Returns a receiver that observes every snapshot change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.shared.state.subscribe()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Waits until the tracker has settled into a known state.
    pub async fn initialized(&self) -> AuthSnapshot {
        let mut receiver = self.subscribe();
        match receiver.wait_for(|snapshot| snapshot.initialized).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Stops listening for auth changes and cancels a pending bootstrap.
    pub fn unmount(self) {
        debug!("unmounting session tracker");
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.bootstrap_task.abort();
        self.listener_task.abort();
    }
}

async fn bootstrap(
    backend: Arc<dyn AuthBackend>,
    shared: Arc<TrackerShared>,
    timeouts: TrackerTimeouts,
) {
    let lookup = async { Ok(resolve_initial_identity(backend.as_ref(), &timeouts).await) };
    let outcome = settle(timeouts.bootstrap, lookup).await;
    if outcome.is_timed_out() {
        warn!(
            bound_ms = u64::try_from(timeouts.bootstrap.as_millis()).unwrap_or(u64::MAX),
            "session bootstrap timed out, continuing anonymously"
        );
    }
    let identity = outcome.value("session bootstrap").flatten();

    let applied = shared.state.send_if_modified(|snapshot| {
        if shared.change_applied.load(Ordering::SeqCst) {
            return false;
        }
        snapshot.identity = identity.clone();
        snapshot.profile = None;
        snapshot.loading = false;
        snapshot.initialized = true;
        true
    });

    if !applied {
        debug!("auth change arrived before bootstrap finished, bootstrap result discarded");
        return;
    }

    match identity {
        Some(identity) => {
            info!(user_id = %identity.id(), "session restored");
            spawn_profile_fetch(&shared, identity.id());
        }
        None => info!("no active session"),
    }
}

async fn resolve_initial_identity(
    backend: &dyn AuthBackend,
    timeouts: &TrackerTimeouts,
) -> Option<Identity> {
    match settle(timeouts.cached_session, backend.cached_session()).await {
        Settled::Value(Some(session)) if !session.is_expired(Utc::now()) => {
            return Some(session.user);
        }
        Settled::Value(Some(_)) => debug!("cached session is expired"),
        Settled::Value(None) => debug!("no cached session"),
        Settled::Failed(error) => debug!(error = %error, "cached session lookup failed"),
        Settled::TimedOut => debug!("cached session lookup timed out"),
    }

    settle(timeouts.identity_confirmation, backend.confirm_identity())
        .await
        .value("identity confirmation")
}

async fn listen(mut subscription: AuthSubscription, shared: Arc<TrackerShared>) {
    while let Some(change) = subscription.next().await {
        apply_change(&shared, change);
    }
    debug!("auth change stream closed");
}

fn apply_change(shared: &Arc<TrackerShared>, change: AuthChange) {
    let identity = change.identity().cloned();
    let user_id = identity.as_ref().map(Identity::id);

    shared.state.send_modify(|snapshot| {
        shared.change_applied.store(true, Ordering::SeqCst);
        if snapshot.user_id() != user_id {
            snapshot.profile = None;
        }
        snapshot.identity = identity;
        snapshot.loading = false;
        snapshot.initialized = true;
    });

    debug!(kind = ?change.kind, user_id = ?user_id, "auth change applied");

    match (change.kind, user_id) {
        // A change without a session ends the tracked session even when no
        // explicit sign-out was emitted, e.g. after a failed silent refresh.
        (AuthChangeKind::SignedOut, _) | (_, None) => {
            shared.last_login_sent.store(false, Ordering::SeqCst);
        }
        (AuthChangeKind::SignedIn, Some(user_id)) => {
            if !shared.last_login_sent.swap(true, Ordering::SeqCst) {
                spawn_last_login(shared, user_id);
            }
        }
        _ => {}
    }

    if let Some(user_id) = user_id {
        spawn_profile_fetch(shared, user_id);
    }
}

fn spawn_profile_fetch(shared: &Arc<TrackerShared>, user_id: UserId) {
    let generation = shared.profile_generation.fetch_add(1, Ordering::SeqCst) + 1;
    let profiles = shared.profiles.clone();
    let tracker: Weak<TrackerShared> = Arc::downgrade(shared);
    tokio::spawn(async move {
        match profiles.find_profile_by_identity(user_id).await {
            Ok(profile) => {
                let Some(shared) = tracker.upgrade() else {
                    debug!(user_id = %user_id, "tracker unmounted, profile discarded");
                    return;
                };
                if profile.is_none() {
                    warn!(user_id = %user_id, "no profile found for identity");
                }
                shared.state.send_if_modified(|snapshot| {
                    if shared.profile_generation.load(Ordering::SeqCst) != generation {
                        debug!(user_id = %user_id, "newer profile fetch pending, result dropped");
                        return false;
                    }
                    if snapshot.user_id() != Some(user_id) || snapshot.profile == profile {
                        return false;
                    }
                    snapshot.profile = profile;
                    true
                });
            }
            Err(error) => {
                warn!(user_id = %user_id, error = %error, "failed to fetch profile");
            }
        }
    });
}

fn spawn_last_login(shared: &Arc<TrackerShared>, user_id: UserId) {
    let last_login = shared.last_login.clone();
    tokio::spawn(async move {
        if let Err(error) = last_login.notify_last_login(user_id).await {
            warn!(user_id = %user_id, error = %error, "failed to record last login");
        }
    });
}
