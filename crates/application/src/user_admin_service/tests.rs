use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tenantdesk_core::{AppError, AppResult, Identity, TenantId, UserId};
use tenantdesk_domain::{Profile, Role};

use super::UserAdminService;
use crate::{CascadeDeleteSummary, IdentityAdmin, ProfileAdminRepository};

#[derive(Default)]
struct TestProfileRepo {
    profiles: Mutex<HashMap<UserId, Profile>>,
}

impl TestProfileRepo {
    fn with(profiles: &[Profile]) -> Arc<Self> {
        Arc::new(Self {
            profiles: Mutex::new(
                profiles
                    .iter()
                    .map(|profile| (profile.id, profile.clone()))
                    .collect(),
            ),
        })
    }

    fn contains(&self, user_id: UserId) -> bool {
        self.profiles
            .lock()
            .map(|profiles| profiles.contains_key(&user_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ProfileAdminRepository for TestProfileRepo {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock repo state: {error}")))?
            .get(&user_id)
            .cloned())
    }

    async fn touch_last_login(&self, _user_id: UserId, _at: DateTime<Utc>) -> AppResult<bool> {
        Ok(true)
    }

    async fn delete_user_cascade(&self, user_id: UserId) -> AppResult<CascadeDeleteSummary> {
        let removed = self
            .profiles
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock repo state: {error}")))?
            .remove(&user_id);

        Ok(CascadeDeleteSummary {
            team_memberships: 2,
            assets_unassigned: 1,
            profiles: u64::from(removed.is_some()),
        })
    }
}

#[derive(Default)]
struct TestIdentityAdmin {
    deleted: Mutex<Vec<UserId>>,
    failures_left: AtomicUsize,
}

impl TestIdentityAdmin {
    fn failing_once() -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicUsize::new(1),
            ..Self::default()
        })
    }
}

#[async_trait]
impl IdentityAdmin for TestIdentityAdmin {
    async fn verify_access_token(&self, _access_token: &str) -> AppResult<Identity> {
        Err(AppError::Unauthorized("not used".to_owned()))
    }

    async fn delete_identity(&self, user_id: UserId) -> AppResult<()> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Internal("auth admin returned 503".to_owned()));
        }

        self.deleted
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock identity state: {error}")))?
            .push(user_id);
        Ok(())
    }
}

fn profile(role: Role, tenant_id: Option<TenantId>) -> Profile {
    Profile {
        id: UserId::new(),
        full_name: None,
        email: None,
        role,
        tenant_id,
        title: None,
        last_login: None,
    }
}

fn caller(profile: &Profile) -> Identity {
    Identity::new(profile.id, None)
}

fn service(repo: &Arc<TestProfileRepo>, identities: &Arc<TestIdentityAdmin>) -> UserAdminService {
    UserAdminService::new(repo.clone(), identities.clone())
}

#[tokio::test]
async fn superadmin_deletes_user_and_identity() {
    let admin = profile(Role::Superadmin, None);
    let target = profile(Role::TenantUser, Some(TenantId::new()));
    let repo = TestProfileRepo::with(&[admin.clone(), target.clone()]);
    let identities = Arc::new(TestIdentityAdmin::default());

    let summary = service(&repo, &identities)
        .delete_user(&caller(&admin), target.id)
        .await;

    assert_eq!(summary.map(|summary| summary.profiles).ok(), Some(1));
    assert!(!repo.contains(target.id));
    let deleted = identities.deleted.lock().map(|ids| ids.clone()).unwrap_or_default();
    assert_eq!(deleted, vec![target.id]);
}

#[tokio::test]
async fn tenant_admin_deletes_within_own_tenant() {
    let tenant_id = TenantId::new();
    let admin = profile(Role::TenantAdmin, Some(tenant_id));
    let target = profile(Role::TenantUser, Some(tenant_id));
    let repo = TestProfileRepo::with(&[admin.clone(), target.clone()]);

    let result = service(&repo, &Arc::new(TestIdentityAdmin::default()))
        .delete_user(&caller(&admin), target.id)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn tenant_admin_cannot_reach_other_tenant() {
    let admin = profile(Role::TenantAdmin, Some(TenantId::new()));
    let target = profile(Role::TenantUser, Some(TenantId::new()));
    let repo = TestProfileRepo::with(&[admin.clone(), target.clone()]);
    let identities = Arc::new(TestIdentityAdmin::default());

    let result = service(&repo, &identities)
        .delete_user(&caller(&admin), target.id)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(repo.contains(target.id));
    let deleted = identities.deleted.lock().map(|ids| ids.len()).unwrap_or(0);
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn tenant_user_cannot_delete_anyone() {
    let tenant_id = TenantId::new();
    let member = profile(Role::TenantUser, Some(tenant_id));
    let target = profile(Role::TenantUser, Some(tenant_id));
    let repo = TestProfileRepo::with(&[member.clone(), target.clone()]);

    let result = service(&repo, &Arc::new(TestIdentityAdmin::default()))
        .delete_user(&caller(&member), target.id)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn self_deletion_is_rejected() {
    let admin = profile(Role::Superadmin, None);
    let repo = TestProfileRepo::with(std::slice::from_ref(&admin));

    let result = service(&repo, &Arc::new(TestIdentityAdmin::default()))
        .delete_user(&caller(&admin), admin.id)
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn missing_target_is_not_found() {
    let admin = profile(Role::Superadmin, None);
    let repo = TestProfileRepo::with(std::slice::from_ref(&admin));

    let result = service(&repo, &Arc::new(TestIdentityAdmin::default()))
        .delete_user(&caller(&admin), UserId::new())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn failed_identity_delete_keeps_profile_for_retry() {
    let admin = profile(Role::Superadmin, None);
    let target = profile(Role::TenantUser, Some(TenantId::new()));
    let repo = TestProfileRepo::with(&[admin.clone(), target.clone()]);
    let identities = TestIdentityAdmin::failing_once();
    let service = service(&repo, &identities);

    let first = service.delete_user(&caller(&admin), target.id).await;

    assert!(matches!(first, Err(AppError::Internal(_))));
    assert!(repo.contains(target.id));

    let retry = service.delete_user(&caller(&admin), target.id).await;

    assert!(retry.is_ok());
    assert!(!repo.contains(target.id));
    let deleted = identities.deleted.lock().map(|ids| ids.clone()).unwrap_or_default();
    assert_eq!(deleted, vec![target.id]);
}
