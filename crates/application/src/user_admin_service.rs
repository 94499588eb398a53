//! User administration: cascading account removal.

use std::sync::Arc;

use tracing::info;

use tenantdesk_core::{AppError, AppResult, Identity, UserId};
use tenantdesk_domain::{Profile, Role};

use crate::{CascadeDeleteSummary, IdentityAdmin, ProfileAdminRepository};

#[cfg(test)]
mod tests;

/// Application service for admin-only user operations.
#[derive(Clone)]
pub struct UserAdminService {
    profiles: Arc<dyn ProfileAdminRepository>,
    identity_admin: Arc<dyn IdentityAdmin>,
}

impl UserAdminService {
    /// Creates a new user admin service.
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileAdminRepository>,
        identity_admin: Arc<dyn IdentityAdmin>,
    ) -> Self {
        Self {
            profiles,
            identity_admin,
        }
    }

    /// Removes the identity from the auth service, then deletes the user's
    /// memberships, asset ownership and profile.
    ///
    /// Superadmins may delete anyone but themselves. Tenant admins may delete
    /// non-superadmin users of their own tenant.
    pub async fn delete_user(
        &self,
        caller: &Identity,
        user_id: UserId,
    ) -> AppResult<CascadeDeleteSummary> {
        if caller.id() == user_id {
            return Err(AppError::Conflict(
                "users cannot delete their own account".to_owned(),
            ));
        }

        let actor = self
            .profiles
            .find_by_id(caller.id())
            .await?
            .ok_or_else(|| AppError::Forbidden("caller has no profile".to_owned()))?;
        let target = self
            .profiles
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        if !may_delete(&actor, &target) {
            return Err(AppError::Forbidden(format!(
                "role '{}' may not delete user '{user_id}'",
                actor.role.as_str()
            )));
        }

        // Profile rows must outlive the identity: retries find the target by profile.
        self.identity_admin.delete_identity(user_id).await?;
        let summary = self.profiles.delete_user_cascade(user_id).await?;

        info!(
            actor = %caller.id(),
            user_id = %user_id,
            team_memberships = summary.team_memberships,
            assets_unassigned = summary.assets_unassigned,
            "user deleted"
        );

        Ok(summary)
    }
}

fn may_delete(actor: &Profile, target: &Profile) -> bool {
    match actor.role {
        Role::Superadmin => true,
        Role::TenantAdmin => {
            target.role != Role::Superadmin
                && target
                    .tenant_id
                    .is_some_and(|tenant_id| actor.administers(tenant_id))
        }
        Role::TenantUser => false,
    }
}
