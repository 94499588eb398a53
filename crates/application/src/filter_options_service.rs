//! Tenant-scoped dropdown options for the asset inventory.

use std::sync::Arc;

use tenantdesk_core::{AppError, AppResult, Identity, TenantId};
use tenantdesk_domain::AssetFilterField;

use crate::{AssetFilterRepository, ProfileAdminRepository};

/// Filter choices offered above the asset table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilterOptions {
    /// Distinct categories, sorted.
    pub categories: Vec<String>,
    /// Distinct locations, sorted.
    pub locations: Vec<String>,
    /// Distinct statuses, sorted.
    pub statuses: Vec<String>,
}

/// Application service assembling filter options.
#[derive(Clone)]
pub struct FilterOptionsService {
    profiles: Arc<dyn ProfileAdminRepository>,
    assets: Arc<dyn AssetFilterRepository>,
}

impl FilterOptionsService {
    /// Creates a new filter options service.
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileAdminRepository>,
        assets: Arc<dyn AssetFilterRepository>,
    ) -> Self {
        Self { profiles, assets }
    }

    /// Loads the asset filter options of `tenant_id` visible to the caller.
    pub async fn asset_filter_options(
        &self,
        caller: &Identity,
        tenant_id: TenantId,
    ) -> AppResult<AssetFilterOptions> {
        let profile = self
            .profiles
            .find_by_id(caller.id())
            .await?
            .ok_or_else(|| AppError::Forbidden("caller has no profile".to_owned()))?;

        if !profile.tenant_scope(Some(tenant_id)).includes(tenant_id) {
            return Err(AppError::Forbidden(format!(
                "tenant '{tenant_id}' is outside the caller's scope"
            )));
        }

        let (categories, locations, statuses) = tokio::try_join!(
            self.assets
                .distinct_values(tenant_id, AssetFilterField::Category),
            self.assets
                .distinct_values(tenant_id, AssetFilterField::Location),
            self.assets.distinct_values(tenant_id, AssetFilterField::Status),
        )?;

        Ok(AssetFilterOptions {
            categories: normalize_options(categories),
            locations: normalize_options(locations),
            statuses: normalize_options(statuses),
        })
    }
}

fn normalize_options(values: Vec<String>) -> Vec<String> {
    let mut options: Vec<String> = values
        .into_iter()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect();
    options.sort_by_key(|value| value.to_lowercase());
    options.dedup_by(|left, right| left.eq_ignore_ascii_case(right));
    options
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tenantdesk_core::{AppError, AppResult, Identity, TenantId, UserId};
    use tenantdesk_domain::{AssetFilterField, Profile, Role};

    use super::{FilterOptionsService, normalize_options};
    use crate::{AssetFilterRepository, CascadeDeleteSummary, ProfileAdminRepository};

    struct SingleProfile(Profile);

    #[async_trait]
    impl ProfileAdminRepository for SingleProfile {
        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<Profile>> {
            Ok((self.0.id == user_id).then(|| self.0.clone()))
        }

        async fn touch_last_login(&self, _user_id: UserId, _at: DateTime<Utc>) -> AppResult<bool> {
            Ok(true)
        }

        async fn delete_user_cascade(&self, _user_id: UserId) -> AppResult<CascadeDeleteSummary> {
            Ok(CascadeDeleteSummary::default())
        }
    }

    struct StaticAssets {
        fail_status: bool,
    }

    #[async_trait]
    impl AssetFilterRepository for StaticAssets {
        async fn distinct_values(
            &self,
            _tenant_id: TenantId,
            field: AssetFilterField,
        ) -> AppResult<Vec<String>> {
            let values = match field {
                AssetFilterField::Category => vec!["Laptop", "server", " ", "laptop"],
                AssetFilterField::Location => vec!["Berlin", "Austin"],
                AssetFilterField::Status if self.fail_status => {
                    return Err(AppError::Internal("status query failed".to_owned()));
                }
                AssetFilterField::Status => vec!["retired", "active"],
            };
            Ok(values.into_iter().map(ToOwned::to_owned).collect())
        }
    }

    fn member_of(tenant_id: TenantId) -> Profile {
        Profile {
            id: UserId::new(),
            full_name: None,
            email: None,
            role: Role::TenantUser,
            tenant_id: Some(tenant_id),
            title: None,
            last_login: None,
        }
    }

    #[test]
    fn options_are_trimmed_sorted_and_deduplicated() {
        let options = normalize_options(
            ["Server ", "laptop", "", "Laptop", "desk"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
        );
        assert_eq!(options, vec!["desk", "laptop", "Server"]);
    }

    #[tokio::test]
    async fn foreign_tenant_is_forbidden() {
        let profile = member_of(TenantId::new());
        let caller = Identity::new(profile.id, None);
        let service = FilterOptionsService::new(
            Arc::new(SingleProfile(profile)),
            Arc::new(StaticAssets { fail_status: false }),
        );

        let result = service.asset_filter_options(&caller, TenantId::new()).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn any_failing_query_fails_the_whole_request() {
        let tenant_id = TenantId::new();
        let profile = member_of(tenant_id);
        let caller = Identity::new(profile.id, None);
        let service = FilterOptionsService::new(
            Arc::new(SingleProfile(profile)),
            Arc::new(StaticAssets { fail_status: true }),
        );

        let result = service.asset_filter_options(&caller, tenant_id).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn member_receives_options_for_own_tenant() {
        let tenant_id = TenantId::new();
        let profile = member_of(tenant_id);
        let caller = Identity::new(profile.id, None);
        let service = FilterOptionsService::new(
            Arc::new(SingleProfile(profile)),
            Arc::new(StaticAssets { fail_status: false }),
        );

        let options = service
            .asset_filter_options(&caller, tenant_id)
            .await
            .unwrap_or_default();

        assert_eq!(options.categories, vec!["Laptop", "server"]);
        assert_eq!(options.locations, vec!["Austin", "Berlin"]);
        assert_eq!(options.statuses, vec!["active", "retired"]);
    }
}
