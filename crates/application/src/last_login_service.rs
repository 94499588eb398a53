use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use tenantdesk_core::{AppError, AppResult, Identity, UserId};

use crate::ProfileAdminRepository;

/// Application service behind the last-login route.
#[derive(Clone)]
pub struct LastLoginService {
    profiles: Arc<dyn ProfileAdminRepository>,
}

impl LastLoginService {
    /// Creates a service from a profile repository.
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileAdminRepository>) -> Self {
        Self { profiles }
    }

    /// Stamps the caller's profile with the current time.
    ///
    /// Callers may only stamp their own profile.
    pub async fn record_sign_in(
        &self,
        caller: &Identity,
        user_id: UserId,
    ) -> AppResult<DateTime<Utc>> {
        if caller.id() != user_id {
            return Err(AppError::Forbidden(
                "last login can only be recorded for the signed-in user".to_owned(),
            ));
        }

        let at = Utc::now();
        if !self.profiles.touch_last_login(user_id, at).await? {
            return Err(AppError::NotFound(format!("profile '{user_id}' does not exist")));
        }

        info!(user_id = %user_id, "last login recorded");
        Ok(at)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tenantdesk_core::{AppError, AppResult, Identity, UserId};
    use tenantdesk_domain::Profile;

    use super::LastLoginService;
    use crate::{CascadeDeleteSummary, ProfileAdminRepository};

    #[derive(Default)]
    struct StampRecorder {
        known: Vec<UserId>,
        stamped: Mutex<Vec<(UserId, DateTime<Utc>)>>,
    }

    #[async_trait]
    impl ProfileAdminRepository for StampRecorder {
        async fn find_by_id(&self, _user_id: UserId) -> AppResult<Option<Profile>> {
            Ok(None)
        }

        async fn touch_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<bool> {
            if !self.known.contains(&user_id) {
                return Ok(false);
            }
            self.stamped
                .lock()
                .map_err(|error| AppError::Internal(format!("failed to lock stamps: {error}")))?
                .push((user_id, at));
            Ok(true)
        }

        async fn delete_user_cascade(&self, _user_id: UserId) -> AppResult<CascadeDeleteSummary> {
            Ok(CascadeDeleteSummary::default())
        }
    }

    #[tokio::test]
    async fn own_profile_is_stamped() {
        let user_id = UserId::new();
        let repository = Arc::new(StampRecorder {
            known: vec![user_id],
            ..StampRecorder::default()
        });
        let service = LastLoginService::new(repository.clone());

        let result = service
            .record_sign_in(&Identity::new(user_id, None), user_id)
            .await;

        assert!(result.is_ok());
        let stamped = repository.stamped.lock().map(|stamps| stamps.len()).unwrap_or(0);
        assert_eq!(stamped, 1);
    }

    #[tokio::test]
    async fn stamping_someone_else_is_forbidden() {
        let service = LastLoginService::new(Arc::new(StampRecorder::default()));

        let result = service
            .record_sign_in(&Identity::new(UserId::new(), None), UserId::new())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let user_id = UserId::new();
        let service = LastLoginService::new(Arc::new(StampRecorder::default()));

        let result = service
            .record_sign_in(&Identity::new(user_id, None), user_id)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
