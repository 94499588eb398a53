//! PostgreSQL-backed profile administration.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tenantdesk_application::{CascadeDeleteSummary, ProfileAdminRepository};
use tenantdesk_core::{AppError, AppResult, TenantId, UserId};
use tenantdesk_domain::{Profile, Role};

mod cascade;

/// PostgreSQL implementation of the profile admin repository port.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: uuid::Uuid,
    full_name: Option<String>,
    email: Option<String>,
    role: String,
    tenant_id: Option<uuid::Uuid>,
    title: Option<String>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            full_name: row.full_name,
            email: row.email,
            role: Role::from_str(row.role.as_str())?,
            tenant_id: row.tenant_id.map(TenantId::from_uuid),
            title: row.title,
            last_login: row.last_login,
        })
    }
}

#[async_trait]
impl ProfileAdminRepository for PostgresProfileRepository {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, full_name, email, role, tenant_id, title, last_login
            FROM profiles
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find profile by id: {error}")))?;

        row.map(Profile::try_from).transpose()
    }

    async fn touch_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET last_login = $2,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update last login: {error}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_cascade(&self, user_id: UserId) -> AppResult<CascadeDeleteSummary> {
        self.delete_user_cascade_impl(user_id).await
    }
}
