use async_trait::async_trait;
use sqlx::PgPool;

use tenantdesk_application::AssetFilterRepository;
use tenantdesk_core::{AppError, AppResult, TenantId};
use tenantdesk_domain::AssetFilterField;

/// PostgreSQL implementation of the asset filter repository port.
#[derive(Clone)]
pub struct PostgresAssetFilterRepository {
    pool: PgPool,
}

impl PostgresAssetFilterRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetFilterRepository for PostgresAssetFilterRepository {
    async fn distinct_values(
        &self,
        tenant_id: TenantId,
        field: AssetFilterField,
    ) -> AppResult<Vec<String>> {
        // Column names come from a closed enum, never from request input.
        let column = field.column();
        let statement = format!(
            "SELECT DISTINCT {column} FROM assets WHERE tenant_id = $1 AND {column} IS NOT NULL"
        );

        sqlx::query_scalar::<_, String>(statement.as_str())
            .bind(tenant_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to list asset {column} values for tenant '{tenant_id}': {error}"
                ))
            })
    }
}
