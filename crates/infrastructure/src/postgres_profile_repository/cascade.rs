use super::*;

impl PostgresProfileRepository {
    pub(super) async fn delete_user_cascade_impl(
        &self,
        user_id: UserId,
    ) -> AppResult<CascadeDeleteSummary> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let team_memberships = sqlx::query(
            r#"
            DELETE FROM team_members
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete team memberships: {error}"))
        })?
        .rows_affected();

        let assets_unassigned = sqlx::query(
            r#"
            UPDATE assets
            SET owner_id = NULL,
                updated_at = now()
            WHERE owner_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to unassign assets: {error}")))?
        .rows_affected();

        let profiles = sqlx::query(
            r#"
            DELETE FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete profile: {error}")))?
        .rows_affected();

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(CascadeDeleteSummary {
            team_memberships,
            assets_unassigned,
            profiles,
        })
    }
}
