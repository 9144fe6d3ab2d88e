use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{RegistryError, RegistryResult};
use crate::models::{InstanceRegistration, InstanceStatus};

/// System of record for instance registrations. The cache and notifier
/// are derivatives of what lives here.
#[derive(Clone)]
pub struct InstanceRegistry {
    pool: PgPool,
}

impl InstanceRegistry {
    pub async fn connect(database_url: &str) -> RegistryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            RegistryError::Database(sqlx::Error::Migrate(Box::new(e)))
        })?;

        info!("instance registry connected");
        Ok(Self { pool })
    }

    /// Atomically inserts a row with `status=pending, enabled=true`. The
    /// unique partial index on `(organization_id) WHERE type='whatsapp'
    /// AND enabled` is the real enforcement; any pre-check the caller did
    /// is advisory only and exists purely to produce a nicer error before
    /// hitting the race.
    #[instrument(skip(self, webhook_url, config))]
    pub async fn register(
        &self,
        organization_id: Uuid,
        clinic_id: Option<Uuid>,
        instance_name: &str,
        webhook_token: &str,
        webhook_url: &str,
        config: serde_json::Value,
    ) -> RegistryResult<InstanceRegistration> {
        let row = sqlx::query_as::<_, InstanceRegistration>(
            r#"
            INSERT INTO instance_registrations
                (organization_id, clinic_id, type, provider, instance_name,
                 webhook_token, webhook_url, status, enabled, config)
            VALUES ($1, $2, 'whatsapp', 'evolution', $3, $4, $5, 'pending', true, $6)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(clinic_id)
        .bind(instance_name)
        .bind(webhook_token)
        .bind(webhook_url)
        .bind(config)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RegistryError::AlreadyEnabled { organization_id }
            }
            _ => RegistryError::Database(err),
        })?;

        Ok(row)
    }

    pub async fn find_by_instance(&self, instance_name: &str) -> RegistryResult<Option<InstanceRegistration>> {
        let row = sqlx::query_as::<_, InstanceRegistration>(
            "SELECT * FROM instance_registrations WHERE instance_name = $1",
        )
        .bind(instance_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_webhook_token(&self, webhook_token: &str) -> RegistryResult<Option<InstanceRegistration>> {
        let row = sqlx::query_as::<_, InstanceRegistration>(
            "SELECT * FROM instance_registrations WHERE webhook_token = $1",
        )
        .bind(webhook_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_enabled_for_organization(
        &self,
        organization_id: Uuid,
    ) -> RegistryResult<Option<InstanceRegistration>> {
        let row = sqlx::query_as::<_, InstanceRegistration>(
            "SELECT * FROM instance_registrations WHERE organization_id = $1 AND type = 'whatsapp' AND enabled",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        instance_name: &str,
        status: InstanceStatus,
        phone_number: Option<&str>,
    ) -> RegistryResult<()> {
        sqlx::query(
            r#"
            UPDATE instance_registrations
            SET status = $1,
                last_seen_at = now(),
                phone_number = COALESCE($2, phone_number),
                connected_at = CASE WHEN $1 = 'active' THEN now() ELSE connected_at END,
                updated_at = now()
            WHERE instance_name = $3
            "#,
        )
        .bind(status.as_str())
        .bind(phone_number)
        .bind(instance_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Row delete. Callers MUST perform this last in the delete
    /// discipline — after the upstream delete, the removed-notification,
    /// and the cache invalidation.
    #[instrument(skip(self))]
    pub async fn delete(&self, instance_name: &str) -> RegistryResult<()> {
        let result = sqlx::query("DELETE FROM instance_registrations WHERE instance_name = $1")
            .bind(instance_name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(instance_name.to_string()));
        }
        Ok(())
    }

    pub async fn list_all_instance_names(&self) -> RegistryResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT instance_name FROM instance_registrations")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Boot-time source for the worker supervisor: a disabled integration
    /// must not get a live delivery worker consuming its stream.
    pub async fn list_enabled_instance_names(&self) -> RegistryResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT instance_name FROM instance_registrations WHERE enabled")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_as_str_matches_db_values() {
        assert_eq!(InstanceStatus::QrPending.as_str(), "qr_pending");
        assert_eq!(InstanceStatus::Active.as_str(), "active");
    }
}
