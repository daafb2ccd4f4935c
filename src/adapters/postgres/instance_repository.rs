//! PostgreSQL implementation of InstanceRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, InstanceKey, PrincipalId, Timestamp};
use crate::ports::{InstanceRecord, InstanceRepository};

#[derive(Clone)]
pub struct PostgresInstanceRepository {
    pool: PgPool,
}

impl PostgresInstanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstanceRepository for PostgresInstanceRepository {
    async fn upsert(
        &self,
        name: &InstanceKey,
        owner: Option<PrincipalId>,
    ) -> Result<InstanceRecord, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO instances (name, created_by)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET
                updated_at = NOW(),
                created_by = COALESCE(EXCLUDED.created_by, instances.created_by)
            RETURNING name, created_by, created_at
            "#,
        )
        .bind(name.as_str())
        .bind(owner.map(|o| o.as_i64()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to register instance: {}", e)))?;

        row_to_record(row)
    }

    async fn list_all(&self) -> Result<Vec<InstanceRecord>, DomainError> {
        let rows = sqlx::query(
            "SELECT name, created_by, created_at FROM instances ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list instances: {}", e)))?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn list_named(&self, names: &[String]) -> Result<Vec<InstanceRecord>, DomainError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT name, created_by, created_at FROM instances WHERE name = ANY($1) ORDER BY name ASC",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list instances: {}", e)))?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Removes the registration and every mirrored row in one transaction.
    async fn delete_cascade(&self, name: &InstanceKey) -> Result<bool, DomainError> {
        let tx_error = |e: sqlx::Error| DomainError::database(format!("Failed to delete instance: {}", e));
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        for table in ["contacts", "groups", "messages"] {
            sqlx::query(&format!("DELETE FROM {} WHERE instance = $1", table))
                .bind(name.as_str())
                .execute(&mut *tx)
                .await
                .map_err(tx_error)?;
        }
        let result = sqlx::query("DELETE FROM instances WHERE name = $1")
            .bind(name.as_str())
            .execute(&mut *tx)
            .await
            .map_err(tx_error)?;

        tx.commit().await.map_err(tx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: sqlx::postgres::PgRow) -> Result<InstanceRecord, DomainError> {
    let name: String = row
        .try_get("name")
        .map_err(|e| DomainError::database(format!("Failed to get name: {}", e)))?;
    let owner: Option<i64> = row
        .try_get("created_by")
        .map_err(|e| DomainError::database(format!("Failed to get created_by: {}", e)))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| DomainError::database(format!("Failed to get created_at: {}", e)))?;

    Ok(InstanceRecord {
        name: InstanceKey::new(name)?,
        owner: owner.map(PrincipalId::new),
        created_at: Timestamp::from_datetime(created_at),
    })
}
