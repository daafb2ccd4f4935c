//! PostgreSQL implementation of ApiKeyRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::access::{NewPrincipal, Principal, PrincipalKind};
use crate::domain::foundation::{DomainError, ErrorCode, PrincipalId, Timestamp};
use crate::ports::ApiKeyRepository;

const COLUMNS: &str = "id, key_hash, key_prefix, name, kind, active, allowed_instances, \
                       created_at, expires_at, last_used_at, request_count";

#[derive(Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(action: &str) -> impl FnOnce(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<Principal>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM api_keys WHERE key_hash = $1", COLUMNS))
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch API key"))?;

        row.map(row_to_principal).transpose()
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM api_keys WHERE id = $1", COLUMNS))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch API key"))?;

        row.map(row_to_principal).transpose()
    }

    async fn list(&self) -> Result<Vec<Principal>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM api_keys ORDER BY created_at DESC, id DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list API keys"))?;

        rows.into_iter().map(row_to_principal).collect()
    }

    async fn insert(&self, new: NewPrincipal) -> Result<Principal, DomainError> {
        let allowed: Vec<String> = new.allowed_instances.into_iter().collect();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO api_keys (key_hash, key_prefix, name, kind, allowed_instances, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&new.key_hash)
        .bind(&new.key_prefix)
        .bind(&new.name)
        .bind(new.kind.as_str())
        .bind(&allowed)
        .bind(new.expires_at.map(|t| *t.as_datetime()))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("insert API key"))?;

        row_to_principal(row)
    }

    async fn update(&self, principal: &Principal) -> Result<(), DomainError> {
        let allowed: Vec<String> = principal.allowed_instances.iter().cloned().collect();
        let result = sqlx::query(
            r#"
            UPDATE api_keys SET
                name = $2,
                active = $3,
                kind = $4,
                allowed_instances = $5,
                expires_at = $6
            WHERE id = $1
            "#,
        )
        .bind(principal.id.as_i64())
        .bind(&principal.name)
        .bind(principal.active)
        .bind(principal.kind.as_str())
        .bind(&allowed)
        .bind(principal.expires_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(db_error("update API key"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ApiKeyNotFound,
                format!("API key not found: {}", principal.id),
            ));
        }
        Ok(())
    }

    async fn delete(&self, id: PrincipalId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete API key"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_usage(&self, id: PrincipalId, at: Timestamp) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE api_keys SET last_used_at = $2, request_count = request_count + 1 WHERE id = $1",
        )
        .bind(id.as_i64())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("record API key usage"))?;
        Ok(())
    }
}

fn row_to_principal(row: sqlx::postgres::PgRow) -> Result<Principal, DomainError> {
    let column = |name: &str, e: sqlx::Error| {
        DomainError::database(format!("Failed to read api_keys.{}: {}", name, e))
    };

    let kind: String = row.try_get("kind").map_err(|e| column("kind", e))?;
    let allowed: Vec<String> = row
        .try_get("allowed_instances")
        .map_err(|e| column("allowed_instances", e))?;
    let created_at: chrono::DateTime<chrono::Utc> =
        row.try_get("created_at").map_err(|e| column("created_at", e))?;
    let expires_at: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("expires_at").map_err(|e| column("expires_at", e))?;
    let last_used_at: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("last_used_at").map_err(|e| column("last_used_at", e))?;

    Ok(Principal {
        id: PrincipalId::new(row.try_get("id").map_err(|e| column("id", e))?),
        key_hash: row.try_get("key_hash").map_err(|e| column("key_hash", e))?,
        key_prefix: row.try_get("key_prefix").map_err(|e| column("key_prefix", e))?,
        name: row.try_get("name").map_err(|e| column("name", e))?,
        kind: kind.parse::<PrincipalKind>()?,
        active: row.try_get("active").map_err(|e| column("active", e))?,
        allowed_instances: allowed.into_iter().collect(),
        created_at: Timestamp::from_datetime(created_at),
        expires_at: expires_at.map(Timestamp::from_datetime),
        last_used_at: last_used_at.map(Timestamp::from_datetime),
        request_count: row.try_get("request_count").map_err(|e| column("request_count", e))?,
    })
}
