//! PostgreSQL implementation of MirrorReader.
//!
//! Reads the contact, group and message tables the protocol sidecar keeps in
//! sync. Nothing here writes.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, InstanceKey, Timestamp};
use crate::ports::{MirrorReader, MirrorStats, MirroredChat, MirroredMessage};

#[derive(Clone)]
pub struct PostgresMirrorReader {
    pool: PgPool,
}

impl PostgresMirrorReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn chats(&self, table: &str, instance: &InstanceKey) -> Result<Vec<MirroredChat>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT jid, name, created_at FROM {} WHERE instance = $1 ORDER BY name ASC",
            table
        ))
        .bind(instance.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to read {}: {}", table, e)))?;

        rows.into_iter()
            .map(|row| {
                let created_at: chrono::DateTime<chrono::Utc> = get(&row, "created_at")?;
                Ok(MirroredChat {
                    jid: get(&row, "jid")?,
                    name: get(&row, "name")?,
                    created_at: Timestamp::from_datetime(created_at),
                })
            })
            .collect()
    }

    async fn count(&self, table: &str, instance: &InstanceKey) -> Result<i64, DomainError> {
        let result: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE instance = $1",
            table
        ))
        .bind(instance.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to count {}: {}", table, e)))?;
        Ok(result.0)
    }
}

fn get<'r, T>(row: &'r sqlx::postgres::PgRow, column: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| DomainError::database(format!("Failed to get {}: {}", column, e)))
}

#[async_trait]
impl MirrorReader for PostgresMirrorReader {
    async fn contacts(&self, instance: &InstanceKey) -> Result<Vec<MirroredChat>, DomainError> {
        self.chats("contacts", instance).await
    }

    async fn groups(&self, instance: &InstanceKey) -> Result<Vec<MirroredChat>, DomainError> {
        self.chats("groups", instance).await
    }

    async fn messages(
        &self,
        instance: &InstanceKey,
        jid: &str,
        limit: i64,
    ) -> Result<Vec<MirroredMessage>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, content, created_at
            FROM messages
            WHERE instance = $1 AND jid = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(instance.as_str())
        .bind(jid)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to read messages: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let created_at: chrono::DateTime<chrono::Utc> = get(&row, "created_at")?;
                Ok(MirroredMessage {
                    id: get(&row, "id")?,
                    kind: get(&row, "kind")?,
                    content: get(&row, "content")?,
                    created_at: Timestamp::from_datetime(created_at),
                })
            })
            .collect()
    }

    async fn stats(&self, instance: &InstanceKey) -> Result<MirrorStats, DomainError> {
        Ok(MirrorStats {
            contacts: self.count("contacts", instance).await?,
            groups: self.count("groups", instance).await?,
            messages: self.count("messages", instance).await?,
        })
    }
}
