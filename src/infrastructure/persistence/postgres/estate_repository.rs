//! # PostgreSQL Estate Repository
//!
//! PostgreSQL implementation of [`EstateRepository`] and [`EventOutbox`]
//! using sqlx.
//!
//! Estates are stored as JSONB snapshots with an integer version column.
//! A commit runs in one transaction: a conditional
//! `UPDATE ... WHERE version = $expected` followed by one outbox `INSERT`
//! per event. Zero updated rows means another command won the race.
//! Schema lives in `migrations/0001_estates.sql`.

use crate::domain::entities::Estate;
use crate::domain::events::EstateEvent;
use crate::domain::value_objects::EstateId;
use crate::infrastructure::persistence::traits::{
    EstateRepository, EventOutbox, OutboxEntry, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// PostgreSQL implementation of [`EstateRepository`] and [`EventOutbox`].
///
/// # Examples
///
/// ```ignore
/// use sqlx::PgPool;
/// use estate_settlement::infrastructure::persistence::postgres::PostgresEstateRepository;
///
/// let pool = PgPool::connect("postgres://...").await?;
/// let repo = PostgresEstateRepository::new(pool);
/// ```
#[derive(Debug, Clone)]
pub struct PostgresEstateRepository {
    pool: PgPool,
}

impl PostgresEstateRepository {
    /// Creates a new repository over a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `url` with at most `max_connections` pooled connections.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Connection` if the pool cannot be opened.
    pub async fn connect(url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn append_events(
        tx: &mut Transaction<'_, Postgres>,
        events: &[EstateEvent],
    ) -> RepositoryResult<()> {
        for event in events {
            let payload = serde_json::to_value(event)?;
            let version = i64::try_from(event.metadata.version)
                .map_err(|e| RepositoryError::serialization(e.to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO estate_outbox (
                    event_id, estate_id, event_name, version, payload, occurred_at
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(event.metadata.event_id.as_uuid())
            .bind(event.metadata.estate_id.as_uuid())
            .bind(event.kind.name())
            .bind(version)
            .bind(payload)
            .bind(*event.metadata.timestamp.as_datetime())
            .execute(&mut **tx)
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))?;
        }
        Ok(())
    }
}

fn db_version(version: u64) -> RepositoryResult<i64> {
    i64::try_from(version).map_err(|e| RepositoryError::serialization(e.to_string()))
}

#[async_trait]
impl EstateRepository for PostgresEstateRepository {
    async fn insert(&self, estate: &Estate, events: &[EstateEvent]) -> RepositoryResult<()> {
        let snapshot = serde_json::to_value(estate)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO estates (id, version, status, snapshot, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(estate.id().as_uuid())
        .bind(db_version(estate.version())?)
        .bind(estate.status().to_string())
        .bind(snapshot)
        .bind(*estate.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        if inserted.rows_affected() == 0 {
            return Err(RepositoryError::duplicate("Estate", estate.id()));
        }
        Self::append_events(&mut tx, events).await?;
        tx.commit()
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))
    }

    async fn load(&self, id: EstateId) -> RepositoryResult<Option<Estate>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT snapshot FROM estates WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::query(e.to_string()))?;

        row.map(|(snapshot,)| serde_json::from_value(snapshot).map_err(RepositoryError::from))
            .transpose()
    }

    async fn commit(
        &self,
        estate: &Estate,
        expected_version: u64,
        events: &[EstateEvent],
    ) -> RepositoryResult<()> {
        let snapshot = serde_json::to_value(estate)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        let updated = sqlx::query(
            r#"
            UPDATE estates
               SET version = $1, status = $2, snapshot = $3, updated_at = $4
             WHERE id = $5 AND version = $6
            "#,
        )
        .bind(db_version(estate.version())?)
        .bind(estate.status().to_string())
        .bind(snapshot)
        .bind(*estate.updated_at().as_datetime())
        .bind(estate.id().as_uuid())
        .bind(db_version(expected_version)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        if updated.rows_affected() == 0 {
            let current: Option<(i64,)> = sqlx::query_as("SELECT version FROM estates WHERE id = $1")
                .bind(estate.id().as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| RepositoryError::query(e.to_string()))?;
            return Err(match current {
                None => RepositoryError::not_found("Estate", estate.id()),
                Some((actual,)) => RepositoryError::version_conflict(
                    "Estate",
                    estate.id(),
                    expected_version,
                    u64::try_from(actual).unwrap_or_default(),
                ),
            });
        }

        Self::append_events(&mut tx, events).await?;
        tx.commit()
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))
    }

    async fn list_ids(&self) -> RepositoryResult<Vec<EstateId>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM estates ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|(id,)| EstateId::from_uuid(id))
            .collect())
    }
}

/// Row type for outbox queries.
#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    position: i64,
    payload: serde_json::Value,
}

impl OutboxRow {
    fn try_into_entry(self) -> RepositoryResult<OutboxEntry> {
        Ok(OutboxEntry {
            position: u64::try_from(self.position)
                .map_err(|e| RepositoryError::serialization(e.to_string()))?,
            event: serde_json::from_value(self.payload)?,
        })
    }
}

#[async_trait]
impl EventOutbox for PostgresEstateRepository {
    async fn pending(&self, limit: usize) -> RepositoryResult<Vec<OutboxEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r#"
            SELECT position, payload
              FROM estate_outbox
             WHERE delivered_at IS NULL
             ORDER BY position ASC
             LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter().map(OutboxRow::try_into_entry).collect()
    }

    async fn mark_delivered(&self, position: u64) -> RepositoryResult<()> {
        let db_position = i64::try_from(position)
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let result = sqlx::query(
            r#"
            UPDATE estate_outbox
               SET delivered_at = COALESCE(delivered_at, NOW())
             WHERE position = $1
            "#,
        )
        .bind(db_position)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("OutboxEntry", position));
        }
        Ok(())
    }
}
