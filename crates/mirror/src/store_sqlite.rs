//! SQLite-backed correlation store using sqlx.

use {
    async_trait::async_trait,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
};

use crate::{
    Error, Result,
    store::{CorrelationRecord, CorrelationStore, now_secs},
};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct MessageRow {
    original_id: String,
    mirror_id: String,
    author_id: String,
    content: String,
    created_at: i64,
    updated_at: i64,
}

impl From<MessageRow> for CorrelationRecord {
    fn from(r: MessageRow) -> Self {
        Self {
            original_id: r.original_id,
            mirror_id: r.mirror_id,
            author_id: r.author_id,
            content: r.content,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// SQLite-backed persistence for the `messages` table.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with its own connection pool and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store using an existing pool (migrations must already be run).
    ///
    /// Call [`crate::run_migrations`] before using this constructor.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CorrelationStore for SqliteStore {
    async fn put(
        &self,
        original_id: &str,
        mirror_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()> {
        let now = now_secs();
        let result = sqlx::query(
            "INSERT INTO messages (original_id, mirror_id, author_id, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(original_id)
        .bind(mirror_id)
        .bind(author_id)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::duplicate_key(original_id))
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_original_id(&self, original_id: &str) -> Result<Option<CorrelationRecord>> {
        let row = sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE original_id = ?")
            .bind(original_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn get_by_mirror_id(&self, mirror_id: &str) -> Result<Option<CorrelationRecord>> {
        let row = sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE mirror_id = ?")
            .bind(mirror_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn update_content(&self, original_id: &str, content: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE messages SET content = ?, updated_at = ? WHERE original_id = ?")
                .bind(content)
                .bind(now_secs())
                .bind(original_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found(original_id));
        }
        Ok(())
    }

    async fn delete_by_original_id(&self, original_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM messages WHERE original_id = ?")
            .bind(original_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_by_mirror_id(&self, mirror_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE mirror_id = ?")
            .bind(mirror_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: usize) -> Result<Vec<CorrelationRecord>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages ORDER BY created_at ASC, original_id ASC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
