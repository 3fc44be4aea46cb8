use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, instrument};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS bookmarks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL CHECK (length(url) > 0),
        title VARCHAR(200) NOT NULL CHECK (length(title) BETWEEN 1 AND 200),
        description TEXT,
        tags VARCHAR(255),
        title_folded TEXT NOT NULL DEFAULT '',
        description_folded TEXT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_bookmarks_user_created
        ON bookmarks (user_id, created_at DESC)",
];

/// Opens (creating if needed) the database at `url` and ensures the schema exists.
#[instrument(skip_all, fields(url = %url, max_connections = max_connections))]
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url: {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database at {url}"))?;

    migrate(&pool).await?;
    info!("Database connected and schema ready");
    Ok(pool)
}

/// A private in-memory database. The pool is pinned to one long-lived
/// connection because every SQLite memory connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        debug!(statement = %statement.lines().next().unwrap_or_default(), "Applying schema");
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("failed to apply schema")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        migrate(&pool).await.unwrap();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'bookmarks')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_bookmark_requires_existing_user() {
        let pool = connect_in_memory().await.unwrap();
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO bookmarks (url, title, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("https://x.com")
        .bind("X")
        .bind(42_i64)
        .bind(now)
        .bind(now)
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("bookmarks.db").display());
        let pool = connect(&url, 2).await.unwrap();
        pool.close().await;
        assert!(dir.path().join("bookmarks.db").exists());
    }
}
