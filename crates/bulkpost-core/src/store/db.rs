//! SQLite-backed result table (sqlx).
//!
//! One row per item id; re-running the same input overwrites earlier rows.

use anyhow::Result;
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::future::Future;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::ResultStore;
use crate::model::{ItemId, ProcessResult};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResult {
    pub item_id: ItemId,
    pub success: bool,
    /// `success`, `terminal` or `exhausted`.
    pub resolution: String,
    pub attempts: i64,
    /// Response body as JSON text (successes only).
    pub body: Option<String>,
    pub error: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredCounts {
    pub succeeded: i64,
    pub failed: i64,
}

/// Handle to the results database.
///
/// Stored under the XDG state directory: `~/.local/state/bulkpost/results.db`.
#[derive(Clone)]
pub struct ResultDb {
    pool: Pool<Sqlite>,
}

impl ResultDb {
    /// Open (or create) the default results database and run migrations.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("bulkpost")?;
        let db_path = xdg_dirs.get_state_home().join("results.db");
        Self::open_at(&db_path).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await?;
        let db = ResultDb { pool };
        db.migrate().await?;
        tracing::debug!(path = %path.display(), "results database opened");
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                item_id TEXT PRIMARY KEY,
                success INTEGER NOT NULL,
                resolution TEXT NOT NULL,
                attempts INTEGER NOT NULL,
                body TEXT,
                error TEXT,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert or overwrite a chunk of results in one transaction.
    pub async fn upsert_results<R: Serialize>(&self, results: &[ProcessResult<R>]) -> Result<()> {
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;
        for r in results {
            let body = r.body().map(serde_json::to_string).transpose()?;
            let error = r.error().map(|e| e.to_string());
            sqlx::query(
                r#"
                INSERT INTO results (item_id, success, resolution, attempts, body, error, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(item_id) DO UPDATE SET
                    success = excluded.success,
                    resolution = excluded.resolution,
                    attempts = excluded.attempts,
                    body = excluded.body,
                    error = excluded.error,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&r.item_id)
            .bind(r.success())
            .bind(r.resolution.label())
            .bind(i64::from(r.attempts))
            .bind(body)
            .bind(error)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// All rows ordered by item id; `failed_only` keeps unsuccessful ones.
    pub async fn list_results(&self, failed_only: bool) -> Result<Vec<StoredResult>> {
        let sql = if failed_only {
            "SELECT item_id, success, resolution, attempts, body, error, updated_at FROM results WHERE success = 0 ORDER BY item_id"
        } else {
            "SELECT item_id, success, resolution, attempts, body, error, updated_at FROM results ORDER BY item_id"
        };
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| StoredResult {
                item_id: row.get("item_id"),
                success: row.get("success"),
                resolution: row.get("resolution"),
                attempts: row.get("attempts"),
                body: row.get("body"),
                error: row.get("error"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    pub async fn counts(&self) -> Result<StoredCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END), 0) AS succeeded,
                COALESCE(SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END), 0) AS failed
            FROM results
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(StoredCounts {
            succeeded: row.get("succeeded"),
            failed: row.get("failed"),
        })
    }
}

impl<R: Serialize + Sync> ResultStore<R> for ResultDb {
    fn upsert(&self, results: &[ProcessResult<R>]) -> impl Future<Output = Result<()>> + Send {
        self.upsert_results(results)
    }
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<ResultDb> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = ResultDb { pool };
    db.migrate().await?;
    Ok(db)
}
