//! SQLite-backed work-item store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use iqa_core::{QualityScores, StoreError, StoreStats, WorkItem, WorkItemId, WorkItemStore};
use rusqlite::{params, Connection};
use tracing::debug;

use super::{validate_table, ELIGIBLE};

/// Work-item store over a single SQLite connection.
///
/// The connection is guarded by a mutex; the pipeline is sequential so
/// there is never contention in practice.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteStore {
    /// Opens the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is invalid or the file cannot be
    /// opened.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set SQLite busy timeout")?;
        Self::from_connection(conn, table)
    }

    /// Opens a private in-memory database with the table already created.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is invalid.
    pub fn open_in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        let store = Self::from_connection(conn, table)?;
        store.ensure_schema()?;
        Ok(store)
    }

    /// Wraps an existing connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is invalid.
    pub fn from_connection(conn: Connection, table: &str) -> Result<Self> {
        let table = validate_table(table)?.to_string();
        Ok(Self {
            conn: Mutex::new(conn),
            table,
        })
    }

    /// Creates the table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails.
    pub fn ensure_schema(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                cloudinary_url TEXT,
                enhanced_url TEXT,
                ssim_score REAL,
                brisque_score REAL
            )",
            self.table
        );
        self.lock()?
            .execute_batch(&sql)
            .with_context(|| format!("Failed to create table {}", self.table))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection lock poisoned"))
    }
}

impl WorkItemStore for SqliteStore {
    fn select_eligible(&self, limit: Option<usize>) -> Result<Vec<WorkItem>> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT CAST(id AS TEXT), cloudinary_url, enhanced_url FROM {} WHERE {ELIGIBLE} \
             ORDER BY id LIMIT ?1",
            self.table
        );

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .with_context(|| format!("Failed to query table {}", self.table))?;
        let items = stmt
            .query_map(params![limit], |row| {
                Ok(WorkItem {
                    id: WorkItemId::new(row.get::<_, String>(0)?),
                    source_url: row.get(1)?,
                    enhanced_url: row.get(2)?,
                    similarity_score: None,
                    distortion_score: None,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read eligible rows")?;

        debug!("Selected {} eligible rows from {}", items.len(), self.table);
        Ok(items)
    }

    fn record_scores(&self, id: &WorkItemId, scores: QualityScores) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET ssim_score = ?1, brisque_score = ?2 WHERE id = ?3",
            self.table
        );

        let mut conn = self.lock()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        let changed = tx
            .execute(&sql, params![scores.similarity, scores.distortion, id.as_str()])
            .with_context(|| format!("Failed to update item {id}"))?;
        if changed == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::ItemNotFound(id.clone()).into());
        }
        tx.commit()
            .with_context(|| format!("Failed to commit scores for item {id}"))?;
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        let sql = format!(
            "SELECT COUNT(*), COUNT(ssim_score),
                    COALESCE(SUM(CASE WHEN {ELIGIBLE} THEN 1 ELSE 0 END), 0),
                    AVG(ssim_score), MIN(ssim_score), MAX(ssim_score),
                    AVG(brisque_score), MIN(brisque_score), MAX(brisque_score)
             FROM {}",
            self.table
        );
        let count = |n: i64| u64::try_from(n).unwrap_or(0);

        self.lock()?
            .query_row(&sql, [], |row| {
                Ok(StoreStats {
                    total: count(row.get(0)?),
                    scored: count(row.get(1)?),
                    pending: count(row.get(2)?),
                    mean_similarity: row.get(3)?,
                    min_similarity: row.get(4)?,
                    max_similarity: row.get(5)?,
                    mean_distortion: row.get(6)?,
                    min_distortion: row.get(7)?,
                    max_distortion: row.get(8)?,
                })
            })
            .with_context(|| format!("Failed to aggregate table {}", self.table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store_starts_empty() {
        let store = SqliteStore::open_in_memory("photos").unwrap_or_else(|e| panic!("{e}"));

        let items = store.select_eligible(None).unwrap_or_else(|e| panic!("{e}"));
        assert!(items.is_empty());

        let stats = store.stats().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean_similarity, None);
    }

    #[test]
    fn test_rejects_invalid_table() {
        assert!(SqliteStore::open_in_memory("photos--").is_err());
    }
}
