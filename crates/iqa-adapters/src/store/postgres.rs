//! PostgreSQL-backed work-item store.
//!
//! `sqlx` is async; the store owns a current-thread `tokio` runtime and
//! blocks on it so the port stays synchronous.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use iqa_core::{QualityScores, StoreError, StoreStats, WorkItem, WorkItemId, WorkItemStore};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{validate_table, ELIGIBLE};

type StatsRow = (
    i64,
    i64,
    i64,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

/// Work-item store over a single pooled PostgreSQL connection.
pub struct PgStore {
    // Declared before `runtime` so the pool is dropped first.
    pool: PgPool,
    runtime: Runtime,
    table: String,
    /// SQL type of the `id` column, used to cast bound ids so lookups stay
    /// on the primary-key index.
    id_type: String,
}

impl PgStore {
    /// Connects to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is invalid, the server cannot be
    /// reached within ten seconds, or the table has no `id` column.
    pub fn connect(url: &str, table: &str) -> Result<Self> {
        let table = validate_table(table)?.to_string();
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start database runtime")?;
        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect(url),
            )
            .context("Failed to connect to PostgreSQL")?;

        let id_type: Option<String> = runtime
            .block_on(
                sqlx::query_scalar(
                    "SELECT format_type(atttypid, atttypmod) FROM pg_attribute \
                     WHERE attrelid = to_regclass($1) AND attname = 'id' AND NOT attisdropped",
                )
                .bind(&table)
                .fetch_optional(&pool),
            )
            .with_context(|| format!("Failed to inspect table {table}"))?;
        let id_type =
            id_type.ok_or_else(|| anyhow!("table {table} not found or has no id column"))?;
        debug!("Table {table} keyed by {id_type}");

        Ok(Self {
            pool,
            runtime,
            table,
            id_type,
        })
    }
}

impl WorkItemStore for PgStore {
    fn select_eligible(&self, limit: Option<usize>) -> Result<Vec<WorkItem>> {
        // LIMIT NULL is unbounded.
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT id::text, cloudinary_url, enhanced_url FROM {} WHERE {ELIGIBLE} \
             ORDER BY id LIMIT $1",
            self.table
        );

        let rows: Vec<(String, String, String)> = self
            .runtime
            .block_on(sqlx::query_as(&sql).bind(limit).fetch_all(&self.pool))
            .with_context(|| format!("Failed to query table {}", self.table))?;

        debug!("Selected {} eligible rows from {}", rows.len(), self.table);
        Ok(rows
            .into_iter()
            .map(|(id, source, enhanced)| WorkItem::pending(id, source, enhanced))
            .collect())
    }

    fn record_scores(&self, id: &WorkItemId, scores: QualityScores) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET ssim_score = $1, brisque_score = $2 WHERE id = CAST($3 AS {})",
            self.table, self.id_type
        );

        self.runtime.block_on(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .context("Failed to begin transaction")?;
            let result = sqlx::query(&sql)
                .bind(scores.similarity)
                .bind(scores.distortion)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to update item {id}"))?;
            if result.rows_affected() == 0 {
                tx.rollback().await.context("Failed to roll back")?;
                return Err(StoreError::ItemNotFound(id.clone()).into());
            }
            tx.commit()
                .await
                .with_context(|| format!("Failed to commit scores for item {id}"))
        })
    }

    fn stats(&self) -> Result<StoreStats> {
        let sql = format!(
            "SELECT COUNT(*), COUNT(ssim_score), COUNT(*) FILTER (WHERE {ELIGIBLE}),
                    AVG(ssim_score)::float8, MIN(ssim_score)::float8, MAX(ssim_score)::float8,
                    AVG(brisque_score)::float8, MIN(brisque_score)::float8,
                    MAX(brisque_score)::float8
             FROM {}",
            self.table
        );

        let row: StatsRow = self
            .runtime
            .block_on(sqlx::query_as(&sql).fetch_one(&self.pool))
            .with_context(|| format!("Failed to aggregate table {}", self.table))?;
        let count = |n: i64| u64::try_from(n).unwrap_or(0);

        Ok(StoreStats {
            total: count(row.0),
            scored: count(row.1),
            pending: count(row.2),
            mean_similarity: row.3,
            min_similarity: row.4,
            max_similarity: row.5,
            mean_distortion: row.6,
            min_distortion: row.7,
            max_distortion: row.8,
        })
    }
}

impl Drop for PgStore {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}
