//! Work-item store adapters.
//!
//! Both backends read and write the same fixed table shape:
//!
//! | field              | column           |
//! |--------------------|------------------|
//! | `id`               | `id`             |
//! | `source_url`       | `cloudinary_url` |
//! | `enhanced_url`     | `enhanced_url`   |
//! | `similarity_score` | `ssim_score`     |
//! | `distortion_score` | `brisque_score`  |

mod postgres;
mod sqlite;

use std::path::PathBuf;

use anyhow::Result;
use iqa_core::{StoreError, WorkItemStore};
use tracing::debug;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Table used when none is configured.
pub const DEFAULT_TABLE: &str = "photos";

/// Row filter selecting eligible items; shared by both backends.
const ELIGIBLE: &str = "cloudinary_url IS NOT NULL AND cloudinary_url <> '' \
     AND enhanced_url IS NOT NULL AND enhanced_url <> '' \
     AND ssim_score IS NULL";

/// Backend and address parsed from a store URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// `postgres://` or `postgresql://` connection string.
    Postgres(String),
    /// SQLite database file.
    SqliteFile(PathBuf),
    /// Private in-memory SQLite database.
    SqliteMemory,
}

impl StoreLocation {
    /// Parses a store URL.
    ///
    /// Accepts `postgres://…`, `postgresql://…`, `sqlite://<path>`,
    /// `sqlite:<path>`, `sqlite::memory:` and bare file paths.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedUrl`] for empty input or any other
    /// `scheme://` prefix.
    pub fn parse(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::UnsupportedUrl(url.to_string()));
        }
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(Self::Postgres(url.to_string()));
        }
        if url == "sqlite::memory:" || url == ":memory:" {
            return Ok(Self::SqliteMemory);
        }
        if let Some(path) = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            if path.is_empty() {
                return Err(StoreError::UnsupportedUrl(url.to_string()));
            }
            return Ok(Self::SqliteFile(PathBuf::from(path)));
        }
        if url.contains("://") {
            return Err(StoreError::UnsupportedUrl(url.to_string()));
        }
        Ok(Self::SqliteFile(PathBuf::from(url)))
    }
}

/// Connects to the store named by `url`, reading and writing `table`.
///
/// # Errors
///
/// Returns an error if the URL or table name is invalid or the connection
/// cannot be established.
pub fn open_store(url: &str, table: &str) -> Result<Box<dyn WorkItemStore>> {
    let table = validate_table(table)?;
    match StoreLocation::parse(url)? {
        StoreLocation::Postgres(conn) => {
            debug!("Opening PostgreSQL store (table {table})");
            Ok(Box::new(PgStore::connect(&conn, table)?))
        }
        StoreLocation::SqliteFile(path) => {
            debug!("Opening SQLite store {} (table {table})", path.display());
            Ok(Box::new(SqliteStore::open(&path, table)?))
        }
        StoreLocation::SqliteMemory => Ok(Box::new(SqliteStore::open_in_memory(table)?)),
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*` so the name can be spliced into SQL.
pub(crate) fn validate_table(table: &str) -> Result<&str, StoreError> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(table)
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}
