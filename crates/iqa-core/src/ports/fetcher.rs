//! Remote fetcher port.

use std::path::Path;

/// Port for retrieving a remote resource into a local file.
pub trait Fetcher: Send + Sync {
    /// Streams `url` into `destination`.
    ///
    /// Returns `Ok(false)` when the remote answers with a non-success status.
    /// Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures (unreachable host, timeout,
    /// oversized body) or when the destination cannot be written. A partially
    /// written destination is removed before returning.
    fn fetch(&self, url: &str, destination: &Path) -> anyhow::Result<bool>;
}
