//! HTTP adapter for fetching remote images.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use iqa_core::Fetcher;
use reqwest::blocking::Client;
use tracing::{debug, warn};

/// Read buffer size while streaming a response body.
const CHUNK_SIZE: usize = 8 * 1024;

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Upper bound on the whole request, body included.
    pub timeout: Duration,
    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,
    /// Largest body accepted; `None` disables the cap.
    pub max_bytes: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            max_bytes: Some(64 * 1024 * 1024),
        }
    }
}

/// Blocking HTTP(S) fetcher that streams bodies straight to disk.
pub struct HttpFetcher {
    client: Client,
    max_bytes: Option<u64>,
}

impl HttpFetcher {
    /// Builds the underlying client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("iqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<bool> {
        debug!("GET {url}");
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            debug!("{url} answered {status}");
            return Ok(false);
        }

        if let (Some(max), Some(len)) = (self.max_bytes, response.content_length()) {
            if len > max {
                bail!("{url} is {len} bytes, over the {max} byte limit");
            }
        }

        match stream_to_file(&mut response, destination, self.max_bytes) {
            Ok(written) => {
                debug!("Fetched {url} ({written} bytes)");
                Ok(true)
            }
            Err(e) => {
                remove_partial(destination);
                Err(e.context(format!("Failed to download {url}")))
            }
        }
    }
}

/// Copies `body` into a new file at `destination` in fixed-size chunks.
fn stream_to_file(
    body: &mut impl Read,
    destination: &Path,
    max_bytes: Option<u64>,
) -> Result<u64> {
    let file = File::create(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;
    let mut writer = BufWriter::new(file);
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read response body"),
        };
        written += n as u64;
        if let Some(max) = max_bytes {
            if written > max {
                bail!("response body exceeds {max} bytes");
            }
        }
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", destination.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    Ok(written)
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed partial download {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial download {}: {e}", path.display()),
    }
}
