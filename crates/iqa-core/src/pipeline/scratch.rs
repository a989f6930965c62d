//! Per-item scratch files for downloaded images.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::WorkItemId;

/// Directory holding transient downloads, namespaced by item id.
#[derive(Debug, Clone)]
pub struct ScratchArea {
    root: PathBuf,
}

impl ScratchArea {
    /// Creates a scratch area rooted at `root`. Nothing is created on disk
    /// until [`ScratchArea::prepare`] or [`ScratchArea::item_files`] runs.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the system temporary directory.
    #[must_use]
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join("iqa-scratch")
    }

    /// Scratch root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    /// Reserves the two download paths for an item.
    ///
    /// Leftovers from an interrupted earlier run are removed first. The
    /// returned guard deletes both files when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn item_files(&self, id: &WorkItemId) -> io::Result<ScratchFiles> {
        self.prepare()?;
        let stem = id.file_stem();
        let files = ScratchFiles {
            original: self.root.join(format!("orig_{stem}")),
            enhanced: self.root.join(format!("enh_{stem}")),
        };
        files.remove_all();
        Ok(files)
    }
}

impl Default for ScratchArea {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

/// Download paths owned by one item's processing.
#[derive(Debug)]
pub struct ScratchFiles {
    original: PathBuf,
    enhanced: PathBuf,
}

impl ScratchFiles {
    /// Destination for the original image.
    #[must_use]
    pub fn original(&self) -> &Path {
        &self.original
    }

    /// Destination for the enhanced image.
    #[must_use]
    pub fn enhanced(&self) -> &Path {
        &self.enhanced
    }

    fn remove_all(&self) {
        for path in [&self.original, &self.enhanced] {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed scratch file {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {}: {e}", path.display()),
            }
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        self.remove_all();
    }
}
