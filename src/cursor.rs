//! Last-announced notification id, persisted as a one-line text file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trimmed cursor, or empty when the file is missing or unreadable.
    pub fn read(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.trim().to_string(),
            Err(e) => {
                debug!("No cursor at {} ({e}), starting from the latest page", self.path.display());
                String::new()
            }
        }
    }

    /// Overwrite the cursor. A failed write is logged and ignored.
    pub fn write(&self, id: &str) {
        match fs::write(&self.path, id) {
            Ok(()) => debug!("Cursor advanced to {id}"),
            Err(e) => warn!("Failed to write last ID to {}: {e}", self.path.display()),
        }
    }
}
