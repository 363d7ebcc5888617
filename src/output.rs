//! Output file naming and persistence

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix of names derived from the clock
pub const TIMESTAMP_PREFIX: &str = "QR-";

/// Name derived from a timestamp, e.g. `QR-20240131-235959`.
pub fn timestamped_name(now: DateTime<Local>) -> String {
    format!("{TIMESTAMP_PREFIX}{}", now.format("%Y%m%d-%H%M%S"))
}

/// Filesystem location of one generated artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    dir: PathBuf,
    name: String,
    extension: String,
}

impl OutputTarget {
    /// Build a target from its directory, extension-less name and extension.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            extension: extension.into(),
        }
    }

    /// Pick a free target for `base`, appending `-1`, `-2`, ... while a
    /// non-empty file already occupies the name.
    pub fn first_free(dir: &Path, base: &str, extension: &str) -> Self {
        let mut target = Self::new(dir, base, extension);
        let mut suffix = 1u32;
        while target.exists_non_empty() {
            debug!(path = %target.path().display(), "Output name taken, trying next suffix");
            target.name = format!("{base}-{suffix}");
            suffix += 1;
        }
        target
    }

    /// Extension-less file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path `dir/name.extension`
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, self.extension))
    }

    /// Whether a file with content already sits at the target path
    pub fn exists_non_empty(&self) -> bool {
        fs::metadata(self.path()).is_ok_and(|m| m.len() > 0)
    }

    /// Write `content` verbatim, refusing to replace a non-empty file unless `force`.
    pub fn write(&self, content: &[u8], force: bool) -> Result<PathBuf> {
        let path = self.path();
        if self.exists_non_empty() && !force {
            return Err(Error::OutputExists(path));
        }
        fs::write(&path, content)?;
        info!(path = %path.display(), bytes = content.len(), "Wrote QR code");
        Ok(path)
    }
}
