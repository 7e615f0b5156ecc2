//! Reading and rewriting DESCRIPTION on disk
//!
//! The rewrite happens before the package build, which reads the new content.
//! [`DescriptionGuard`] keeps the original text so a failed build can put the
//! file back the way it was.

use crate::errors::DescriptionError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the package manifest
pub const DESCRIPTION_FILE: &str = "DESCRIPTION";

pub fn read_description(path: &Path) -> Result<String, DescriptionError> {
    debug!("Reading DESCRIPTION from: {:?}", path);
    Ok(fs::read_to_string(path)?)
}

/// Overwrite `path` with `content`
pub fn write_description(path: &Path, content: &str) -> Result<(), DescriptionError> {
    debug!("Writing DESCRIPTION to: {:?}", path);
    fs::write(path, content)?;
    info!("DESCRIPTION written successfully to: {:?}", path);
    Ok(())
}

/// A written DESCRIPTION that is restored on drop unless committed
#[derive(Debug)]
pub struct DescriptionGuard {
    path: PathBuf,
    original: String,
    rollback: bool,
    committed: bool,
}

impl DescriptionGuard {
    /// Write `merged` to `path`, remembering `original` for rollback
    pub fn write(
        path: &Path,
        original: String,
        merged: &str,
        rollback: bool,
    ) -> Result<Self, DescriptionError> {
        write_description(path, merged)?;
        Ok(Self {
            path: path.to_path_buf(),
            original,
            rollback,
            committed: false,
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Keep the merged content
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for DescriptionGuard {
    fn drop(&mut self) {
        if self.committed || !self.rollback {
            return;
        }
        match fs::write(&self.path, &self.original) {
            Ok(()) => info!("Restored original DESCRIPTION at {:?}", self.path),
            Err(e) => warn!("Failed to restore DESCRIPTION at {:?}: {}", self.path, e),
        }
    }
}
