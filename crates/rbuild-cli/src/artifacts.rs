//! Build artifact detection
//!
//! The build tool does not say what it produced, so the package directory is
//! listed before and after the build and the new entry is taken as the result.

use crate::errors::ActionError;
use std::collections::BTreeSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// File names with the artifact suffix present at one point in time
pub type ArtifactSet = BTreeSet<String>;

/// List regular files directly inside `dir` whose names end with `suffix`
pub fn snapshot(dir: &Path, suffix: &str) -> io::Result<ArtifactSet> {
    let mut artifacts = ArtifactSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with(suffix) {
            artifacts.insert(name.into_owned());
        }
    }
    Ok(artifacts)
}

/// Entries of `after` that were not in `before`
pub fn new_artifacts(before: &ArtifactSet, after: &ArtifactSet) -> Vec<String> {
    after.difference(before).cloned().collect()
}

/// The single artifact the build produced
pub fn select_artifact(before: &ArtifactSet, after: &ArtifactSet) -> Result<String, ActionError> {
    let mut found = new_artifacts(before, after);
    if found.len() != 1 {
        return Err(ActionError::AmbiguousOutput { found });
    }
    Ok(found.remove(0))
}

/// Absolute, `.`/`..`-free form of `path`, without resolving symlinks
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
