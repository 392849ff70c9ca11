//! Filesystem search for headers and libraries.
//!
//! A pattern is a file name, optionally preceded by directory components
//! (`opencv2/core/core.hpp`). The probe walks the root recursively and returns
//! the directory that the pattern hangs off, i.e. the match path with the
//! pattern's own components removed. For `cuda.h` found at
//! `/usr/local/cuda/include/cuda.h` that is `/usr/local/cuda/include`.
//!
//! Results are not cached; every call re-walks the tree.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BuildError, BuildResult};

/// Recursive file locator anchored at a fixed root.
#[derive(Debug, Clone)]
pub struct PathProbe {
    root: PathBuf,
}

impl PathProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory prefix of the first file under the root matching `pattern`.
    ///
    /// Entries are visited in file-name order so the first match is stable.
    /// Unreadable directories are skipped silently.
    ///
    /// # Errors
    /// `BuildError::ToolNotFound` when nothing under the root matches.
    pub fn locate(&self, pattern: &str) -> BuildResult<PathBuf> {
        let pattern_path = Path::new(pattern.trim_start_matches('/'));
        let file_name = pattern_path.file_name().ok_or_else(|| self.not_found(pattern))?;
        let depth = pattern_path.components().count();

        let hit = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| !entry.file_type().is_dir())
            .filter(|entry| entry.file_name() == file_name)
            .find(|entry| entry.path().ends_with(pattern_path));

        match hit {
            Some(entry) => {
                let dir = entry
                    .path()
                    .ancestors()
                    .nth(depth)
                    .map(Path::to_path_buf)
                    .ok_or_else(|| self.not_found(pattern))?;
                debug!(pattern, path = %entry.path().display(), dir = %dir.display(), "probe hit");
                Ok(dir)
            }
            None => Err(self.not_found(pattern)),
        }
    }

    fn not_found(&self, pattern: &str) -> BuildError {
        BuildError::ToolNotFound {
            pattern: pattern.to_string(),
            root: self.root.clone(),
        }
    }
}
