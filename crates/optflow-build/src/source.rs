//! Source file classification.
//!
//! A source is compiled by the GPU compiler when its extension is `.cu` and by
//! the host compiler otherwise. Classification is purely by extension.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension handled by the GPU compiler.
pub const GPU_EXTENSION: &str = "cu";

/// Extensions the dispatcher accepts. `.cu` is appended to the host list.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", GPU_EXTENSION];

/// Which compiler a source file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Gpu,
    Host,
}

impl FileType {
    /// Both tags, in the order a descriptor must provide them.
    pub const ALL: [FileType; 2] = [FileType::Gpu, FileType::Host];

    /// Classify a path by its extension.
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(GPU_EXTENSION) => FileType::Gpu,
            _ => FileType::Host,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Gpu => "gpu",
            FileType::Host => "host",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file and its file-type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_type: FileType,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_type = FileType::of(&path);
        Self { path, file_type }
    }

    /// Object file name for this source inside `object_dir`.
    ///
    /// The relative path is kept so `a/x.cpp` and `b/x.cpp` do not collide.
    pub fn object_path(&self, object_dir: &Path) -> PathBuf {
        let relative: PathBuf = self
            .path
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        object_dir.join(relative).with_extension("o")
    }

    /// Whether the dispatcher knows how to compile this extension.
    pub fn is_compilable(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
    }
}
