//! OpenCV discovery.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::BuildEnv;
use crate::error::{BuildError, BuildResult};
use crate::libraries::LibraryEnumerator;
use crate::probe::PathProbe;

/// Core header; its parent-of-`opencv2` directory is the include dir.
pub const OPENCV_CORE_HEADER: &str = "opencv2/core/core.hpp";
/// Core runtime library used to find the library dir.
pub const OPENCV_CORE_LIBRARY: &str = "libopencv_core.so";
/// Logical-name prefix of every OpenCV library.
pub const OPENCV_LIBRARY_PREFIX: &str = "opencv";

/// Resolved OpenCV headers and libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionLibraryInfo {
    pub include_dir: PathBuf,
    pub library_dir: PathBuf,
    pub link_flags: Vec<String>,
}

/// Locates OpenCV for a build session.
#[derive(Debug)]
pub struct VisionLibraryLocator<'a> {
    env: &'a BuildEnv,
}

impl<'a> VisionLibraryLocator<'a> {
    pub fn new(env: &'a BuildEnv) -> Self {
        Self { env }
    }

    /// Resolve headers, library dir and link flags.
    ///
    /// Any failure is reported as `VisionLibraryNotFound` wrapping the cause.
    pub fn locate(&self) -> BuildResult<VisionLibraryInfo> {
        self.resolve().map_err(BuildError::vision)
    }

    fn resolve(&self) -> BuildResult<VisionLibraryInfo> {
        let probe = PathProbe::new(&self.env.search_root);
        let include_dir = probe.locate(OPENCV_CORE_HEADER)?;

        let library_dir = match &self.env.opencv_libs {
            Some(dir) => dir.clone(),
            None => probe.locate(OPENCV_CORE_LIBRARY)?,
        };

        let link_flags =
            LibraryEnumerator::with_prefix(OPENCV_LIBRARY_PREFIX).list_libraries(&library_dir)?;

        info!(
            include = %include_dir.display(),
            lib = %library_dir.display(),
            libraries = link_flags.len(),
            "located OpenCV"
        );
        Ok(VisionLibraryInfo {
            include_dir,
            library_dir,
            link_flags,
        })
    }
}
