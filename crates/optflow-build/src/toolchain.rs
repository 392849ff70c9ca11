//! CUDA toolchain discovery.
//!
//! Resolution order:
//! 1. `CUDAHOME` names the root directly; `bin/nvcc` must exist under it and
//!    the include/library dirs are the root's `include` and `lib64`.
//! 2. Otherwise `nvcc` is resolved on the command search path, the root is
//!    the binary's grandparent, and the include/library dirs come from
//!    probing for `cuda.h` and `libcudart.so`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BuildEnv;
use crate::error::{BuildError, BuildResult};
use crate::probe::PathProbe;

/// GPU compiler binary name.
pub const NVCC: &str = "nvcc";
/// Primary toolchain header.
pub const CUDA_HEADER: &str = "cuda.h";
/// Toolchain runtime shared library.
pub const CUDART_LIBRARY: &str = "libcudart.so";
/// Link flag for the runtime library.
pub const CUDART_LINK_FLAG: &str = "-lcudart";

/// Resolved CUDA installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainInfo {
    pub root: PathBuf,
    pub compiler: PathBuf,
    pub include_dir: PathBuf,
    pub library_dir: PathBuf,
}

/// Locates the CUDA toolchain for a build session.
#[derive(Debug)]
pub struct ToolchainLocator<'a> {
    env: &'a BuildEnv,
}

impl<'a> ToolchainLocator<'a> {
    pub fn new(env: &'a BuildEnv) -> Self {
        Self { env }
    }

    /// Resolve the toolchain.
    ///
    /// # Errors
    /// - `InvalidToolchainPath` if `CUDAHOME` is set but has no `bin/nvcc`
    /// - `ToolchainNotFound` if `nvcc` is not on the search path
    /// - `ToolNotFound` if the header or runtime library cannot be probed
    pub fn locate(&self) -> BuildResult<ToolchainInfo> {
        let info = match &self.env.cuda_home {
            Some(root) => Self::from_root(root)?,
            None => self.discover()?,
        };
        info!(
            root = %info.root.display(),
            nvcc = %info.compiler.display(),
            include = %info.include_dir.display(),
            lib = %info.library_dir.display(),
            "located CUDA toolchain"
        );
        Ok(info)
    }

    fn from_root(root: &Path) -> BuildResult<ToolchainInfo> {
        let compiler = root.join("bin").join(NVCC);
        if !compiler.exists() {
            return Err(BuildError::InvalidToolchainPath {
                root: root.to_path_buf(),
                compiler: NVCC.to_string(),
            });
        }
        debug!(root = %root.display(), "using CUDAHOME override");
        Ok(ToolchainInfo {
            root: root.to_path_buf(),
            compiler,
            include_dir: root.join("include"),
            library_dir: root.join("lib64"),
        })
    }

    fn discover(&self) -> BuildResult<ToolchainInfo> {
        let compiler = self
            .env
            .which(NVCC)
            .ok_or_else(|| self.not_found())?;
        debug!(nvcc = %compiler.display(), "resolved nvcc on search path");

        let root = compiler
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .ok_or_else(|| self.not_found())?;

        let probe = PathProbe::new(&self.env.search_root);
        let include_dir = probe.locate(CUDA_HEADER)?;
        let library_dir = probe.locate(CUDART_LIBRARY)?;

        Ok(ToolchainInfo {
            root,
            compiler,
            include_dir,
            library_dir,
        })
    }

    fn not_found(&self) -> BuildError {
        BuildError::ToolchainNotFound {
            compiler: NVCC.to_string(),
            search_path: self.env.search_path_display(),
        }
    }
}
