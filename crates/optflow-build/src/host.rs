//! Host C/C++ compiler selection.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::BuildEnv;
use crate::error::{BuildError, BuildResult};

/// Compiler resolved when no override is set.
pub const DEFAULT_HOST_COMPILER: &str = "gcc";

/// Chooses the host compiler binary.
///
/// A `CC` override wins unconditionally and is not checked for existence; a
/// bad value shows up later as a compile failure. Users set it when the
/// system gcc is newer than the CUDA release supports.
#[derive(Debug)]
pub struct HostCompilerSelector<'a> {
    env: &'a BuildEnv,
}

impl<'a> HostCompilerSelector<'a> {
    pub fn new(env: &'a BuildEnv) -> Self {
        Self { env }
    }

    pub fn select(&self) -> BuildResult<PathBuf> {
        if let Some(cc) = &self.env.host_compiler {
            if !cc.exists() {
                warn!(cc = %cc.display(), "CC override does not exist; using it anyway");
            }
            info!(cc = %cc.display(), "using CC override");
            return Ok(cc.clone());
        }

        let cc = self
            .env
            .which(DEFAULT_HOST_COMPILER)
            .ok_or_else(|| BuildError::HostCompilerNotFound {
                compiler: DEFAULT_HOST_COMPILER.to_string(),
                search_path: self.env.search_path_display(),
            })?;
        info!(cc = %cc.display(), "resolved host compiler");
        Ok(cc)
    }
}
