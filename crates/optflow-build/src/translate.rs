//! `.pyx` to C++ translation.
//!
//! Translation is an external tool; this module only invokes it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{BuildError, BuildResult};

/// Default translator binary.
pub const CYTHON: &str = "cython";

/// Turns an interface file into a compilable translation unit.
pub trait Translator {
    fn translate(&self, interface: &Path, output: &Path) -> BuildResult<()>;
}

/// Runs `cython --cplus -o <output> <interface>`.
#[derive(Debug, Clone)]
pub struct CythonTranslator {
    program: PathBuf,
}

impl CythonTranslator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CythonTranslator {
    fn default() -> Self {
        Self::new(CYTHON)
    }
}

impl Translator for CythonTranslator {
    fn translate(&self, interface: &Path, output: &Path) -> BuildResult<()> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg("--cplus").arg("-o").arg(output).arg(interface);
        debug!(command = ?cmd, "spawning translator");

        let status = cmd.status().map_err(|source| BuildError::Io {
            path: self.program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(BuildError::CommandFailed {
                program: self.program.display().to_string(),
                target: interface.to_path_buf(),
                status: status.to_string(),
            });
        }
        info!(interface = %interface.display(), output = %output.display(), "translated");
        Ok(())
    }
}
