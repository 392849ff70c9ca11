//! Shared-object link step.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{BuildError, BuildResult};

/// Links objects into a shared module with the host compiler.
#[derive(Debug, Clone)]
pub struct Linker {
    program: PathBuf,
}

impl Linker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command line: `<cc> -shared <objects> -o <output> <link args>`.
    pub fn command(&self, objects: &[PathBuf], output: &Path, link_args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-shared")
            .args(objects)
            .arg("-o")
            .arg(output)
            .args(link_args);
        cmd
    }

    pub fn link(&self, objects: &[PathBuf], output: &Path, link_args: &[String]) -> BuildResult<()> {
        let mut cmd = self.command(objects, output, link_args);
        debug!(command = ?cmd, "spawning linker");

        let status = cmd.status().map_err(|source| BuildError::Io {
            path: self.program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(BuildError::CommandFailed {
                program: self.program.display().to_string(),
                target: output.to_path_buf(),
                status: status.to_string(),
            });
        }
        info!(output = %output.display(), objects = objects.len(), "linked");
        Ok(())
    }
}
