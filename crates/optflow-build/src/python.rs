//! Python and numpy header discovery.
//!
//! The generated translation unit includes `Python.h` and numpy's array API,
//! so both header dirs join the descriptor's include set. The interpreter
//! also reports the platform-specific extension suffix for the linked module.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BuildEnv;
use crate::error::{BuildError, BuildResult};

/// Interpreter resolved when no override is set.
pub const DEFAULT_PYTHON: &str = "python3";

const QUERY_SCRIPT: &str = "\
import sysconfig
import numpy
print(sysconfig.get_paths()['include'])
print(numpy.get_include())
print(sysconfig.get_config_var('EXT_SUFFIX') or '.so')
";

/// Header locations and module suffix reported by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonInfo {
    pub interpreter: PathBuf,
    pub include_dir: PathBuf,
    pub numpy_include_dir: PathBuf,
    pub ext_suffix: String,
}

impl PythonInfo {
    /// Parse the three-line answer of the query script.
    pub fn parse(interpreter: &Path, output: &str) -> BuildResult<Self> {
        let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
        let mut next = |what: &str| {
            lines
                .next()
                .map(str::to_string)
                .ok_or_else(|| BuildError::PythonQueryFailed {
                    interpreter: interpreter.to_path_buf(),
                    message: format!("missing {what} in interpreter output"),
                })
        };
        let include_dir = PathBuf::from(next("include dir")?);
        let numpy_include_dir = PathBuf::from(next("numpy include dir")?);
        let ext_suffix = next("extension suffix")?;
        Ok(Self {
            interpreter: interpreter.to_path_buf(),
            include_dir,
            numpy_include_dir,
            ext_suffix,
        })
    }
}

/// Locates the Python interpreter and its headers.
#[derive(Debug)]
pub struct PythonHeadersLocator<'a> {
    env: &'a BuildEnv,
}

impl<'a> PythonHeadersLocator<'a> {
    pub fn new(env: &'a BuildEnv) -> Self {
        Self { env }
    }

    pub fn locate(&self) -> BuildResult<PythonInfo> {
        let interpreter = match &self.env.python {
            Some(python) => python.clone(),
            None => self
                .env
                .which(DEFAULT_PYTHON)
                .ok_or_else(|| BuildError::PythonNotFound {
                    interpreter: DEFAULT_PYTHON.to_string(),
                    search_path: self.env.search_path_display(),
                })?,
        };
        debug!(python = %interpreter.display(), "querying interpreter");

        let output = Command::new(&interpreter)
            .arg("-c")
            .arg(QUERY_SCRIPT)
            .output()
            .map_err(|source| BuildError::Io {
                path: interpreter.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BuildError::PythonQueryFailed {
                interpreter,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info = PythonInfo::parse(&interpreter, &String::from_utf8_lossy(&output.stdout))?;
        info!(
            include = %info.include_dir.display(),
            numpy = %info.numpy_include_dir.display(),
            suffix = %info.ext_suffix,
            "located Python headers"
        );
        Ok(info)
    }
}
