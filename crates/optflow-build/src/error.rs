//! Error types for toolchain discovery and compilation.
//!
//! Every locator fails fast: there is no retry and no fallback beyond the
//! override-then-search policy of each locator. Messages name the missing
//! tool or library together with the place that was searched.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::FileType;

/// Configuration and build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No file matching the pattern exists anywhere under the search root.
    #[error("Could not locate {pattern} under {}", root.display())]
    ToolNotFound { pattern: String, root: PathBuf },

    /// The GPU compiler is not on the command search path and no root override is set.
    #[error("The CUDA path could not be located: `{compiler}` is not on the search path ({search_path}). Try to set CUDAHOME")]
    ToolchainNotFound { compiler: String, search_path: String },

    /// The toolchain root override does not contain the GPU compiler.
    #[error("CUDAHOME is not properly set: {} does not exist", root.join("bin").join(compiler).display())]
    InvalidToolchainPath { root: PathBuf, compiler: String },

    /// No host compiler override and the default compiler is not on the search path.
    #[error("The host compiler could not be located: `{compiler}` is not on the search path ({search_path}). Try to set CC")]
    HostCompilerNotFound { compiler: String, search_path: String },

    /// The vision library headers or libraries could not be resolved.
    #[error("OpenCV could not be located: {source}")]
    VisionLibraryNotFound {
        #[source]
        source: Box<BuildError>,
    },

    /// The library directory holds no recognizable shared libraries.
    #[error("Could not locate shared libraries under {}", dir.display())]
    NoLibrariesFound { dir: PathBuf },

    /// The Python interpreter is not on the search path.
    #[error("The Python interpreter could not be located: `{interpreter}` is not on the search path ({search_path}). Try to set PYTHON")]
    PythonNotFound { interpreter: String, search_path: String },

    /// The interpreter ran but did not report header locations.
    #[error("Failed to query {} for header locations: {message}", interpreter.display())]
    PythonQueryFailed { interpreter: PathBuf, message: String },

    /// A descriptor reached the dispatcher without arguments for a file type.
    #[error("Build descriptor has no compiler arguments for {missing} sources")]
    MisconfiguredDescriptor { missing: FileType },

    /// The dispatcher was handed a file no compiler accepts.
    #[error("Unsupported source {}: expected one of .c, .cc, .cpp, .cxx, .cu", path.display())]
    UnsupportedSource { path: PathBuf },

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A spawned tool (compiler, translator, linker) exited unsuccessfully.
    #[error("`{program}` failed with {status} while processing {}", target.display())]
    CommandFailed {
        program: String,
        target: PathBuf,
        status: String,
    },

    /// IO failure while spawning a tool or preparing the build tree.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Wrap a lower-level failure as a vision library lookup failure.
    pub fn vision(source: BuildError) -> Self {
        BuildError::VisionLibraryNotFound {
            source: Box::new(source),
        }
    }

    /// True for failures raised before any compilation starts.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            BuildError::CommandFailed { .. } | BuildError::Io { .. }
        )
    }
}

/// Result type for configuration and build operations.
pub type BuildResult<T> = Result<T, BuildError>;
