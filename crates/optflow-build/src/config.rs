//! Build environment configuration.
//!
//! `BuildEnv` is populated once at the start of a session and passed by
//! reference into every locator. Nothing downstream reads the process
//! environment directly.
//!
//! # Loading
//!
//! ```rust,ignore
//! use optflow_build::BuildEnv;
//!
//! // Process environment on top of defaults
//! let env = BuildEnv::from_env()?;
//!
//! // TOML file, then environment
//! let env = BuildEnv::from_file("optflow.toml")?.with_env_overrides()?;
//! ```
//!
//! # TOML Structure
//!
//! ```toml
//! cuda_home = "/usr/local/cuda-11.8"
//! host_compiler = "/usr/bin/gcc-11"
//! opencv_libs = "/usr/lib/x86_64-linux-gnu"
//! gpu_arch = 75
//! search_root = "/usr/"
//! host_compiler_flag = "ccbin"
//! ```

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};

/// Toolchain root override.
pub const ENV_CUDA_HOME: &str = "CUDAHOME";
/// Host compiler override.
pub const ENV_HOST_COMPILER: &str = "CC";
/// OpenCV library directory override.
pub const ENV_OPENCV_LIBS: &str = "OPENCV_LIBS";
/// Target architecture numeric tag.
pub const ENV_GPU_ARCH: &str = "GPU_ARCH";
/// Root of filesystem searches.
pub const ENV_SEARCH_ROOT: &str = "OPTFLOW_SEARCH_ROOT";
/// Python interpreter override.
pub const ENV_PYTHON: &str = "PYTHON";
/// Flag style nvcc uses to select the host compiler.
pub const ENV_HOST_COMPILER_FLAG: &str = "NVCC_HOST_COMPILER_FLAG";

/// Default compute capability (Maxwell).
pub const DEFAULT_GPU_ARCH: u32 = 52;
/// Default root for filesystem searches.
pub const DEFAULT_SEARCH_ROOT: &str = "/usr/";

// ============================================================================
// GPU ARCHITECTURE
// ============================================================================

/// Numeric compute capability tag, e.g. `75` for Turing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpuArch(pub u32);

impl GpuArch {
    /// Real architecture form, `sm_<n>`.
    pub fn sm(self) -> String {
        format!("sm_{}", self.0)
    }

    /// Virtual architecture form, `compute_<n>`.
    pub fn compute(self) -> String {
        format!("compute_{}", self.0)
    }
}

impl Default for GpuArch {
    fn default() -> Self {
        GpuArch(DEFAULT_GPU_ARCH)
    }
}

impl fmt::Display for GpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GpuArch {
    type Err = BuildError;

    /// Accepts `75` as well as `sm_75` / `compute_75`.
    fn from_str(s: &str) -> BuildResult<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("sm_")
            .or_else(|| trimmed.strip_prefix("compute_"))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map(GpuArch)
            .map_err(|_| BuildError::InvalidConfig {
                message: format!("{ENV_GPU_ARCH} must be a numeric architecture tag, got '{s}'"),
            })
    }
}

// ============================================================================
// HOST COMPILER FLAG
// ============================================================================

/// How the GPU compiler is told which host compiler to use.
///
/// Older nvcc releases spell it `--compiler-bindir`; newer ones also accept
/// `-ccbin`. `Disabled` leaves nvcc on its own default host compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostCompilerFlag {
    #[default]
    CompilerBindir,
    Ccbin,
    Disabled,
}

impl HostCompilerFlag {
    /// The flag spelling, or `None` when disabled.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            HostCompilerFlag::CompilerBindir => Some("--compiler-bindir"),
            HostCompilerFlag::Ccbin => Some("-ccbin"),
            HostCompilerFlag::Disabled => None,
        }
    }
}

impl FromStr for HostCompilerFlag {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s.trim() {
            "compiler-bindir" | "--compiler-bindir" => Ok(HostCompilerFlag::CompilerBindir),
            "ccbin" | "-ccbin" => Ok(HostCompilerFlag::Ccbin),
            "none" | "disabled" | "" => Ok(HostCompilerFlag::Disabled),
            other => Err(BuildError::InvalidConfig {
                message: format!(
                    "{ENV_HOST_COMPILER_FLAG} must be one of compiler-bindir, ccbin, none; got '{other}'"
                ),
            }),
        }
    }
}

// ============================================================================
// BUILD ENV
// ============================================================================

fn default_search_root() -> PathBuf {
    PathBuf::from(DEFAULT_SEARCH_ROOT)
}

/// Explicit configuration for one build session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnv {
    /// Toolchain root; when set, `bin/nvcc` must exist under it.
    #[serde(default)]
    pub cuda_home: Option<PathBuf>,

    /// Host compiler binary. Used verbatim, never validated.
    #[serde(default)]
    pub host_compiler: Option<PathBuf>,

    /// OpenCV library directory, used verbatim when set.
    #[serde(default)]
    pub opencv_libs: Option<PathBuf>,

    /// Target compute capability.
    #[serde(default)]
    pub gpu_arch: GpuArch,

    /// Root of header/library filesystem searches.
    #[serde(default = "default_search_root")]
    pub search_root: PathBuf,

    /// Command search path for tool resolution. `None` means the process `PATH`.
    #[serde(default)]
    pub search_path: Option<String>,

    /// Python interpreter override.
    #[serde(default)]
    pub python: Option<PathBuf>,

    /// Host compiler selection flag passed to nvcc.
    #[serde(default)]
    pub host_compiler_flag: HostCompilerFlag,
}

impl Default for BuildEnv {
    fn default() -> Self {
        Self {
            cuda_home: None,
            host_compiler: None,
            opencv_libs: None,
            gpu_arch: GpuArch::default(),
            search_root: default_search_root(),
            search_path: None,
            python: None,
            host_compiler_flag: HostCompilerFlag::default(),
        }
    }
}

impl BuildEnv {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> BuildResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// - `BuildError::Io` if the file cannot be read
    /// - `BuildError::InvalidConfig` if TOML parsing fails
    pub fn from_file(path: impl AsRef<Path>) -> BuildResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|e| BuildError::InvalidConfig {
            message: format!("'{}': {}", path.display(), e),
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> BuildResult<Self> {
        toml::from_str(toml).map_err(|e| BuildError::InvalidConfig {
            message: format!("Failed to parse TOML: {e}"),
        })
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> BuildResult<String> {
        toml::to_string_pretty(self).map_err(|e| BuildError::InvalidConfig {
            message: format!("Failed to serialize to TOML: {e}"),
        })
    }

    /// Apply overrides from the process environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `CUDAHOME` | `cuda_home` |
    /// | `CC` | `host_compiler` |
    /// | `OPENCV_LIBS` | `opencv_libs` |
    /// | `GPU_ARCH` | `gpu_arch` |
    /// | `OPTFLOW_SEARCH_ROOT` | `search_root` |
    /// | `PYTHON` | `python` |
    /// | `NVCC_HOST_COMPILER_FLAG` | `host_compiler_flag` |
    pub fn with_env_overrides(self) -> BuildResult<Self> {
        self.with_overrides_from(|key| env::var_os(key))
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// A malformed `GPU_ARCH` or flag style is an `InvalidConfig` error.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> BuildResult<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(val) = lookup(ENV_CUDA_HOME) {
            self.cuda_home = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup(ENV_HOST_COMPILER) {
            self.host_compiler = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup(ENV_OPENCV_LIBS) {
            self.opencv_libs = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup(ENV_GPU_ARCH) {
            self.gpu_arch = val.to_string_lossy().parse()?;
        }
        if let Some(val) = lookup(ENV_SEARCH_ROOT) {
            self.search_root = PathBuf::from(val);
        }
        if let Some(val) = lookup(ENV_PYTHON) {
            self.python = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup(ENV_HOST_COMPILER_FLAG) {
            self.host_compiler_flag = val.to_string_lossy().parse()?;
        }
        Ok(self)
    }

    /// Resolve a command name on the configured search path.
    pub fn which(&self, name: &str) -> Option<PathBuf> {
        let resolved = match &self.search_path {
            Some(paths) => {
                let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };
        resolved.ok()
    }

    /// The search path `which` consults, for error messages.
    pub fn search_path_display(&self) -> String {
        match &self.search_path {
            Some(paths) => paths.clone(),
            None => env::var_os("PATH")
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| "$PATH unset".to_string()),
        }
    }
}
