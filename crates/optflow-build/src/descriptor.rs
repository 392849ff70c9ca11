//! Assembled build configuration.
//!
//! A `BuildDescriptor` is built once per session from the locator results
//! and is read-only afterwards. The dispatcher borrows it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{BuildEnv, GpuArch, HostCompilerFlag};
use crate::error::{BuildError, BuildResult};
use crate::host::HostCompilerSelector;
use crate::python::{PythonHeadersLocator, PythonInfo};
use crate::source::FileType;
use crate::toolchain::{ToolchainInfo, ToolchainLocator, CUDART_LINK_FLAG};
use crate::vision::{VisionLibraryInfo, VisionLibraryLocator};

/// Debug symbols, used for host sources and the link step.
pub const DEBUG_FLAG: &str = "-g";

/// C++ runtime; the link driver is the C compiler, which does not add it.
pub const CXX_RUNTIME_LINK_FLAG: &str = "-lstdc++";

/// Extension suffix used when no interpreter reported one.
pub const DEFAULT_EXT_SUFFIX: &str = ".so";

/// Locator results the descriptor is assembled from.
#[derive(Debug, Clone)]
pub struct DescriptorInputs {
    pub toolchain: ToolchainInfo,
    pub host_compiler: PathBuf,
    pub vision: VisionLibraryInfo,
    pub python: Option<PythonInfo>,
}

/// Paths, flags and per-file-type compiler arguments for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    arch: GpuArch,
    gpu_compiler: PathBuf,
    host_compiler: PathBuf,
    ext_suffix: String,
    include_dirs: BTreeSet<PathBuf>,
    link_args: Vec<String>,
    per_file_type_args: BTreeMap<FileType, Vec<String>>,
}

impl BuildDescriptor {
    /// Run every locator and assemble the result.
    ///
    /// All locators must succeed; the first failure aborts configuration.
    pub fn configure(env: &BuildEnv) -> BuildResult<Self> {
        let toolchain = ToolchainLocator::new(env).locate()?;
        let host_compiler = HostCompilerSelector::new(env).select()?;
        let vision = VisionLibraryLocator::new(env).locate()?;
        let python = PythonHeadersLocator::new(env).locate()?;

        let descriptor = Self::assemble(
            DescriptorInputs {
                toolchain,
                host_compiler,
                vision,
                python: Some(python),
            },
            env,
        );
        info!(
            arch = %descriptor.arch,
            include_dirs = descriptor.include_dirs.len(),
            link_args = descriptor.link_args.len(),
            "build configured"
        );
        Ok(descriptor)
    }

    /// Compose a descriptor from already-resolved parts. Pure.
    pub fn assemble(inputs: DescriptorInputs, env: &BuildEnv) -> Self {
        let DescriptorInputs {
            toolchain,
            host_compiler,
            vision,
            python,
        } = inputs;

        let mut include_dirs = BTreeSet::new();
        include_dirs.insert(toolchain.include_dir.clone());
        include_dirs.insert(vision.include_dir.clone());
        if let Some(py) = &python {
            include_dirs.insert(py.include_dir.clone());
            include_dirs.insert(py.numpy_include_dir.clone());
        }

        let mut link_args = vec!["-L".to_string(), path_arg(&vision.library_dir)];
        link_args.extend(vision.link_flags.iter().cloned());
        link_args.push("-L".to_string());
        link_args.push(path_arg(&toolchain.library_dir));
        link_args.push(CUDART_LINK_FLAG.to_string());
        link_args.push(CXX_RUNTIME_LINK_FLAG.to_string());
        link_args.push(DEBUG_FLAG.to_string());

        let mut per_file_type_args = BTreeMap::new();
        per_file_type_args.insert(
            FileType::Gpu,
            gpu_args(env.gpu_arch, env.host_compiler_flag, &host_compiler),
        );
        per_file_type_args.insert(FileType::Host, vec![DEBUG_FLAG.to_string()]);

        Self {
            arch: env.gpu_arch,
            gpu_compiler: toolchain.compiler,
            host_compiler,
            ext_suffix: python
                .map(|py| py.ext_suffix)
                .unwrap_or_else(|| DEFAULT_EXT_SUFFIX.to_string()),
            include_dirs,
            link_args,
            per_file_type_args,
        }
    }

    /// Build a descriptor from raw fields, for callers wiring their own toolchains.
    ///
    /// The result is not validated here; the dispatcher rejects a descriptor
    /// that lacks arguments for either file type.
    pub fn from_parts(
        arch: GpuArch,
        gpu_compiler: PathBuf,
        host_compiler: PathBuf,
        include_dirs: BTreeSet<PathBuf>,
        link_args: Vec<String>,
        per_file_type_args: BTreeMap<FileType, Vec<String>>,
    ) -> Self {
        Self {
            arch,
            gpu_compiler,
            host_compiler,
            ext_suffix: DEFAULT_EXT_SUFFIX.to_string(),
            include_dirs,
            link_args,
            per_file_type_args,
        }
    }

    /// Check that both file types have an argument list.
    pub fn validate(&self) -> BuildResult<()> {
        for file_type in FileType::ALL {
            if !self.per_file_type_args.contains_key(&file_type) {
                return Err(BuildError::MisconfiguredDescriptor { missing: file_type });
            }
        }
        Ok(())
    }

    pub fn arch(&self) -> GpuArch {
        self.arch
    }

    pub fn gpu_compiler(&self) -> &Path {
        &self.gpu_compiler
    }

    pub fn host_compiler(&self) -> &Path {
        &self.host_compiler
    }

    pub fn ext_suffix(&self) -> &str {
        &self.ext_suffix
    }

    pub fn include_dirs(&self) -> &BTreeSet<PathBuf> {
        &self.include_dirs
    }

    pub fn link_args(&self) -> &[String] {
        &self.link_args
    }

    /// Compiler arguments for a file type, if configured.
    pub fn args_for(&self, file_type: FileType) -> Option<&[String]> {
        self.per_file_type_args.get(&file_type).map(Vec::as_slice)
    }

    pub fn to_json(&self) -> BuildResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BuildError::InvalidConfig {
            message: format!("Failed to serialize descriptor to JSON: {e}"),
        })
    }

    pub fn to_toml_string(&self) -> BuildResult<String> {
        toml::to_string_pretty(self).map_err(|e| BuildError::InvalidConfig {
            message: format!("Failed to serialize descriptor to TOML: {e}"),
        })
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// nvcc arguments: matching `sm_`/`compute_` targets, verbose ptxas, compile
/// only, PIC through to the host compiler, and the selected host compiler.
fn gpu_args(arch: GpuArch, flag: HostCompilerFlag, host_compiler: &Path) -> Vec<String> {
    let mut args = vec![
        format!("-arch={}", arch.sm()),
        format!("-gencode=arch={},code={}", arch.compute(), arch.sm()),
        "--ptxas-options=-v".to_string(),
        "-c".to_string(),
        "--compiler-options".to_string(),
        "-fPIC".to_string(),
    ];
    if let Some(flag) = flag.flag() {
        args.push(flag.to_string());
        args.push(path_arg(host_compiler));
    }
    args
}
