//! Build configuration for the `optflow` CUDA/OpenCV extension module.
//!
//! The extension mixes three toolchains: a host C++ compiler, nvcc, and
//! OpenCV. This crate finds them on an unconfigured machine, assembles the
//! include paths, link flags and per-architecture nvcc flags, and sends each
//! source of a build to the right compiler.
//!
//! # Flow
//!
//! 1. [`BuildEnv`] is populated once from defaults, an optional TOML file and
//!    the environment (`CUDAHOME`, `CC`, `OPENCV_LIBS`, `GPU_ARCH`).
//! 2. The locators ([`ToolchainLocator`], [`HostCompilerSelector`],
//!    [`VisionLibraryLocator`], [`PythonHeadersLocator`]) resolve paths.
//! 3. [`BuildDescriptor::configure`] composes their results.
//! 4. [`BuildSession`] translates the interface file, compiles each source
//!    through [`CompilerDispatcher`], and links the module.
//!
//! # Example
//!
//! ```rust,ignore
//! use optflow_build::{BuildDescriptor, BuildEnv};
//!
//! let env = BuildEnv::from_env()?;
//! let descriptor = BuildDescriptor::configure(&env)?;
//! println!("{}", descriptor.to_json()?);
//! ```

pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod host;
pub mod libraries;
pub mod link;
pub mod probe;
pub mod python;
pub mod session;
pub mod source;
pub mod toolchain;
pub mod translate;
pub mod vision;

pub use config::{BuildEnv, GpuArch, HostCompilerFlag};
pub use descriptor::{BuildDescriptor, DescriptorInputs};
pub use dispatch::{CompileRequest, CompilerCommand, CompilerDispatcher, CompilerInvocation, ProcessCompiler};
pub use error::{BuildError, BuildResult};
pub use extension::ExtensionModule;
pub use host::HostCompilerSelector;
pub use libraries::LibraryEnumerator;
pub use link::Linker;
pub use probe::PathProbe;
pub use python::{PythonHeadersLocator, PythonInfo};
pub use session::{BuildOutput, BuildSession};
pub use source::{FileType, SourceFile};
pub use toolchain::{ToolchainInfo, ToolchainLocator};
pub use translate::{CythonTranslator, Translator};
pub use vision::{VisionLibraryInfo, VisionLibraryLocator};
