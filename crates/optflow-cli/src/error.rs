//! CLI exit codes.
//!
//! - 0: Success
//! - 1: Configuration error (a locator or the config file failed)
//! - 2: Build failure (a translator, compiler or linker run failed)

use std::fmt;
use std::process::ExitCode;

use optflow_build::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CliExitCode {
    Success = 0,
    /// Nothing was built; fix the environment and rerun.
    ConfigError = 1,
    /// Configuration succeeded but a spawned tool failed.
    BuildFailed = 2,
}

impl From<CliExitCode> for ExitCode {
    fn from(code: CliExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<CliExitCode> for i32 {
    fn from(code: CliExitCode) -> Self {
        code as i32
    }
}

impl From<&BuildError> for CliExitCode {
    fn from(err: &BuildError) -> Self {
        if err.is_configuration_error() {
            CliExitCode::ConfigError
        } else {
            CliExitCode::BuildFailed
        }
    }
}

/// Context marking an error raised before any tool was spawned for the build.
///
/// Attached as the outermost context, it forces exit code 1 even for IO
/// errors, which otherwise count as build failures.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured;

impl fmt::Display for Unconfigured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("configuration failed")
    }
}

/// Exit code for an error that may wrap a [`BuildError`] somewhere in its chain.
///
/// Errors with no `BuildError` inside (serialization, stdout) count as
/// configuration errors: nothing was built.
pub fn exit_code_for_error(err: &anyhow::Error) -> CliExitCode {
    if err.downcast_ref::<Unconfigured>().is_some() {
        return CliExitCode::ConfigError;
    }
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .map(CliExitCode::from)
        .unwrap_or(CliExitCode::ConfigError)
}
