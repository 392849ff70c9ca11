//! CLI command handlers
//!
//! # Modules
//!
//! - `configure`: print the assembled build descriptor
//! - `locate`: run one locator in isolation
//! - `build`: full translate, compile and link session

pub mod build;
pub mod configure;
pub mod locate;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::{debug, error};

use optflow_build::BuildEnv;

use crate::error::{exit_code_for_error, CliExitCode};

/// Configuration source shared by every command.
#[derive(Args, Debug, Clone)]
pub struct EnvArgs {
    /// TOML file with build settings; environment variables override it
    #[arg(long, env = "OPTFLOW_CONFIG")]
    pub config: Option<PathBuf>,
}

impl EnvArgs {
    /// Defaults, then the config file if given, then the process environment.
    pub fn load(&self) -> anyhow::Result<BuildEnv> {
        let base = match &self.config {
            Some(path) => {
                debug!(config = %path.display(), "loading build configuration");
                BuildEnv::from_file(path)
                    .with_context(|| format!("loading {}", path.display()))?
            }
            None => BuildEnv::default(),
        };
        let env = base
            .with_env_overrides()
            .context("applying environment overrides")?;
        debug!(?env, "build environment");
        Ok(env)
    }
}

/// Report a handler outcome and turn it into a process exit code.
pub(crate) fn finish(command: &str, result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => CliExitCode::Success.into(),
        Err(err) => {
            let code = exit_code_for_error(&err);
            error!(command, exit_code = code as u8, "command failed");
            eprintln!("error: {err:#}");
            code.into()
        }
    }
}
