//! `locate`: run a single locator and print its result as JSON.

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde_json::json;

use optflow_build::{
    BuildEnv, HostCompilerSelector, PythonHeadersLocator, ToolchainLocator, VisionLibraryLocator,
};

use super::{finish, EnvArgs};
use crate::error::Unconfigured;

/// Which locator to run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// CUDA root, nvcc, include and library dirs
    Toolchain,
    /// Host C/C++ compiler
    Host,
    /// OpenCV include dir, library dir and link flags
    Vision,
    /// Python and numpy header dirs, extension suffix
    Python,
}

/// Arguments for `locate`
#[derive(Args, Debug)]
pub struct LocateArgs {
    #[arg(value_enum)]
    pub target: Target,

    #[command(flatten)]
    pub env: EnvArgs,
}

pub fn locate_command(args: LocateArgs) -> i32 {
    finish("locate", run(&args).context(Unconfigured))
}

fn run(args: &LocateArgs) -> anyhow::Result<()> {
    let env = args.env.load()?;
    let value = locate(args.target, &env)?;
    let rendered = serde_json::to_string_pretty(&value).context("rendering result")?;
    println!("{rendered}");
    Ok(())
}

fn locate(target: Target, env: &BuildEnv) -> anyhow::Result<serde_json::Value> {
    let value = match target {
        Target::Toolchain => serde_json::to_value(ToolchainLocator::new(env).locate()?)?,
        Target::Host => {
            let compiler = HostCompilerSelector::new(env).select()?;
            json!({ "host_compiler": compiler.display().to_string() })
        }
        Target::Vision => serde_json::to_value(VisionLibraryLocator::new(env).locate()?)?,
        Target::Python => serde_json::to_value(PythonHeadersLocator::new(env).locate()?)?,
    };
    Ok(value)
}
