//! `configure`: resolve every toolchain and print the descriptor.

use anyhow::Context;
use clap::{Args, ValueEnum};
use tracing::info;

use optflow_build::BuildDescriptor;

use super::{finish, EnvArgs};
use crate::error::Unconfigured;

/// Output format for the descriptor.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
}

/// Arguments for `configure`
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Descriptor output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

pub fn configure_command(args: ConfigureArgs) -> i32 {
    finish("configure", run(&args).context(Unconfigured))
}

fn run(args: &ConfigureArgs) -> anyhow::Result<()> {
    let env = args.env.load()?;
    let descriptor = BuildDescriptor::configure(&env)?;
    info!(
        arch = descriptor.arch().0,
        gpu_compiler = %descriptor.gpu_compiler().display(),
        host_compiler = %descriptor.host_compiler().display(),
        "configuration complete"
    );

    let rendered = match args.format {
        OutputFormat::Json => descriptor.to_json(),
        OutputFormat::Toml => descriptor.to_toml_string(),
    }
    .context("rendering descriptor")?;
    println!("{rendered}");
    Ok(())
}
