//! `build`: configure, then translate, compile and link the extension.
//!
//! Configuration runs to completion before anything is spawned, so a missing
//! toolchain exits 1 without touching the build directory. Compile, translate
//! and link failures exit 2.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use optflow_build::translate::CYTHON;
use optflow_build::{
    BuildDescriptor, BuildEnv, BuildSession, CythonTranslator, ExtensionModule, Linker, ProcessCompiler,
};

use super::{finish, EnvArgs};
use crate::error::Unconfigured;

/// Arguments for `build`
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Directory holding optflow.pyx and the EPPM sources
    #[arg(long, default_value = ".")]
    pub source_root: PathBuf,

    /// Directory for the translated unit, objects and the linked module
    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,

    /// Cython executable; resolved on the search path when not given
    #[arg(long, env = "CYTHON")]
    pub cython: Option<PathBuf>,
}

pub fn build_command(args: BuildArgs) -> i32 {
    finish("build", run(&args))
}

fn run(args: &BuildArgs) -> anyhow::Result<()> {
    let (env, descriptor) = configure(args).context(Unconfigured)?;

    let cython = args
        .cython
        .clone()
        .or_else(|| env.which(CYTHON))
        .unwrap_or_else(|| PathBuf::from(CYTHON));
    let translator = CythonTranslator::new(cython);
    let mut compiler = ProcessCompiler::for_host(descriptor.host_compiler());
    let linker = Linker::new(descriptor.host_compiler());

    let session = BuildSession::new(
        &descriptor,
        ExtensionModule::optflow(&args.source_root),
        &args.build_dir,
    );
    let output = session.run(&translator, &mut compiler, &linker)?;

    info!(objects = output.objects.len(), "compiled sources");
    println!("{}", output.module.display());
    Ok(())
}

fn configure(args: &BuildArgs) -> anyhow::Result<(BuildEnv, BuildDescriptor)> {
    let env = args.env.load()?;
    let descriptor = BuildDescriptor::configure(&env)?;
    Ok((env, descriptor))
}
