//! optflow build driver
//!
//! # Commands
//!
//! - `configure`: resolve every toolchain and print the build descriptor
//! - `locate <toolchain|host|vision|python>`: run a single locator
//! - `build`: configure, translate, compile and link the extension
//!
//! Results go to stdout, logs to stderr. Exit codes: 0 success,
//! 1 configuration error, 2 build failure.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod error;

pub use error::{exit_code_for_error, CliExitCode, Unconfigured};

/// optflow build driver - toolchain discovery and mixed CUDA/C++ builds
#[derive(Parser)]
#[command(name = "optflow-build")]
#[command(author = "Optflow Build Team")]
#[command(version)]
#[command(about = "Locate CUDA, OpenCV and a host compiler, then build the optflow extension")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve toolchains and print the build descriptor
    Configure(commands::configure::ConfigureArgs),
    /// Run a single locator and print what it found
    Locate(commands::locate::LocateArgs),
    /// Build the extension module
    Build(commands::build::BuildArgs),
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Configure(args) => commands::configure::configure_command(args),
        Commands::Locate(args) => commands::locate::locate_command(args),
        Commands::Build(args) => commands::build::build_command(args),
    };

    std::process::exit(exit_code);
}
