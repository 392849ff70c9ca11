//! Per-file compiler dispatch.
//!
//! A build compiles every source through one shared [`CompilerInvocation`].
//! Host sources go through it unchanged. For a `.cu` source the dispatcher
//! swaps the active command to nvcc, compiles, and restores the original
//! command before returning, including when the compile fails. If the restore
//! were skipped, every later host source in the session would silently be
//! compiled by nvcc.
//!
//! The override lives in a guard whose `Drop` performs the restore, and the
//! guard holds the invocation by `&mut`, so two files can never have
//! overlapping override windows on the same invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::descriptor::BuildDescriptor;
use crate::error::{BuildError, BuildResult};
use crate::source::{FileType, SourceFile};

/// Flags the host compiler always needs for shared-object code.
pub const HOST_BASE_FLAGS: &[&str] = &["-fPIC"];

/// The active compiler: program plus flags that precede every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    pub program: PathBuf,
    pub flags: Vec<String>,
}

impl CompilerCommand {
    /// Command with no base flags.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            flags: Vec::new(),
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }
}

/// Everything needed to compile one source into one object.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub source: &'a Path,
    pub object: &'a Path,
    pub include_dirs: &'a [PathBuf],
    pub args: &'a [String],
}

/// The shared compiler-invocation object of a build session.
pub trait CompilerInvocation {
    /// Currently active command.
    fn command(&self) -> &CompilerCommand;

    /// Replace the active command.
    fn set_command(&mut self, command: CompilerCommand);

    /// Compile one source with the active command.
    fn compile(&mut self, request: &CompileRequest<'_>) -> BuildResult<()>;
}

/// Spawns the active command as a child process.
///
/// Command line: `<program> <flags> -I<dir>... -c <source> -o <object> <args>`.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    command: CompilerCommand,
}

impl ProcessCompiler {
    pub fn new(command: CompilerCommand) -> Self {
        Self { command }
    }

    /// Host compiler configured for shared-object code.
    pub fn for_host(host_compiler: &Path) -> Self {
        Self::new(CompilerCommand::new(host_compiler).with_flags(HOST_BASE_FLAGS.iter().copied()))
    }
}

impl CompilerInvocation for ProcessCompiler {
    fn command(&self) -> &CompilerCommand {
        &self.command
    }

    fn set_command(&mut self, command: CompilerCommand) {
        self.command = command;
    }

    fn compile(&mut self, request: &CompileRequest<'_>) -> BuildResult<()> {
        if let Some(parent) = request.object.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.flags)
            .args(request.include_dirs.iter().map(|dir| format!("-I{}", dir.display())))
            .arg("-c")
            .arg(request.source)
            .arg("-o")
            .arg(request.object)
            .args(request.args);

        debug!(command = ?cmd, "spawning compiler");
        let status = cmd.status().map_err(|source| BuildError::Io {
            path: self.command.program.clone(),
            source,
        })?;

        if !status.success() {
            return Err(BuildError::CommandFailed {
                program: self.command.program.display().to_string(),
                target: request.source.to_path_buf(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Temporarily installs a command on an invocation and restores the saved
/// one on drop.
struct CompilerOverride<'a, C: CompilerInvocation + ?Sized> {
    invocation: &'a mut C,
    saved: Option<CompilerCommand>,
}

impl<'a, C: CompilerInvocation + ?Sized> CompilerOverride<'a, C> {
    fn install(invocation: &'a mut C, command: CompilerCommand) -> Self {
        let saved = invocation.command().clone();
        invocation.set_command(command);
        Self {
            invocation,
            saved: Some(saved),
        }
    }

    fn compile(&mut self, request: &CompileRequest<'_>) -> BuildResult<()> {
        self.invocation.compile(request)
    }
}

impl<C: CompilerInvocation + ?Sized> Drop for CompilerOverride<'_, C> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.invocation.set_command(saved);
        }
    }
}

/// Routes each source to the GPU or host argument list of a descriptor.
#[derive(Debug)]
pub struct CompilerDispatcher<'d> {
    descriptor: &'d BuildDescriptor,
    include_dirs: Vec<PathBuf>,
}

impl<'d> CompilerDispatcher<'d> {
    /// Borrow a descriptor for dispatch.
    ///
    /// # Errors
    /// `MisconfiguredDescriptor` if either file type has no argument list.
    pub fn new(descriptor: &'d BuildDescriptor) -> BuildResult<Self> {
        descriptor.validate()?;
        Ok(Self {
            descriptor,
            include_dirs: descriptor.include_dirs().iter().cloned().collect(),
        })
    }

    /// Prepend extension-local include directories.
    pub fn with_local_includes<I>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut local: Vec<PathBuf> = dirs.into_iter().collect();
        local.append(&mut self.include_dirs);
        self.include_dirs = local;
        self
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    /// Compile one source into `object`.
    ///
    /// # Errors
    /// `UnsupportedSource` for extensions outside the C/C++/CUDA list.
    pub fn compile<C>(&self, invocation: &mut C, source: &SourceFile, object: &Path) -> BuildResult<()>
    where
        C: CompilerInvocation + ?Sized,
    {
        if !source.is_compilable() {
            return Err(BuildError::UnsupportedSource {
                path: source.path.clone(),
            });
        }
        let args = self
            .descriptor
            .args_for(source.file_type)
            .ok_or(BuildError::MisconfiguredDescriptor {
                missing: source.file_type,
            })?;
        let request = CompileRequest {
            source: &source.path,
            object,
            include_dirs: &self.include_dirs,
            args,
        };

        info!(source = %source.path.display(), file_type = %source.file_type, "compiling");
        match source.file_type {
            FileType::Gpu => {
                let gpu = CompilerCommand::new(self.descriptor.gpu_compiler());
                let mut guard = CompilerOverride::install(invocation, gpu);
                guard.compile(&request)
            }
            FileType::Host => invocation.compile(&request),
        }
    }

    /// Compile every source in order, stopping at the first failure.
    ///
    /// Returns the object paths in source order.
    pub fn compile_all<C>(
        &self,
        invocation: &mut C,
        sources: &[SourceFile],
        object_dir: &Path,
    ) -> BuildResult<Vec<PathBuf>>
    where
        C: CompilerInvocation + ?Sized,
    {
        let mut objects = Vec::with_capacity(sources.len());
        for source in sources {
            let object = source.object_path(object_dir);
            self.compile(invocation, source, &object)?;
            objects.push(object);
        }
        Ok(objects)
    }
}
