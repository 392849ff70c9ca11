//! One build session: translate, compile, link.
//!
//! Configuration has already succeeded by the time a session exists, so a
//! session only ever fails with compile, translate or link errors. The first
//! failure aborts the session.

use std::path::PathBuf;

use tracing::info;

use crate::descriptor::BuildDescriptor;
use crate::dispatch::{CompilerDispatcher, CompilerInvocation};
use crate::error::BuildResult;
use crate::extension::ExtensionModule;
use crate::link::Linker;
use crate::translate::Translator;

/// Artifacts produced by a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub objects: Vec<PathBuf>,
    pub module: PathBuf,
}

/// Drives a single extension build against a configured descriptor.
pub struct BuildSession<'d> {
    descriptor: &'d BuildDescriptor,
    extension: ExtensionModule,
    build_dir: PathBuf,
}

impl<'d> BuildSession<'d> {
    pub fn new(descriptor: &'d BuildDescriptor, extension: ExtensionModule, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            extension,
            build_dir: build_dir.into(),
        }
    }

    /// Translate and compile every source; returns the object files.
    pub fn compile<T, C>(&self, translator: &T, invocation: &mut C) -> BuildResult<Vec<PathBuf>>
    where
        T: Translator + ?Sized,
        C: CompilerInvocation + ?Sized,
    {
        let dispatcher = CompilerDispatcher::new(self.descriptor)?
            .with_local_includes(self.extension.include_dirs.iter().cloned());

        let translated = match (&self.extension.interface, self.extension.translated_path(&self.build_dir)) {
            (Some(interface), Some(output)) => {
                translator.translate(interface, &output)?;
                Some(output)
            }
            _ => None,
        };

        let sources = self.extension.compile_sources(translated.as_deref());
        let object_dir = self.build_dir.join("obj");
        dispatcher.compile_all(invocation, &sources, &object_dir)
    }

    /// Full session: translate, compile, link.
    pub fn run<T, C>(&self, translator: &T, invocation: &mut C, linker: &Linker) -> BuildResult<BuildOutput>
    where
        T: Translator + ?Sized,
        C: CompilerInvocation + ?Sized,
    {
        info!(
            module = %self.extension.name,
            build_dir = %self.build_dir.display(),
            "starting build session"
        );
        let objects = self.compile(translator, invocation)?;
        let module = self
            .extension
            .output_path(&self.build_dir, self.descriptor.ext_suffix());
        linker.link(&objects, &module, self.descriptor.link_args())?;
        info!(module = %module.display(), "build session complete");
        Ok(BuildOutput { objects, module })
    }
}
