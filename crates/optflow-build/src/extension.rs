//! The `optflow` extension module: its sources and local include dirs.

use std::path::{Path, PathBuf};

use crate::source::SourceFile;

/// Name of the built module.
pub const MODULE_NAME: &str = "optflow";

/// Cython interface file, relative to the source root.
pub const INTERFACE_FILE: &str = "optflow.pyx";

/// Native EPPM sources, relative to the source root.
pub const EPPM_SOURCES: &[&str] = &[
    "EPPM/bao_pmflow_census_kernel.cu",
    "EPPM/bao_pmflow_refine_kernel.cu",
    "EPPM/bao_flow_patchmatch_multiscale_cuda.cpp",
    "EPPM/bao_flow_patchmatch_multiscale_kernel.cu",
    "EPPM/bao_pmflow_kernel.cu",
    "EPPM/basic/bao_basic_cuda.cpp",
];

/// Include dirs local to the extension, relative to the source root.
pub const LOCAL_INCLUDE_DIRS: &[&str] = &["EPPM", "EPPM/basic"];

/// A single native extension module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionModule {
    pub name: String,
    pub interface: Option<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
}

impl ExtensionModule {
    /// The `optflow` module rooted at `source_root`.
    pub fn optflow(source_root: &Path) -> Self {
        Self {
            name: MODULE_NAME.to_string(),
            interface: Some(source_root.join(INTERFACE_FILE)),
            sources: EPPM_SOURCES.iter().map(|s| source_root.join(s)).collect(),
            include_dirs: LOCAL_INCLUDE_DIRS
                .iter()
                .map(|d| source_root.join(d))
                .collect(),
        }
    }

    /// Translation unit generated from the interface file, inside `build_dir`.
    pub fn translated_path(&self, build_dir: &Path) -> Option<PathBuf> {
        let interface = self.interface.as_ref()?;
        let stem = interface.file_stem()?;
        Some(build_dir.join(stem).with_extension("cpp"))
    }

    /// Native sources in compile order, with the translated unit first.
    pub fn compile_sources(&self, translated: Option<&Path>) -> Vec<SourceFile> {
        translated
            .map(Path::to_path_buf)
            .into_iter()
            .chain(self.sources.iter().cloned())
            .map(SourceFile::new)
            .collect()
    }

    /// Output file name for the linked module.
    pub fn output_path(&self, build_dir: &Path, ext_suffix: &str) -> PathBuf {
        build_dir.join(format!("{}{}", self.name, ext_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileType;

    #[test]
    fn test_optflow_layout() {
        let ext = ExtensionModule::optflow(Path::new("/src"));
        assert_eq!(ext.name, "optflow");
        assert_eq!(ext.sources.len(), 6);
        assert_eq!(ext.interface, Some(PathBuf::from("/src/optflow.pyx")));
        assert_eq!(
            ext.include_dirs,
            vec![PathBuf::from("/src/EPPM"), PathBuf::from("/src/EPPM/basic")]
        );
    }

    #[test]
    fn test_compile_sources_classification() {
        let ext = ExtensionModule::optflow(Path::new("src"));
        let translated = ext.translated_path(Path::new("build")).unwrap();
        assert_eq!(translated, PathBuf::from("build/optflow.cpp"));

        let sources = ext.compile_sources(Some(&translated));
        assert_eq!(sources.len(), 7);
        assert_eq!(sources[0].path, translated);
        let gpu = sources.iter().filter(|s| s.file_type == FileType::Gpu).count();
        assert_eq!(gpu, 4);
    }

    #[test]
    fn test_output_path() {
        let ext = ExtensionModule::optflow(Path::new("src"));
        assert_eq!(
            ext.output_path(Path::new("build"), ".cpython-310-x86_64-linux-gnu.so"),
            PathBuf::from("build/optflow.cpython-310-x86_64-linux-gnu.so")
        );
    }
}
