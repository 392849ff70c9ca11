//! Shared library enumeration.
//!
//! Turns a directory of shared libraries into linker flags. The logical name
//! of `libopencv_core.so.4.5.4` is `opencv_core`, so the versioned file, its
//! `.so.405` soname link and the bare `.so` link all collapse into a single
//! `-lopencv_core`.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BuildError, BuildResult};

const LIB_PREFIX: &str = "lib";
const SO_SUFFIX: &str = ".so";
const DYLIB_SUFFIX: &str = ".dylib";

/// Extract the logical library name from a shared library file name.
///
/// Returns `None` for anything that is not `lib<name>.so[.<version>]` or
/// `lib<name>[.<version>].dylib`. Dots inside `<name>` are kept, so
/// `libpython3.10.so` is `python3.10`.
pub fn logical_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_prefix(LIB_PREFIX)?;
    let name = match so_suffix_position(stem) {
        Some(end) => &stem[..end],
        // libfoo.1.dylib: the version sits before the suffix
        None => strip_version(stem.strip_suffix(DYLIB_SUFFIX)?),
    };
    (!name.is_empty()).then_some(name)
}

/// Position of `.so` when it ends the name or is followed by a version tail.
fn so_suffix_position(stem: &str) -> Option<usize> {
    stem.match_indices(SO_SUFFIX).map(|(pos, _)| pos).find(|&pos| {
        let rest = &stem[pos + SO_SUFFIX.len()..];
        rest.is_empty() || rest.strip_prefix('.').is_some_and(is_version)
    })
}

fn is_version(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Drop trailing `.<digits>` components.
fn strip_version(mut name: &str) -> &str {
    while let Some((head, tail)) = name.rsplit_once('.') {
        if tail.is_empty() || !tail.chars().all(|c| c.is_ascii_digit()) {
            break;
        }
        name = head;
    }
    name
}

/// Produces `-l<name>` link flags for the libraries in a directory tree.
#[derive(Debug, Clone, Default)]
pub struct LibraryEnumerator {
    prefix: Option<String>,
}

impl LibraryEnumerator {
    /// Enumerator accepting every shared library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept libraries whose logical name starts with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// One link flag per distinct logical name under `dir`.
    ///
    /// Order follows the directory walk (sorted by file name); callers should
    /// only rely on the set of flags.
    ///
    /// # Errors
    /// `BuildError::NoLibrariesFound` when no matching library is present.
    pub fn list_libraries(&self, dir: &Path) -> BuildResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut flags = Vec::new();

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| !entry.file_type().is_dir())
        {
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(name) = logical_name(file_name) else {
                continue;
            };
            if let Some(prefix) = &self.prefix {
                if !name.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            if seen.insert(name.to_string()) {
                debug!(library = name, file = %entry.path().display(), "found library");
                flags.push(format!("-l{name}"));
            }
        }

        if flags.is_empty() {
            return Err(BuildError::NoLibrariesFound {
                dir: dir.to_path_buf(),
            });
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn touch_all(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_logical_name() {
        assert_eq!(logical_name("libopencv_core.so"), Some("opencv_core"));
        assert_eq!(logical_name("libopencv_core.so.4.5.4"), Some("opencv_core"));
        assert_eq!(logical_name("libopencv_core.so.405"), Some("opencv_core"));
        assert_eq!(logical_name("libcudart.so.11.0"), Some("cudart"));
        assert_eq!(logical_name("libopencv_core.4.5.dylib"), Some("opencv_core"));
        assert_eq!(logical_name("libfoo.dylib"), Some("foo"));
    }

    #[test]
    fn test_logical_name_keeps_dots_in_name() {
        assert_eq!(logical_name("libpython3.10.so"), Some("python3.10"));
        assert_eq!(logical_name("libpython3.10.so.1.0"), Some("python3.10"));
        assert_eq!(logical_name("libtbb.so.12"), Some("tbb"));
    }

    #[test]
    fn test_dotted_names_stay_distinct() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["libpython3.10.so", "libpython3.11.so.1.0"]);

        let flags = LibraryEnumerator::new().list_libraries(tmp.path()).unwrap();
        assert_eq!(flags, vec!["-lpython3.10", "-lpython3.11"]);
    }

    #[test]
    fn test_logical_name_rejects_non_shared() {
        assert_eq!(logical_name("libopencv_core.a"), None);
        assert_eq!(logical_name("opencv_core.so"), None);
        assert_eq!(logical_name("lib.so"), None);
        assert_eq!(logical_name("libfoo.so.bak"), None);
        assert_eq!(logical_name("README"), None);
    }

    #[test]
    fn test_lists_distinct_names() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "libopencv_core.so",
                "libopencv_core.so.4.5",
                "libopencv_core.so.4.5.4",
                "libopencv_imgproc.so",
                "libopencv_imgproc.so.4.5",
                "libopencv_video.so.4.5.4",
            ],
        );

        let mut flags = LibraryEnumerator::new().list_libraries(tmp.path()).unwrap();
        flags.sort();
        assert_eq!(
            flags,
            vec!["-lopencv_core", "-lopencv_imgproc", "-lopencv_video"]
        );
    }

    #[test]
    fn test_prefix_filter() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["libopencv_core.so", "libz.so", "libpng16.so.16"]);

        let flags = LibraryEnumerator::with_prefix("opencv")
            .list_libraries(tmp.path())
            .unwrap();
        assert_eq!(flags, vec!["-lopencv_core"]);
    }

    #[test]
    fn test_walks_subdirectories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("opencv4/3rdparty")).unwrap();
        touch_all(&tmp.path().join("opencv4/3rdparty"), &["libopencv_extra.so"]);

        let flags = LibraryEnumerator::new().list_libraries(tmp.path()).unwrap();
        assert_eq!(flags, vec!["-lopencv_extra"]);
    }

    #[test]
    fn test_empty_directory_fails() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["README", "libstatic.a"]);

        match LibraryEnumerator::new().list_libraries(tmp.path()) {
            Err(BuildError::NoLibrariesFound { dir }) => assert_eq!(dir, tmp.path()),
            other => panic!("expected NoLibrariesFound, got {other:?}"),
        }
    }
}
