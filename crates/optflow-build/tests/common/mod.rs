//! Shared fixtures: fake toolchain trees and recording tool scripts.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use optflow_build::BuildEnv;

/// Create an empty file, making parent directories.
pub fn touch(path: &Path) {
    fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent dirs");
    fs::write(path, b"").expect("write file");
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent dirs");
    fs::write(path, format!("#!/bin/sh\n{body}")).expect("write script");
    let mut perms = fs::metadata(path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod script");
}

/// A tool that appends `<tag> <args>` to `log` and creates whatever follows `-o`.
#[cfg(unix)]
pub fn write_recording_tool(path: &Path, tag: &str, log: &Path) {
    let body = format!(
        r#"echo "{tag} $*" >> "{log}"
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then
    shift
    mkdir -p "$(dirname "$1")"
    : > "$1"
  fi
  shift
done
"#,
        tag = tag,
        log = log.display()
    );
    write_script(path, &body);
}

/// A tool that always exits with status 1.
#[cfg(unix)]
pub fn write_failing_tool(path: &Path) {
    write_script(path, "exit 1\n");
}

/// Fake Python that answers the header query.
#[cfg(unix)]
pub fn write_fake_python(path: &Path, include: &Path, numpy: &Path, suffix: &str) {
    let body = format!(
        "echo '{}'\necho '{}'\necho '{}'\n",
        include.display(),
        numpy.display(),
        suffix
    );
    write_script(path, &body);
}

/// A `/usr`-like tree with CUDA and OpenCV headers and libraries.
pub struct FakeSystem {
    pub root: PathBuf,
}

impl FakeSystem {
    pub fn new(root: &Path) -> Self {
        touch(&root.join("local/cuda/include/cuda.h"));
        touch(&root.join("local/cuda/lib64/libcudart.so"));
        touch(&root.join("include/opencv4/opencv2/core/core.hpp"));
        for lib in [
            "libopencv_core.so",
            "libopencv_core.so.4.5",
            "libopencv_core.so.4.5.4",
            "libopencv_imgproc.so",
            "libopencv_imgproc.so.4.5.4",
            "libopencv_video.so.4.5.4",
            "libz.so.1",
        ] {
            touch(&root.join("lib/x86_64-linux-gnu").join(lib));
        }
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn cuda_root(&self) -> PathBuf {
        self.root.join("local/cuda")
    }

    pub fn opencv_include(&self) -> PathBuf {
        self.root.join("include/opencv4")
    }

    pub fn opencv_libs(&self) -> PathBuf {
        self.root.join("lib/x86_64-linux-gnu")
    }

    /// Environment that searches this tree and resolves tools only from `bin_dir`.
    pub fn env(&self, bin_dir: &Path) -> BuildEnv {
        BuildEnv {
            search_root: self.root.clone(),
            search_path: Some(bin_dir.display().to_string()),
            ..BuildEnv::default()
        }
    }
}
