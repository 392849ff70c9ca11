//! Integration tests for toolchain, host compiler and OpenCV discovery.
//!
//! Each test builds a throwaway `/usr`-like tree and restricts the command
//! search path to a temp `bin` directory, so results never depend on the
//! machine running the tests.

mod common;

use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;

use common::{touch, FakeSystem};
use optflow_build::{
    BuildEnv, BuildError, GpuArch, HostCompilerSelector, ToolchainLocator, VisionLibraryLocator,
};

// ========== ToolchainLocator ==========

#[test]
fn test_cudahome_override_skips_search() {
    let tmp = TempDir::new().unwrap();
    let cuda = tmp.path().join("opt/cuda");
    touch(&cuda.join("bin/nvcc"));

    let env = BuildEnv {
        cuda_home: Some(cuda.clone()),
        // Any search would fail: nothing to find, nothing on the path.
        search_root: tmp.path().join("does-not-exist"),
        search_path: Some(tmp.path().join("empty-bin").display().to_string()),
        ..BuildEnv::default()
    };

    let info = ToolchainLocator::new(&env).locate().unwrap();
    assert_eq!(info.root, cuda);
    assert_eq!(info.compiler, cuda.join("bin/nvcc"));
    assert_eq!(info.include_dir, cuda.join("include"));
    assert_eq!(info.library_dir, cuda.join("lib64"));
}

#[test]
fn test_cudahome_without_nvcc_is_invalid() {
    let tmp = TempDir::new().unwrap();
    let env = BuildEnv {
        cuda_home: Some(tmp.path().to_path_buf()),
        ..BuildEnv::default()
    };

    match ToolchainLocator::new(&env).locate() {
        Err(BuildError::InvalidToolchainPath { root, compiler }) => {
            assert_eq!(root, tmp.path());
            assert_eq!(compiler, "nvcc");
        }
        other => panic!("expected InvalidToolchainPath, got {other:?}"),
    }
}

#[test]
fn test_no_cudahome_and_no_nvcc_fails() {
    let tmp = TempDir::new().unwrap();
    let fake = FakeSystem::new(tmp.path());
    let bin = tmp.path().join("empty-bin");
    let env = fake.env(&bin);

    match ToolchainLocator::new(&env).locate() {
        Err(err @ BuildError::ToolchainNotFound { .. }) => {
            assert!(err.to_string().contains(&bin.display().to_string()), "{err}");
        }
        other => panic!("expected ToolchainNotFound, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_nvcc_on_search_path_derives_root_and_probes() {
    let tmp = TempDir::new().unwrap();
    let fake = FakeSystem::new(&tmp.path().join("usr"));
    let bin = fake.cuda_root().join("bin");
    common::write_script(&bin.join("nvcc"), "exit 0\n");

    let env = fake.env(&bin);
    let info = ToolchainLocator::new(&env).locate().unwrap();

    assert_eq!(info.compiler, bin.join("nvcc"));
    assert_eq!(info.root, fake.cuda_root());
    assert_eq!(info.include_dir, fake.cuda_root().join("include"));
    assert_eq!(info.library_dir, fake.cuda_root().join("lib64"));
}

#[cfg(unix)]
#[test]
fn test_nvcc_found_but_header_missing() {
    let tmp = TempDir::new().unwrap();
    let bin = tmp.path().join("cuda/bin");
    common::write_script(&bin.join("nvcc"), "exit 0\n");

    let env = BuildEnv {
        search_root: tmp.path().to_path_buf(),
        search_path: Some(bin.display().to_string()),
        ..BuildEnv::default()
    };
    match ToolchainLocator::new(&env).locate() {
        Err(BuildError::ToolNotFound { pattern, .. }) => assert_eq!(pattern, "cuda.h"),
        other => panic!("expected ToolNotFound, got {other:?}"),
    }
}

// ========== HostCompilerSelector ==========

#[test]
fn test_cc_override_is_not_validated() {
    let env = BuildEnv {
        host_compiler: Some(PathBuf::from("/no/such/gcc-9")),
        search_path: Some("/nonexistent-optflow-path".to_string()),
        ..BuildEnv::default()
    };
    let cc = HostCompilerSelector::new(&env).select().unwrap();
    assert_eq!(cc, PathBuf::from("/no/such/gcc-9"));
}

#[test]
fn test_missing_gcc_fails() {
    let tmp = TempDir::new().unwrap();
    let env = BuildEnv {
        search_path: Some(tmp.path().display().to_string()),
        ..BuildEnv::default()
    };
    match HostCompilerSelector::new(&env).select() {
        Err(BuildError::HostCompilerNotFound {
            compiler,
            search_path,
        }) => {
            assert_eq!(compiler, "gcc");
            assert_eq!(search_path, tmp.path().display().to_string());
        }
        other => panic!("expected HostCompilerNotFound, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_gcc_resolved_on_search_path() {
    let tmp = TempDir::new().unwrap();
    common::write_script(&tmp.path().join("gcc"), "exit 0\n");
    let env = BuildEnv {
        search_path: Some(tmp.path().display().to_string()),
        ..BuildEnv::default()
    };
    assert_eq!(
        HostCompilerSelector::new(&env).select().unwrap(),
        tmp.path().join("gcc")
    );
}

// ========== VisionLibraryLocator ==========

#[test]
fn test_opencv_probed_from_search_root() {
    let tmp = TempDir::new().unwrap();
    let fake = FakeSystem::new(tmp.path());
    let env = fake.env(tmp.path());

    let info = VisionLibraryLocator::new(&env).locate().unwrap();
    assert_eq!(info.include_dir, fake.opencv_include());
    assert_eq!(info.library_dir, fake.opencv_libs());

    let mut flags = info.link_flags.clone();
    flags.sort();
    assert_eq!(flags, ["-lopencv_core", "-lopencv_imgproc", "-lopencv_video"]);
}

#[test]
fn test_opencv_libs_override_used_verbatim() {
    let tmp = TempDir::new().unwrap();
    let fake = FakeSystem::new(&tmp.path().join("usr"));
    let custom = tmp.path().join("opt/opencv/lib");
    touch(&custom.join("libopencv_cudaoptflow.so.4.5"));

    let env = BuildEnv {
        opencv_libs: Some(custom.clone()),
        ..fake.env(tmp.path())
    };
    let info = VisionLibraryLocator::new(&env).locate().unwrap();
    assert_eq!(info.library_dir, custom);
    assert_eq!(info.link_flags, ["-lopencv_cudaoptflow"]);
}

#[test]
fn test_opencv_failures_are_wrapped() {
    let tmp = TempDir::new().unwrap();
    let fake = FakeSystem::new(tmp.path());
    let empty = tmp.path().join("empty-libs");
    std::fs::create_dir_all(&empty).unwrap();

    let env = BuildEnv {
        opencv_libs: Some(empty.clone()),
        ..fake.env(tmp.path())
    };
    match VisionLibraryLocator::new(&env).locate() {
        Err(BuildError::VisionLibraryNotFound { source }) => {
            assert!(matches!(*source, BuildError::NoLibrariesFound { ref dir } if *dir == empty));
        }
        other => panic!("expected VisionLibraryNotFound, got {other:?}"),
    }
}

#[test]
fn test_opencv_header_missing() {
    let tmp = TempDir::new().unwrap();
    let env = BuildEnv {
        search_root: tmp.path().to_path_buf(),
        ..BuildEnv::default()
    };
    match VisionLibraryLocator::new(&env).locate() {
        Err(BuildError::VisionLibraryNotFound { source }) => {
            assert!(matches!(*source, BuildError::ToolNotFound { .. }));
        }
        other => panic!("expected VisionLibraryNotFound, got {other:?}"),
    }
}

// ========== Process environment ==========

#[test]
#[serial]
fn test_process_environment_overrides() {
    let keys = ["CUDAHOME", "CC", "OPENCV_LIBS", "GPU_ARCH"];
    let saved: Vec<_> = keys.iter().map(|k| (k, std::env::var_os(k))).collect();

    std::env::set_var("CUDAHOME", "/opt/cuda");
    std::env::set_var("CC", "/usr/bin/gcc-9");
    std::env::remove_var("OPENCV_LIBS");
    std::env::set_var("GPU_ARCH", "75");

    let env = BuildEnv::from_env();

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }

    let env = env.unwrap();
    assert_eq!(env.cuda_home, Some(PathBuf::from("/opt/cuda")));
    assert_eq!(env.host_compiler, Some(PathBuf::from("/usr/bin/gcc-9")));
    assert_eq!(env.opencv_libs, None);
    assert_eq!(env.gpu_arch, GpuArch(75));
}
