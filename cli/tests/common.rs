//! # arcwrite Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`: a command
//! builder for the compiled binary that is isolated from the developer's own
//! configuration, a fixture source tree, and readers that list what ended up
//! in an archive.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

/// # Get arcwrite Command (`arcwrite_cmd`)
///
/// Returns a `Command` for the compiled `arcwrite` binary. The command reads
/// its configuration from `config_dir/config.toml` (created empty if
/// missing), so user and project config files never leak into tests.
pub fn arcwrite_cmd(config_dir: &Path) -> Command {
    let config = config_dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").expect("Failed to write test config");
    }
    let mut cmd = Command::cargo_bin("arcwrite").expect("Failed to find arcwrite binary for testing");
    cmd.env("ARCWRITE_CONFIG", &config)
        .env_remove("ARCWRITE_PASSPHRASE")
        .env_remove("RUST_LOG");
    cmd
}

/// Builds this tree under `base` and returns the path of `tree`:
///
/// ```text
/// tree/
/// ├── docs/
/// │   ├── empty.txt      (0 bytes)
/// │   └── readme.md
/// └── hello.txt
/// ```
pub fn sample_tree(base: &Path) -> PathBuf {
    let root = base.join("tree");
    fs::create_dir_all(root.join("docs")).expect("Failed to create fixture dirs");
    fs::write(root.join("hello.txt"), b"hello, archive\n").expect("fixture write");
    fs::write(root.join("docs/readme.md"), b"# readme\n".repeat(500)).expect("fixture write");
    fs::write(root.join("docs/empty.txt"), b"").expect("fixture write");
    root
}

/// Paths of all members of an uncompressed tar archive, in archive order.
pub fn tar_names(bytes: &[u8]) -> Vec<PathBuf> {
    let mut archive = tar::Archive::new(bytes);
    archive
        .entries()
        .expect("readable tar")
        .map(|entry| entry.expect("tar entry").path().expect("tar path").into_owned())
        .collect()
}

/// Contents of the tar member at `name`.
pub fn tar_member(bytes: &[u8], name: &Path) -> Option<Vec<u8>> {
    let mut archive = tar::Archive::new(bytes);
    for entry in archive.entries().expect("readable tar") {
        let mut entry = entry.expect("tar entry");
        if &*entry.path().expect("tar path") == name {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).expect("tar payload");
            return Some(data);
        }
    }
    None
}

/// Names of all members of a zip archive.
pub fn zip_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("readable zip");
    archive.file_names().map(str::to_string).collect()
}

/// Archive name of `path` once leading separators are stripped.
pub fn archived_name(path: &Path) -> PathBuf {
    path.strip_prefix("/").unwrap_or(path).to_path_buf()
}
