//! # arcwrite Create Command Integration Tests
//!
//! File: cli/tests/cli.rs
//!
//! ## Overview
//!
//! Runs the compiled `arcwrite create` against fixture trees in temporary
//! directories. Each test points `ARCWRITE_CONFIG` at its own config file.
//!
mod common;

use common::{arcwrite_cmd, archived_name, sample_tree, tar_member, tar_names, zip_names};
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Read};
use tempfile::tempdir;

#[test]
fn test_create_tar_file() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = sample_tree(work.path());
    let out = work.path().join("out/site.tar");

    arcwrite_cmd(cfg.path())
        .args(["create", "-o"])
        .arg(&out)
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived 5 entries to").and(predicate::str::contains("(tar)")));

    let bytes = fs::read(&out).expect("archive written");
    assert_eq!(tar_names(&bytes).len(), 5);
    assert_eq!(
        tar_member(&bytes, &archived_name(&root.join("hello.txt"))),
        Some(b"hello, archive\n".to_vec())
    );
}

#[test]
fn test_create_to_stdout() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = sample_tree(work.path());

    let assert = arcwrite_cmd(cfg.path())
        .args(["c", "-o", "-", "--format", "gnutar"])
        .arg(root.join("hello.txt"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Archived 1 entries to <stdout> (gnutar)"));

    let stdout = &assert.get_output().stdout;
    assert_eq!(tar_names(stdout), vec![archived_name(&root.join("hello.txt"))]);
}

#[test]
fn test_create_gzip_tar() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = sample_tree(work.path());
    let out = work.path().join("site.tar.gz");

    arcwrite_cmd(cfg.path())
        .args(["create", "--filter", "gzip", "-o"])
        .arg(&out)
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("(tar+gzip)"));

    let compressed = fs::read(&out).unwrap();
    assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    let mut plain = Vec::new();
    flate2::read::GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut plain)
        .unwrap();
    assert_eq!(tar_names(&plain).len(), 5);
}

#[test]
fn test_passphrase_from_env_encrypts_zip() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = sample_tree(work.path());
    let out = work.path().join("secret.zip");

    arcwrite_cmd(cfg.path())
        .env("ARCWRITE_PASSPHRASE", "s3cret")
        .args(["create", "-f", "zip", "--options", "zip:encryption=aes256", "-o"])
        .arg(&out)
        .arg(&root)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let name = archived_name(&root.join("hello.txt"));
    let name = name.to_str().unwrap();
    assert!(archive.by_name(name).is_err());
    let mut text = String::new();
    archive
        .by_name_decrypt(name, b"s3cret")
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "hello, archive\n");
}

#[test]
fn test_missing_source_fails_and_removes_output() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = sample_tree(work.path());
    let out = work.path().join("broken.tar");

    arcwrite_cmd(cfg.path())
        .args(["create", "-o"])
        .arg(&out)
        .arg(&root)
        .arg(work.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("Error: Failed to create archive")
                .and(predicate::str::contains("Could not build header")),
        );

    assert!(!out.exists());
}

#[test]
fn test_output_inside_archived_directory() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = sample_tree(work.path());

    arcwrite_cmd(cfg.path())
        .current_dir(&root)
        .args(["create", "-o", "backup.tar", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived 5 entries to backup.tar"));

    let names = tar_names(&fs::read(root.join("backup.tar")).unwrap());
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|n| !n.ends_with("backup.tar")));
}

#[test]
fn test_unknown_format_fails() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let out = work.path().join("x.rar");

    arcwrite_cmd(cfg.path())
        .args(["create", "-f", "rar", "-o"])
        .arg(&out)
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown archive format 'rar'"));

    assert!(!out.exists());
}

#[test]
fn test_config_supplies_defaults() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = sample_tree(work.path());
    let archives = work.path().join("archives");
    fs::write(
        cfg.path().join("config.toml"),
        format!(
            "[create]\nformat = \"zip\"\n\n[output]\ndirectory = \"{}\"\n",
            archives.display()
        ),
    )
    .unwrap();

    arcwrite_cmd(cfg.path())
        .current_dir(work.path())
        .args(["create", "-o", "bundle.zip"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("(zip)"));

    let out = archives.join("bundle.zip");
    let bytes = fs::read(&out).expect("archive written to configured directory");
    assert_eq!(&bytes[..2], b"PK");
    assert_eq!(zip_names(&bytes).len(), 5);
    assert!(!work.path().join("bundle.zip").exists());
}

#[test]
fn test_invalid_config_is_reported() {
    let cfg = tempdir().unwrap();
    let work = tempdir().unwrap();
    fs::write(cfg.path().join("config.toml"), "[create]\nblock_size = 0\n").unwrap();

    arcwrite_cmd(cfg.path())
        .args(["create", "-o"])
        .arg(work.path().join("x.tar"))
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load arcwrite configuration"));
}
