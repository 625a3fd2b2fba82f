//! Invocations of the extractor binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn extractor() -> Command {
    Command::cargo_bin("wow-extractor").unwrap()
}

#[test]
fn help_lists_the_phase_toggles() {
    extractor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--extract-dbc"))
        .stdout(predicate::str::contains("--extract-map"))
        .stdout(predicate::str::contains("--generate-vmap"))
        .stdout(predicate::str::contains("--generate-mmap"))
        .stdout(predicate::str::contains("--flat-map"))
        .stdout(predicate::str::contains("--skip-continents"));
}

#[test]
fn unknown_client_is_rejected() {
    let client = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    extractor()
        .arg("-c")
        .arg(client.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn classic_client_without_archives_extracts_nothing() {
    let client = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(client.path().join("WoW.exe"), b"MZ\0\0 Version 1.12.1 (build 5875) Release").unwrap();

    extractor()
        .arg("-c")
        .arg(client.path())
        .arg("-o")
        .arg(out.path())
        .args(["-m", "0", "--generate-vmap", "0", "--generate-mmap", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Classic"))
        .stderr(predicate::str::contains("DBC extraction summary: 0 / 0"))
        .stderr(predicate::str::contains("not available in this build"));

    assert!(out.path().join("dbc").is_dir());
    assert!(!out.path().join("maps").exists());
}

#[test]
fn bad_configuration_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("extractor.yaml");
    fs::write(&path, "map: [not, a, table]\n").unwrap();
    extractor()
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("extractor.yaml"));
}
