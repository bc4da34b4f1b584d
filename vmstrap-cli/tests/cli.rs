//! End-to-end tests of the `vmstrap` binary.
//!
//! The test host is never an approved install target, so a real run
//! must stop at validation without touching anything.

use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

fn vmstrap() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vmstrap"));
    cmd.timeout(Duration::from_secs(30));
    for var in ["VMSTRAP_DEVICE", "VMSTRAP_CONFIG", "VMSTRAP_API_URL", "VMSTRAP_WORK_DIR"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_flags() {
    vmstrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--device"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--api-url"));
}

#[test]
fn test_unapproved_host_fails_validation() {
    let dir = TempDir::new().unwrap();
    vmstrap()
        .args(["--device", "/dev/vmstrap-test-null", "--api-url", "http://127.0.0.1:9"])
        .arg("--work-dir")
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: precondition failed"))
        .stdout(predicate::str::contains("Installation complete").not());

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    vmstrap()
        .arg("--config")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn test_unknown_config_field() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("vmstrap.json");
    std::fs::write(&config, r#"{ "device": "/dev/vdb", "disk_size": 10 }"#).unwrap();

    vmstrap()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field"));
}

#[test]
fn test_script_path_under_tmp_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("vmstrap.json");
    std::fs::write(
        &config,
        r#"{ "system": { "script_path": "/tmp/vmstrap-configure.sh" } }"#,
    )
    .unwrap();

    vmstrap()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must not be under /tmp"));
}

#[test]
fn test_config_from_env() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("vmstrap.json");
    std::fs::write(&config, r#"{ "mount_root": "relative/mnt" }"#).unwrap();

    vmstrap()
        .env("VMSTRAP_CONFIG", &config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mount_root must be an absolute path"));
}
