use assert_cmd::prelude::*;
use predicates::ord::eq;
use predicates::prelude::*;
use predicates::str::{contains, is_empty};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use walkdir::WalkDir;

fn kv(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kv").unwrap();
    cmd.current_dir(dir).env_remove("KV_DATABASE");
    cmd
}

fn database(dir: &Path) -> String {
    fs::read_to_string(dir.join("database.txt")).expect("database file missing")
}

// `kv` with no commands does nothing: no output, no database.
#[test]
fn cli_no_args() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path())
        .assert()
        .success()
        .stdout(is_empty())
        .stderr(is_empty());
    assert!(!temp_dir.path().join("database.txt").exists());
}

#[test]
fn cli_version() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path())
        .arg("-V")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path())
        .args(&["p,5,hello", "p,3,world", "g,5", "d,3", "g,3", "a"])
        .assert()
        .success()
        .stdout(eq("5,hello\n3 not found\n5,hello\n"))
        .stderr(is_empty());
    assert_eq!(database(temp_dir.path()), "5,hello\n");
}

#[test]
fn cli_state_survives_runs() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path()).args(&["p,1,a", "p,2,b"]).assert().success();
    kv(temp_dir.path()).args(&["p,3,c", "p,1,z"]).assert().success();
    kv(temp_dir.path())
        .args(&["g,1", "a"])
        .assert()
        .success()
        .stdout(eq("1,z\n1,z\n2,b\n3,c\n"));
    assert_eq!(database(temp_dir.path()), "1,z\n2,b\n3,c\n");

    kv(temp_dir.path()).arg("c").assert().success().stdout(is_empty());
    assert_eq!(database(temp_dir.path()), "");
}

#[test]
fn cli_bad_commands_are_reported_and_skipped() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path())
        .args(&["x,1,2", "p,1", "g,1,2", "p,abc,val", "p,1,", "p,7,ok", "g,7"])
        .assert()
        .success()
        .stdout(eq("7,ok\n"))
        .stderr(
            contains("bad command 'x,1,2'")
                .and(contains("bad command 'p,1'"))
                .and(contains("bad command 'g,1,2'"))
                .and(contains("bad command 'p,abc,val'"))
                .and(contains("bad command 'p,1,'")),
        );
    assert_eq!(database(temp_dir.path()), "7,ok\n");
}

#[test]
fn cli_loads_until_malformed_line() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("database.txt"), "1,a\ngarbage\n2,b\n").unwrap();
    kv(temp_dir.path())
        .args(&["-q", "a"])
        .assert()
        .success()
        .stdout(eq("1,a\n"));
    assert_eq!(database(temp_dir.path()), "1,a\n");
}

#[test]
fn cli_db_option() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path())
        .args(&["--db", "other.txt", "p,1,a"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(temp_dir.path().join("other.txt")).unwrap(), "1,a\n");
    assert!(!temp_dir.path().join("database.txt").exists());

    kv(temp_dir.path())
        .env("KV_DATABASE", "other.txt")
        .arg("g,1")
        .assert()
        .success()
        .stdout(eq("1,a\n"));
}

#[test]
fn cli_leaves_no_temporary_files() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path()).args(&["p,1,a", "p,2,b", "d,1"]).assert().success();

    let files: Vec<_> = WalkDir::new(temp_dir.path())
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["database.txt"]);
}

#[test]
fn cli_keeps_non_utf8_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("database.txt");
    fs::write(&path, &b"1,caf\xe9\n2,b\n3,c\n"[..]).unwrap();
    kv(temp_dir.path())
        .arg("p,4,d")
        .assert()
        .success()
        .stderr(is_empty());
    assert_eq!(fs::read(&path).unwrap(), &b"1,caf\xe9\n2,b\n3,c\n4,d\n"[..]);
}

#[cfg(unix)]
#[test]
fn cli_saves_through_a_symlinked_database() {
    let temp_dir = TempDir::new().unwrap();
    let real = temp_dir.path().join("real.txt");
    let link = temp_dir.path().join("database.txt");
    fs::write(&real, "1,a\n").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    kv(temp_dir.path()).arg("p,2,b").assert().success();

    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&real).unwrap(), "1,a\n2,b\n");
}

#[test]
fn cli_unreadable_database_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("database.txt")).unwrap();
    kv(temp_dir.path())
        .arg("a")
        .assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("Error:"));
}

#[test]
fn cli_unwritable_database_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    kv(temp_dir.path())
        .args(&["--db", "missing/database.txt", "p,1,a", "g,1"])
        .assert()
        .failure()
        .stdout(eq("1,a\n"))
        .stderr(contains("Error:"));
}

// A fatal condition is reported on exactly one stderr line.
#[test]
fn cli_fatal_error_is_one_line() {
    let temp_dir = TempDir::new().unwrap();
    let output = kv(temp_dir.path())
        .args(&["--db", "missing/database.txt", "p,1,a"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().count(), 1, "stderr: {:?}", stderr);
    assert!(stderr.starts_with("Error: "));
}
