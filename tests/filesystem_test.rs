//! Tests for the real FileSystem implementation

use std::fs;
use std::io::Write;

use tempfile::TempDir;

use division::infrastructure::traits::{FileSystem, RealFileSystem};

#[test]
fn given_nested_output_path_when_ensure_parent_then_creates_directories() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("a").join("b").join("division.sql");
    let fs = RealFileSystem;

    // Act
    fs.ensure_parent(&target).unwrap();

    // Assert
    assert!(target.parent().unwrap().is_dir());
    assert!(!target.exists());
}

#[test]
fn given_bare_file_name_when_ensure_parent_then_is_noop() {
    let fs = RealFileSystem;

    assert!(fs.ensure_parent(std::path::Path::new("division.sql")).is_ok());
}

#[test]
fn given_staged_file_when_committed_then_replaces_target() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("out.sql");
    fs::write(&target, "stale content that is longer").unwrap();
    let real = RealFileSystem;

    let mut staged = real.stage(&target).unwrap();
    staged.write_all(b"fresh\n").unwrap();
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "stale content that is longer"
    );
    staged.commit().unwrap();

    assert_eq!(real.read_to_string(&target).unwrap(), "fresh\n");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn given_staged_file_when_dropped_without_commit_then_target_untouched() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("out.sql");
    let real = RealFileSystem;

    {
        let mut staged = real.stage(&target).unwrap();
        staged.write_all(b"partial\n").unwrap();
        staged.flush().unwrap();
    }

    assert!(!real.exists(&target));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn given_missing_file_when_reading_then_not_found() {
    let temp = TempDir::new().unwrap();

    let err = RealFileSystem
        .read_to_string(&temp.path().join("missing.json"))
        .unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
