//! Integration tests for the job workspace lifecycle

use geoclip_core::workspace::JobWorkspace;
use geoclip_core::GeoclipError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_create_and_close_removes_everything() {
    let root = TempDir::new().unwrap();
    let workspace = JobWorkspace::create(root.path(), "abc").unwrap();
    let path = workspace.path().to_path_buf();

    fs::create_dir_all(workspace.extracted_dir().join("nested")).unwrap();
    fs::write(workspace.preview(), b"png").unwrap();
    assert!(path.is_dir());

    let warning = workspace.close();

    assert!(warning.is_none());
    assert!(!path.exists());
}

#[test]
fn test_duplicate_request_id_is_a_conflict() {
    let root = TempDir::new().unwrap();
    let first = JobWorkspace::create(root.path(), "dup").unwrap();

    let err = JobWorkspace::create(root.path(), "dup").unwrap_err();
    assert!(matches!(err, GeoclipError::Conflict { .. }));

    // The rejected attempt must not have touched the running job's files
    assert!(first.path().is_dir());
    assert!(first.close().is_none());
}

#[test]
fn test_drop_without_close_still_cleans_up() {
    let root = TempDir::new().unwrap();
    let path = {
        let workspace = JobWorkspace::create(root.path(), "early-exit").unwrap();
        fs::write(workspace.input_raster(), b"tif").unwrap();
        workspace.path().to_path_buf()
    };

    assert!(!path.exists());
}

#[test]
fn test_close_after_external_removal_is_silent() {
    let root = TempDir::new().unwrap();
    let workspace = JobWorkspace::create(root.path(), "gone").unwrap();
    fs::remove_dir_all(workspace.path()).unwrap();

    assert!(workspace.close().is_none());
}

#[test]
fn test_missing_work_root_is_created() {
    let root = TempDir::new().unwrap();
    let nested = root.path().join("a").join("b");

    let workspace = JobWorkspace::create(&nested, "x1").unwrap();

    assert!(workspace.path().starts_with(&nested));
    assert!(workspace.close().is_none());
}

#[test]
fn test_invalid_request_id_is_input_error() {
    let root = TempDir::new().unwrap();
    let err = JobWorkspace::create(root.path(), "../escape").unwrap_err();

    assert!(matches!(err, GeoclipError::Input { .. }));
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}
