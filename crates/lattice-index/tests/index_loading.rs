//! Loading indexes from disk.
//!
//! The happy path plus every load-time rejection: unreadable files,
//! malformed JSON, and structurally invalid graphs.

use std::fs;

use lattice_index::{IndexError, TypeIndex};
use tempfile::TempDir;

const VALID_INDEX: &str = r#"{
    "types": [
        {
            "name": "Animal", "kind": 5,
            "uri": "file:///zoo/animals.rs",
            "range": {"start": {"line": 0, "character": 0}, "end": {"line": 3, "character": 1}},
            "selectionRange": {"start": {"line": 0, "character": 7}, "end": {"line": 0, "character": 13}}
        },
        {
            "name": "Dog", "kind": 5,
            "uri": "file:///zoo/animals.rs",
            "range": {"start": {"line": 5, "character": 0}, "end": {"line": 8, "character": 1}},
            "selectionRange": {"start": {"line": 5, "character": 7}, "end": {"line": 5, "character": 10}}
        }
    ],
    "extends": [["Dog", "Animal"]]
}"#;

/// Create a temporary directory holding the given index files.
fn index_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("should create temp dir");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("should write index file");
    }
    dir
}

#[tokio::test]
async fn loads_a_valid_index_file() {
    let dir = index_dir(&[("types.json", VALID_INDEX)]);

    let index = TypeIndex::from_path(dir.path().join("types.json"))
        .await
        .expect("valid index should load");
    assert_eq!(index.len(), 2);
    let parents = index.supertypes_of("Dog").expect("Dog is indexed");
    assert_eq!(parents[0].name, "Animal");
}

#[tokio::test]
async fn missing_files_are_io_errors() {
    let dir = index_dir(&[]);

    let error = TypeIndex::from_path(dir.path().join("absent.json"))
        .await
        .expect_err("a missing file must fail");
    assert!(matches!(error, IndexError::Io(_)));
}

#[tokio::test]
async fn malformed_json_is_a_json_error() {
    let dir = index_dir(&[("broken.json", "{ this is not json")]);

    let error = TypeIndex::from_path(dir.path().join("broken.json"))
        .await
        .expect_err("malformed JSON must fail");
    assert!(matches!(error, IndexError::Json(_)));
}

#[tokio::test]
async fn wrong_shape_is_a_json_error() {
    let dir = index_dir(&[("shape.json", r#"{"types": "not a list"}"#)]);

    let error = TypeIndex::from_path(dir.path().join("shape.json"))
        .await
        .expect_err("a mistyped field must fail");
    assert!(matches!(error, IndexError::Json(_)));
}

#[tokio::test]
async fn structurally_invalid_graphs_are_rejected_on_load() {
    let duplicated = VALID_INDEX.replace("\"Dog\"", "\"Animal\"");
    let dir = index_dir(&[("dup.json", &duplicated)]);

    let error = TypeIndex::from_path(dir.path().join("dup.json"))
        .await
        .expect_err("duplicate names must fail");
    assert!(matches!(error, IndexError::DuplicateType(name) if name == "Animal"));
}
