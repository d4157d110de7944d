//! E2E tests for `itf paths`.

mod common;

use common::cli::run_itf;
use common::test_log;
use std::path::PathBuf;
use tempfile::TempDir;

fn paths(root: &std::path::Path, case: &str, extra: &[&str]) -> serde_json::Value {
    let mut args = vec![
        "--project-dir".to_string(),
        root.display().to_string(),
        "--json".to_string(),
        "paths".to_string(),
        "--suite".to_string(),
        "com.example.BasicIT".to_string(),
        "--case".to_string(),
        case.to_string(),
    ];
    args.extend(extra.iter().map(|s| (*s).to_string()));
    let run = run_itf(root, args);
    assert_eq!(run.code(), Some(0), "stderr: {}", run.stderr);
    run.json()
}

#[test]
fn e2e_paths_per_case_layout_without_creating() {
    let _log = test_log("e2e_paths_per_case_layout_without_creating");
    let temp = TempDir::new().expect("temp dir");
    let json = paths(temp.path(), "first", &[]);

    let base = temp.path().join("target/maven-it/com/example/BasicIT");
    assert_eq!(PathBuf::from(json["base_dir"].as_str().unwrap()), base);
    assert_eq!(
        PathBuf::from(json["project_dir"].as_str().unwrap()),
        base.join("first/project")
    );
    assert_eq!(
        PathBuf::from(json["cache_dir"].as_str().unwrap()),
        base.join("first/.m2/repository")
    );
    assert_eq!(json["cache_mode"], "per-case");
    assert_eq!(json["created"], false);
    assert!(!base.exists());
}

#[test]
fn e2e_paths_shared_cache_is_identical_across_cases() {
    let _log = test_log("e2e_paths_shared_cache_is_identical_across_cases");
    let temp = TempDir::new().expect("temp dir");
    let first = paths(temp.path(), "first", &["--cache-mode", "shared", "--create"]);
    let second = paths(temp.path(), "second", &["--cache-mode", "shared", "--create"]);

    assert_eq!(first["cache_dir"], second["cache_dir"]);
    assert_ne!(first["project_dir"], second["project_dir"]);
    assert!(PathBuf::from(first["cache_dir"].as_str().unwrap()).is_dir());
    assert!(PathBuf::from(second["project_dir"].as_str().unwrap()).is_dir());
}

#[test]
fn e2e_paths_rejects_path_like_case_names() {
    let _log = test_log("e2e_paths_rejects_path_like_case_names");
    let temp = TempDir::new().expect("temp dir");
    let run = run_itf(
        temp.path(),
        ["paths", "--suite", "com.example.BasicIT", "--case", "../escape"],
    );
    assert_eq!(run.code(), Some(2));
    assert_eq!(run.error_json()["error"]["code"], "INVALID_IDENTITY");
}
