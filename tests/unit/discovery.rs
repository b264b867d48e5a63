//! Discovery over realistic multi-file packages.

use cumulo_cli::config::ScanConfig;
use cumulo_cli::core::CumuloError;
use cumulo_cli::pipeline::discover;
use cumulo_cli::scanner::DeclarationKind;
use std::fs;
use tempfile::TempDir;

fn package(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    for (name, source) in files {
        fs::write(dir.path().join("src").join(name), source).unwrap();
    }
    dir
}

#[test]
fn test_all_five_kinds_classified() {
    let dir = package(&[(
        "stack.rs",
        r#"
        pub fn data_bucket() -> s3::Bucket { s3::Bucket {} }
        pub fn env_name() -> Parameter { Parameter { default: "dev" } }
        pub fn bucket_arn() -> Output { Output { value: data_bucket() } }
        pub fn region_table() -> Mapping { Mapping {} }
        pub fn is_prod() -> Condition { Condition {} }
        "#,
    )]);

    let graph = discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap();
    assert_eq!(graph.len(), 5);
    assert_eq!(graph.get("data_bucket").unwrap().kind, DeclarationKind::Resource);
    assert_eq!(graph.get("env_name").unwrap().kind, DeclarationKind::Parameter);
    assert_eq!(graph.get("bucket_arn").unwrap().kind, DeclarationKind::Output);
    assert_eq!(graph.get("region_table").unwrap().kind, DeclarationKind::Mapping);
    assert_eq!(graph.get("is_prod").unwrap().kind, DeclarationKind::Condition);
    assert!(!graph.has_errors());
}

#[test]
fn test_duplicate_across_files_is_one_diagnostic() {
    let dir = package(&[
        ("a.rs", "pub fn data_bucket() -> s3::Bucket { s3::Bucket {} }"),
        ("b.rs", "pub fn data_bucket() -> s3::Bucket { s3::Bucket {} }"),
    ]);

    let graph = discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap();
    let duplicates: Vec<_> = graph
        .diagnostics
        .iter()
        .filter(|d| matches!(d, CumuloError::DuplicateDeclaration { .. }))
        .collect();
    assert_eq!(duplicates.len(), 1);
}

#[test]
fn test_parse_error_does_not_abort_sibling_files() {
    let dir = package(&[
        ("broken.rs", "pub fn data_bucket( -> s3::Bucket {"),
        ("good.rs", "pub fn execution_role() -> iam::Role { iam::Role {} }"),
    ]);

    let graph = discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap();
    assert!(graph.failed);
    assert!(graph.contains("execution_role"));
    assert!(graph
        .diagnostics
        .iter()
        .any(|d| matches!(d, CumuloError::ParseError { .. })));
}

#[test]
fn test_local_helpers_are_not_undefined_references() {
    let dir = package(&[(
        "stack.rs",
        r#"
        fn default_tags() -> Tags { Tags {} }
        pub fn data_bucket() -> s3::Bucket {
            s3::Bucket { tags: default_tags() }
        }
        "#,
    )]);

    let graph = discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap();
    assert!(!graph.has_errors());
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_intrinsic_calls_never_become_edges() {
    let dir = package(&[(
        "stack.rs",
        r#"
        pub fn bucket_arn() -> Output {
            Output { value: sub("arn:${AWS::Region}:thing") }
        }
        "#,
    )]);

    let graph = discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap();
    assert!(!graph.has_errors());
    assert!(graph.edges.is_empty());
}

#[test]
fn test_non_recursive_scan_skips_nested_directories() {
    let dir = package(&[("lib.rs", "pub fn data_bucket() -> s3::Bucket { s3::Bucket {} }")]);
    fs::create_dir_all(dir.path().join("src/nested")).unwrap();
    fs::write(
        dir.path().join("src/nested/extra.rs"),
        "pub fn extra_bucket() -> s3::Bucket { s3::Bucket {} }",
    )
    .unwrap();

    let flat = discover(&[dir.path().to_path_buf()], false, &ScanConfig::default()).unwrap();
    assert_eq!(flat.len(), 1);

    let deep = discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap();
    assert_eq!(deep.len(), 2);
}

#[test]
fn test_leftover_bridge_workspaces_are_ignored() {
    let dir = package(&[("lib.rs", "pub fn data_bucket() -> s3::Bucket { s3::Bucket {} }")]);
    fs::create_dir_all(dir.path().join("src/cumulo-bridge-stale")).unwrap();
    fs::write(
        dir.path().join("src/cumulo-bridge-stale/main.rs"),
        "pub fn stale_decl() -> s3::Bucket { s3::Bucket {} }",
    )
    .unwrap();

    let graph = discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap();
    assert_eq!(graph.len(), 1);
    assert!(!graph.contains("stale_decl"));
}
