//! End-to-end assembly against injected extracted values.
//!
//! Extraction is the only stage that needs a subprocess; everything on
//! either side of it runs here against values built by hand, exactly as
//! the bridge program would have produced them.

use cumulo_cli::assembler::assemble;
use cumulo_cli::config::ScanConfig;
use cumulo_cli::graph::resolve::resolve_all;
use cumulo_cli::graph::DeclarationGraph;
use cumulo_cli::pipeline::discover;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

fn graph_of(source: &str) -> DeclarationGraph {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), source).unwrap();
    discover(&[dir.path().to_path_buf()], true, &ScanConfig::default()).unwrap()
}

#[test]
fn test_full_document_with_all_sections() {
    let graph = graph_of(
        r#"
        pub fn env_name() -> Parameter { Parameter { default: "dev" } }
        pub fn execution_role() -> iam::Role { iam::Role {} }
        pub fn handler() -> lambda::Function {
            lambda::Function { role: execution_role().arn() }
        }
        pub fn handler_arn() -> Output { Output { value: handler() } }
        "#,
    );
    assert!(!graph.has_errors());

    let mut values = BTreeMap::new();
    values.insert("env_name".to_string(), json!({"Type": "String", "Default": "dev"}));
    values.insert("execution_role".to_string(), json!({"RoleName": "exec"}));
    values.insert("handler".to_string(), json!({"Role": "", "Runtime": "provided"}));
    values.insert("handler_arn".to_string(), json!({"Value": {"Role": "", "Runtime": "provided"}}));

    let resolved = resolve_all(&graph);
    let document =
        assemble(&graph, &resolved, values, &ScanConfig::default(), Some("demo".to_string()))
            .unwrap();

    let rendered: Value = serde_json::from_str(&serde_json::to_string(&document).unwrap()).unwrap();
    assert_eq!(rendered["Description"], json!("demo"));
    assert_eq!(rendered["Parameters"]["EnvName"]["Default"], json!("dev"));
    assert_eq!(
        rendered["Resources"]["Handler"],
        json!({
            "Type": "AWS::Lambda::Function",
            "Properties": {
                "Role": {"Fn::GetAtt": ["ExecutionRole", "Arn"]},
                "Runtime": "provided",
            }
        })
    );
    // The output's whole-value reference collapses to a Ref, replacing the
    // chained attribute substitution at the shorter path.
    assert_eq!(rendered["Outputs"]["HandlerArn"]["Value"], json!({"Ref": "Handler"}));
    // No Mappings or Conditions were declared, so the keys are absent.
    assert!(rendered.get("Mappings").is_none());
    assert!(rendered.get("Conditions").is_none());
}

#[test]
fn test_nested_path_substitution_survives_serialization() {
    let graph = graph_of(
        r"
        pub fn execution_role() -> iam::Role { iam::Role {} }
        pub fn handler() -> lambda::Function {
            lambda::Function {
                config: app::Config { roles: vec![execution_role().arn()] },
            }
        }
        ",
    );

    let mut values = BTreeMap::new();
    values.insert("execution_role".to_string(), json!({}));
    values.insert("handler".to_string(), json!({"Config": {"Roles": ["stale"]}}));

    let resolved = resolve_all(&graph);
    let document =
        assemble(&graph, &resolved, values, &ScanConfig::default(), None).unwrap();
    let rendered: Value = serde_json::to_value(&document).unwrap();
    assert_eq!(
        rendered["Resources"]["Handler"]["Properties"]["Config"]["Roles"][0],
        json!({"Fn::GetAtt": ["ExecutionRole", "Arn"]})
    );
}

#[test]
fn test_assembly_output_is_deterministic() {
    let source = r"
        pub fn data_bucket() -> s3::Bucket { s3::Bucket {} }
        pub fn backup_bucket() -> s3::Bucket { s3::Bucket {} }
        ";
    let render = || {
        let graph = graph_of(source);
        let mut values = BTreeMap::new();
        values.insert("data_bucket".to_string(), json!({"BucketName": "data"}));
        values.insert("backup_bucket".to_string(), json!({"BucketName": "backup"}));
        let resolved = resolve_all(&graph);
        let document =
            assemble(&graph, &resolved, values, &ScanConfig::default(), None).unwrap();
        serde_json::to_string(&document).unwrap()
    };
    assert_eq!(render(), render());
}
