//! Generated bridge crate contents.

use cumulo_cli::extractor::bridge::{self, BridgeTarget};

fn target(name: &str, module_path: &[&str]) -> BridgeTarget {
    BridgeTarget {
        name: name.to_string(),
        module_path: module_path.iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn test_generated_main_is_valid_rust() {
    let targets = vec![
        target("data_bucket", &[]),
        target("execution_role", &["iam"]),
        target("env_name", &[]),
    ];
    let main = bridge::generate_main("my_stack", &targets).unwrap();
    let file = syn::parse_file(&main).unwrap();
    assert_eq!(file.items.len(), 1);
}

#[test]
fn test_generated_main_dispatches_every_name() {
    let targets = vec![target("data_bucket", &[]), target("execution_role", &[])];
    let main = bridge::generate_main("my_stack", &targets).unwrap();
    for t in &targets {
        assert!(main.contains(&format!("my_stack::{}()", t.name)));
    }
}

#[test]
fn test_module_nested_declarations_get_full_dispatch_paths() {
    let targets = vec![target("data_bucket", &["buckets"]), target("dns_record", &["net", "dns"])];
    let main = bridge::generate_main("my_stack", &targets).unwrap();
    assert!(main.contains("my_stack::buckets::data_bucket()"));
    assert!(main.contains("my_stack::net::dns::dns_record()"));
    assert!(syn::parse_file(&main).is_ok());
}

#[test]
fn test_hyphenated_package_resolves_to_underscore_ident() {
    let ident = bridge::crate_ident("payment-infra");
    let main = bridge::generate_main(&ident, &[target("api_gateway", &[])]).unwrap();
    assert!(main.contains("payment_infra::api_gateway()"));
    assert!(!main.contains("payment-infra"));
}

#[test]
fn test_manifest_is_parseable_and_detached() {
    let manifest = bridge::generate_manifest("payment-infra", "/pkg/payment-infra").unwrap();
    let parsed: toml::Table = toml::from_str(&manifest).unwrap();
    assert_eq!(parsed["package"]["name"].as_str(), Some("cumulo-bridge"));
    assert!(parsed["workspace"].as_table().unwrap().is_empty());
    assert_eq!(
        parsed["dependencies"]["payment-infra"]["path"].as_str(),
        Some("/pkg/payment-infra")
    );
}
