//! Bridge program generation.
//!
//! Declarations are arbitrary Rust expressions, so their concrete values
//! can only be observed by running them. The bridge is a minimal generated
//! crate that links against the target package and, for each requested
//! declaration, calls it directly - a compile-time dispatch table, since
//! only the compiler knows the package's internal layout - serializing the
//! results into one JSON object on stdout.

use anyhow::{Context, Result};
use quote::{format_ident, quote};
use std::path::Path;

use crate::core::CumuloError;
use crate::scanner::Declaration;

/// One declaration the bridge must evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTarget {
    /// Declaration function name, used as the output key.
    pub name: String,
    /// Module segments between the crate root and the function.
    pub module_path: Vec<String>,
}

impl From<&Declaration> for BridgeTarget {
    fn from(decl: &Declaration) -> Self {
        Self {
            name: decl.name.clone(),
            module_path: decl.module_path.clone(),
        }
    }
}

/// Read the target package's name from its Cargo.toml.
pub fn target_package_name(target_dir: &Path) -> Result<String> {
    let manifest_path = target_dir.join("Cargo.toml");
    let raw = std::fs::read_to_string(&manifest_path).map_err(|e| {
        CumuloError::TargetManifestError {
            path: manifest_path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let manifest: toml::Table =
        toml::from_str(&raw).map_err(|e| CumuloError::TargetManifestError {
            path: manifest_path.display().to_string(),
            reason: e.to_string(),
        })?;

    manifest
        .get("package")
        .and_then(|pkg| pkg.get("name"))
        .and_then(|name| name.as_str())
        .map(ToString::to_string)
        .ok_or_else(|| {
            CumuloError::TargetManifestError {
                path: manifest_path.display().to_string(),
                reason: "missing [package].name".to_string(),
            }
            .into()
        })
}

/// The crate identifier used in `use` paths: package name with `-` mapped
/// to `_`.
#[must_use]
pub fn crate_ident(package_name: &str) -> String {
    package_name.replace('-', "_")
}

/// Generate the bridge crate's `main.rs`.
///
/// One `insert` per requested declaration, referencing the target crate's
/// function statically through its full module path. Serialization failures
/// inside the bridge abort it with a message naming the declaration, which
/// surfaces as an extraction runtime error.
pub fn generate_main(crate_ident: &str, targets: &[BridgeTarget]) -> Result<String> {
    let krate = format_ident!("{}", crate_ident);
    let inserts = targets.iter().map(|target| {
        let func = format_ident!("{}", target.name);
        let modules = target.module_path.iter().map(|m| format_ident!("{}", m));
        let key = target.name.as_str();
        let panic_msg = format!("failed to serialize declaration '{}'", target.name);
        quote! {
            values.insert(
                #key.to_string(),
                serde_json::to_value(#krate::#(#modules::)*#func()).expect(#panic_msg),
            );
        }
    });

    let tokens = quote! {
        fn main() {
            let mut values = serde_json::Map::new();
            #(#inserts)*
            println!("{}", serde_json::Value::Object(values));
        }
    };

    let file: syn::File =
        syn::parse2(tokens).context("Generated bridge program is not valid Rust")?;
    Ok(prettyplease::unparse(&file))
}

/// Generate the bridge crate's `Cargo.toml`.
///
/// The empty `[workspace]` table detaches the bridge from any workspace the
/// target package (or the temp directory's parents) might belong to.
pub fn generate_manifest(target_package: &str, dependency_path: &str) -> Result<String> {
    let mut package = toml::Table::new();
    package.insert("name".to_string(), toml::Value::String("cumulo-bridge".to_string()));
    package.insert("version".to_string(), toml::Value::String("0.0.0".to_string()));
    package.insert("edition".to_string(), toml::Value::String("2021".to_string()));
    package.insert("publish".to_string(), toml::Value::Boolean(false));

    let mut target_dep = toml::Table::new();
    target_dep.insert("path".to_string(), toml::Value::String(dependency_path.to_string()));

    let mut dependencies = toml::Table::new();
    dependencies.insert(target_package.to_string(), toml::Value::Table(target_dep));
    dependencies.insert("serde_json".to_string(), toml::Value::String("1".to_string()));

    let mut manifest = toml::Table::new();
    manifest.insert("package".to_string(), toml::Value::Table(package));
    manifest.insert("workspace".to_string(), toml::Value::Table(toml::Table::new()));
    manifest.insert("dependencies".to_string(), toml::Value::Table(dependencies));

    toml::to_string(&manifest).context("Failed to serialize bridge manifest")
}
