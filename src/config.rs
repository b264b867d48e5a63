//! Scanner and assembler configuration.
//!
//! [`ScanConfig`] carries the allow-lists the static analysis needs: which
//! bare function names are intrinsics or pseudo-parameters (and therefore
//! never cross-declaration references), and how module names map to wire
//! service names when the derived spelling is irregular.
//!
//! The configuration is constructed once and passed explicitly into the
//! scanner, reference extractor, and assembler - there are no global lookup
//! tables, which keeps concurrent invocations with different configurations
//! independent and makes the classification heuristic testable in isolation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Intrinsic template functions that may appear as bare calls inside
/// declaration initializers without denoting another declaration.
const DEFAULT_INTRINSICS: &[&str] = &[
    "base64", "cidr", "find_in_map", "get_att", "import_value", "join", "select", "split", "sub",
    "transform", "if_value", "and", "equals", "not", "or", "ref_",
];

/// Pseudo-parameter accessors resolved by the template engine at deploy
/// time rather than by cumulo.
const DEFAULT_PSEUDO_PARAMETERS: &[&str] = &[
    "account_id",
    "notification_arns",
    "no_value",
    "partition",
    "region",
    "stack_id",
    "stack_name",
    "url_suffix",
];

/// Host-language value constructors that appear as bare calls or names
/// inside initializers without denoting another declaration.
const DEFAULT_HOST_CONSTRUCTORS: &[&str] = &["Some", "None", "Ok", "Err"];

/// Service-name spellings that the mechanical derivation gets wrong.
const DEFAULT_SERVICE_OVERRIDES: &[(&str, &str)] = &[
    ("apigateway", "ApiGateway"),
    ("apigatewayv2", "ApiGatewayV2"),
    ("autoscaling", "AutoScaling"),
    ("certificatemanager", "CertificateManager"),
    ("cloudformation", "CloudFormation"),
    ("cloudfront", "CloudFront"),
    ("cloudtrail", "CloudTrail"),
    ("cloudwatch", "CloudWatch"),
    ("codebuild", "CodeBuild"),
    ("codepipeline", "CodePipeline"),
    ("dynamodb", "DynamoDB"),
    ("elasticache", "ElastiCache"),
    ("elasticloadbalancingv2", "ElasticLoadBalancingV2"),
    ("eventbridge", "EventBridge"),
    ("route53", "Route53"),
    ("secretsmanager", "SecretsManager"),
    ("servicediscovery", "ServiceDiscovery"),
    ("stepfunctions", "StepFunctions"),
];

/// Allow-lists and naming overrides injected into the scanner, reference
/// extractor, and assembler.
///
/// The defaults cover the standard intrinsic surface; callers can extend
/// them when a target package has its own helper vocabulary:
///
/// ```rust
/// use cumulo_cli::config::ScanConfig;
///
/// let mut config = ScanConfig::default();
/// config.intrinsics.insert("tagged".to_string());
/// assert!(config.is_intrinsic("tagged"));
/// assert!(config.is_intrinsic("sub"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Bare function names treated as intrinsic template functions.
    pub intrinsics: BTreeSet<String>,
    /// Bare function names treated as pseudo-parameter accessors.
    pub pseudo_parameters: BTreeSet<String>,
    /// Bare names treated as host-language constructors (`Some`, `Ok`, ...).
    pub host_constructors: BTreeSet<String>,
    /// Module-name to wire-service-name overrides for resource types.
    pub service_overrides: BTreeMap<String, String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            intrinsics: DEFAULT_INTRINSICS.iter().map(|s| (*s).to_string()).collect(),
            pseudo_parameters: DEFAULT_PSEUDO_PARAMETERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            host_constructors: DEFAULT_HOST_CONSTRUCTORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            service_overrides: DEFAULT_SERVICE_OVERRIDES
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

impl ScanConfig {
    /// Whether a bare name is an intrinsic function or pseudo-parameter
    /// accessor and therefore never a cross-declaration reference.
    #[must_use]
    pub fn is_intrinsic(&self, name: &str) -> bool {
        self.intrinsics.contains(name) || self.pseudo_parameters.contains(name)
    }

    /// Whether a bare name is a host-language value constructor. `Some(x)`
    /// or `None` in an initializer wraps a field value; it never refers to
    /// another declaration.
    #[must_use]
    pub fn is_host_constructor(&self, name: &str) -> bool {
        self.host_constructors.contains(name)
    }

    /// Wire service name for a resource type's module segment.
    ///
    /// Uses the override table first; otherwise short or digit-bearing
    /// module names are uppercased (`s3` -> `S3`, `ec2` -> `EC2`) and longer
    /// ones get a capitalized first letter (`lambda` -> `Lambda`).
    #[must_use]
    pub fn service_name(&self, module: &str) -> String {
        if let Some(name) = self.service_overrides.get(module) {
            return name.clone();
        }
        if module.len() <= 3 || module.chars().any(|c| c.is_ascii_digit()) {
            return module.to_ascii_uppercase();
        }
        let mut chars = module.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intrinsics() {
        let config = ScanConfig::default();
        assert!(config.is_intrinsic("sub"));
        assert!(config.is_intrinsic("join"));
        assert!(config.is_intrinsic("ref_"));
        assert!(config.is_intrinsic("account_id"));
        assert!(!config.is_intrinsic("data_bucket"));
    }

    #[test]
    fn test_default_host_constructors() {
        let config = ScanConfig::default();
        assert!(config.is_host_constructor("Some"));
        assert!(config.is_host_constructor("None"));
        assert!(config.is_host_constructor("Ok"));
        assert!(config.is_host_constructor("Err"));
        assert!(!config.is_host_constructor("DataBucket"));
    }

    #[test]
    fn test_service_name_short_modules_uppercase() {
        let config = ScanConfig::default();
        assert_eq!(config.service_name("s3"), "S3");
        assert_eq!(config.service_name("iam"), "IAM");
        assert_eq!(config.service_name("ec2"), "EC2");
        assert_eq!(config.service_name("sns"), "SNS");
    }

    #[test]
    fn test_service_name_plain_capitalization() {
        let config = ScanConfig::default();
        assert_eq!(config.service_name("lambda"), "Lambda");
        assert_eq!(config.service_name("events"), "Events");
        assert_eq!(config.service_name("logs"), "Logs");
    }

    #[test]
    fn test_service_name_overrides() {
        let config = ScanConfig::default();
        assert_eq!(config.service_name("dynamodb"), "DynamoDB");
        assert_eq!(config.service_name("apigateway"), "ApiGateway");
        assert_eq!(config.service_name("stepfunctions"), "StepFunctions");
    }

    #[test]
    fn test_custom_intrinsics_extend_defaults() {
        let mut config = ScanConfig::default();
        config.intrinsics.insert("tagged".to_string());
        assert!(config.is_intrinsic("tagged"));
        assert!(config.is_intrinsic("sub"));
    }
}
