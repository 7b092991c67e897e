use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;

use crate::error::ShimError;
use crate::operation::catalog::{available_services, get_catalog};
use crate::operation::{Impact, OperationDescriptor};

/// Parse an env var reference in `${VAR}` form.
///
/// Returns the variable name if the value is a valid reference, `None` otherwise.
pub fn parse_env_ref(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|s| s.strip_suffix('}'))
}

/// Resolve a map of env-var references to their actual values.
///
/// Each value must be `${VAR}`. Unknown variables resolve to the empty
/// string (same as shell `${UNSET-}`).
pub fn resolve_env_vars(env: &HashMap<String, String>) -> HashMap<String, String> {
    env.iter()
        .map(|(k, v)| {
            let resolved = match parse_env_ref(v) {
                Some(var_name) => std::env::var(var_name).unwrap_or_default(),
                None => v.clone(), // caught by validate(), but handle gracefully
            };
            (k.clone(), resolved)
        })
        .collect()
}

/// Top-level awsop configuration, parsed from TOML.
///
/// Every section is optional; an empty file is the built-in default setup.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsopConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Mutating operations at or above this impact ask for confirmation
    #[serde(default = "default_confirm_impact")]
    pub confirm_impact: Impact,
    /// Built-in catalogs to load
    #[serde(default = "default_services")]
    pub services: Vec<String>,
    /// Extra operations declared by the user, keyed by a free-form label
    #[serde(default)]
    pub operations: BTreeMap<String, OperationDescriptor>,
}

impl Default for AwsopConfig {
    fn default() -> Self {
        AwsopConfig {
            backend: BackendConfig::default(),
            confirm_impact: default_confirm_impact(),
            services: default_services(),
            operations: BTreeMap::new(),
        }
    }
}

fn default_confirm_impact() -> Impact {
    Impact::Medium
}

fn default_services() -> Vec<String> {
    available_services().into_iter().map(String::from).collect()
}

fn default_command() -> String {
    "aws".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// How remote calls are made.
///
/// Calls run the `aws` executable via `tokio::process::Command` (never a
/// shell) with timeout-kill semantics.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// The executable to run.
    #[serde(default = "default_command")]
    pub command: String,
    /// Default region; `-Region` overrides per call.
    pub region: Option<String>,
    /// Default named profile; `-ProfileName` overrides per call.
    pub profile: Option<String>,
    /// Default endpoint; `-EndpointUrl` overrides per call.
    pub endpoint_url: Option<String>,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Flags appended to every call (e.g. ["--no-verify-ssl"]).
    #[serde(default)]
    pub inject_flags: Vec<String>,
    /// Env var references (`${VAR}`), resolved when the client is built.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            command: default_command(),
            region: None,
            profile: None,
            endpoint_url: None,
            timeout_secs: default_timeout_secs(),
            inject_flags: Vec::new(),
            env: HashMap::new(),
        }
    }
}

impl AwsopConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| ShimError::InvalidConfig("config".to_string(), e.to_string()))
    }

    /// Validate the config, failing fast before any registry is built.
    pub fn validate(&self) -> crate::Result<()> {
        let backend_err = |msg: String| ShimError::InvalidConfig("backend".to_string(), msg);

        // 1. Backend
        if self.backend.command.trim().is_empty() {
            return Err(backend_err("'command' must not be empty".to_string()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(backend_err("'timeout_secs' must be > 0".to_string()));
        }

        // 2. Env var references: must be ${VAR}
        for (key, value) in &self.backend.env {
            if parse_env_ref(value).is_none() {
                return Err(backend_err(format!(
                    "env value for key '{}' must be a ${{VAR}} reference, got '{}'",
                    key, value
                )));
            }
        }

        // 3. Services must be known and listed once
        let mut seen: HashSet<&str> = HashSet::new();
        for service in &self.services {
            if get_catalog(service).is_none() {
                return Err(ShimError::InvalidConfig(
                    "services".to_string(),
                    format!(
                        "unknown service '{}' (available: {})",
                        service,
                        available_services().join(", ")
                    ),
                ));
            }
            if !seen.insert(service.as_str()) {
                return Err(ShimError::InvalidConfig(
                    "services".to_string(),
                    format!("service '{}' listed more than once", service),
                ));
            }
        }

        // 4. User operations
        for (label, desc) in &self.operations {
            desc.clone().normalize().validate().map_err(|e| match e {
                ShimError::InvalidConfig(_, msg) => {
                    ShimError::InvalidConfig(format!("operations.{}", label), msg)
                }
                other => other,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_toml(toml_str: &str) -> AwsopConfig {
        toml::from_str(toml_str).expect("valid TOML")
    }

    #[test]
    fn test_parse_env_ref() {
        assert_eq!(parse_env_ref("${FOO}"), Some("FOO"));
        assert_eq!(parse_env_ref("${AWS_PROFILE}"), Some("AWS_PROFILE"));
        assert_eq!(parse_env_ref("$FOO"), None);
        assert_eq!(parse_env_ref("literal"), None);
        assert_eq!(parse_env_ref("${"), None);
        assert_eq!(parse_env_ref("${}"), Some(""));
    }

    #[test]
    fn test_resolve_env_vars() {
        // SAFETY: test-only, no concurrent threads depend on this env var.
        unsafe { std::env::set_var("AWSOP_TEST_VAR", "resolved_value") };
        let mut env = HashMap::new();
        env.insert("KEY".to_string(), "${AWSOP_TEST_VAR}".to_string());
        env.insert("UNSET".to_string(), "${AWSOP_TEST_VAR_NOT_SET}".to_string());
        let resolved = resolve_env_vars(&env);
        assert_eq!(resolved.get("KEY").unwrap(), "resolved_value");
        assert_eq!(resolved.get("UNSET").unwrap(), "");
        // SAFETY: test-only cleanup.
        unsafe { std::env::remove_var("AWSOP_TEST_VAR") };
    }

    #[test]
    fn test_empty_config_is_defaults() {
        let config = parse_toml("");
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.command, "aws");
        assert_eq!(config.backend.timeout_secs, 60);
        assert_eq!(config.confirm_impact, Impact::Medium);
        assert_eq!(config.services, vec!["ram", "ssm-incidents"]);
        assert!(config.operations.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = parse_toml(
            r#"
            confirm_impact = "high"
            services = ["ram"]

            [backend]
            command = "/usr/local/bin/aws"
            region = "eu-central-1"
            profile = "ops"
            timeout_secs = 15
            inject_flags = ["--no-verify-ssl"]

            [backend.env]
            AWS_CONFIG_FILE = "${OPS_AWS_CONFIG}"
            "#,
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.confirm_impact, Impact::High);
        assert_eq!(config.backend.region.as_deref(), Some("eu-central-1"));
        assert_eq!(config.backend.inject_flags, vec!["--no-verify-ssl"]);
    }

    #[test]
    fn test_unknown_service_rejected() {
        let config = parse_toml(r#"services = ["ram", "ec2"]"#);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ShimError::InvalidConfig(ref s, ref msg) if s == "services" && msg.contains("ec2")));
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let config = parse_toml(r#"services = ["ram", "ram"]"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_literal_env_value_rejected() {
        let config = parse_toml(
            r#"
            [backend.env]
            AWS_PROFILE = "prod"
            "#,
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("${VAR} reference"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = parse_toml(
            r#"
            [backend]
            timeout_secs = 0
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_user_operation_parsed() {
        let config = parse_toml(
            r#"
            [operations.quotas]
            service = "ram"
            operation = "ListResources"
            command = "Get-RAMSharedResource"
            default_selector = "resources"
            response_fields = ["resources", "nextToken"]

            [[operations.quotas.params]]
            name = "ResourceOwner"
            kind = "string"
            required = true
            position = 0

            [operations.quotas.pagination]
            items_field = "resources"
            service_max = 500
            "#,
        );
        assert!(config.validate().is_ok());
        let desc = config.operations["quotas"].clone().normalize();
        assert!(desc.param("NextToken").is_some());
        assert!(desc.param("MaxResult").is_some());
        assert_eq!(desc.param("ResourceOwner").unwrap().wire_path(), "resourceOwner");
    }

    #[test]
    fn test_bad_user_operation_names_label() {
        let config = parse_toml(
            r#"
            [operations.broken]
            service = "ram"
            operation = "ListResources"
            command = "ListResources"
            "#,
        );
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ShimError::InvalidConfig(ref s, _) if s == "operations.broken"));
    }

    #[test]
    fn test_user_pagination_without_items_field_rejected() {
        let config = parse_toml(
            r#"
            [operations.x]
            service = "ram"
            operation = "ListResources"
            command = "Get-RAMSharedResource"

            [operations.x.pagination]
            service_max = 500
            "#,
        );
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ShimError::InvalidConfig(ref s, ref msg) if s == "operations.x" && msg.contains("items_field"))
        );
    }

    #[test]
    fn test_from_toml_reports_parse_errors() {
        let err = AwsopConfig::from_toml("confirm_impact = \"extreme\"").unwrap_err();
        assert!(matches!(err, ShimError::InvalidConfig(ref s, _) if s == "config"));
    }
}
