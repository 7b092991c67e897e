//! Declarative operation descriptors.
//!
//! One `OperationDescriptor` fully describes a remote operation as a command:
//! its name, typed parameters, default output selector, pagination fields and
//! impact level. The shim is generic over descriptors; nothing in the
//! dispatch path is specific to a single operation.

pub mod catalog;
pub mod verb;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ShimError;

pub use verb::{camel_case, classify_operation, kebab_case};

/// Parameter name carrying the caller's continuation token.
pub const PARAM_NEXT_TOKEN: &str = "NextToken";
/// Parameter name carrying the caller's page-size / emit limit.
pub const PARAM_MAX_RESULT: &str = "MaxResult";
/// Default idempotency parameter name.
pub const PARAM_CLIENT_TOKEN: &str = "ClientToken";

/// How destructive an operation is. Ordered: `None < Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    None,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Impact::None => "none",
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        };
        f.write_str(s)
    }
}

/// The value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    StringList,
    /// String-to-string map, bound from `key=value` pairs
    Map,
    /// RFC 3339 timestamp
    Timestamp,
    /// Arbitrary nested structure, bound from a JSON document
    Json,
}

impl ParamKind {
    /// JSON Schema fragment for this kind.
    pub fn json_schema(&self) -> serde_json::Value {
        match self {
            ParamKind::String => serde_json::json!({ "type": "string" }),
            ParamKind::Integer => serde_json::json!({ "type": "integer" }),
            ParamKind::Boolean => serde_json::json!({ "type": "boolean" }),
            ParamKind::StringList => {
                serde_json::json!({ "type": "array", "items": { "type": "string" } })
            }
            ParamKind::Map => serde_json::json!({
                "type": "object",
                "additionalProperties": { "type": "string" }
            }),
            ParamKind::Timestamp => {
                serde_json::json!({ "type": "string", "format": "date-time" })
            }
            ParamKind::Json => serde_json::json!({}),
        }
    }
}

/// A single typed parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Command-facing name, PascalCase (e.g. `ResourceShareArn`)
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    /// Dotted request path. Defaults to the camelCase form of `name`.
    #[serde(default)]
    pub wire: Option<String>,
    /// Positional slot on the command line, if any.
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn new(name: &str, kind: ParamKind) -> Self {
        ParamSpec {
            name: name.to_string(),
            kind,
            required: false,
            wire: None,
            position: None,
            description: None,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, ParamKind::String)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    pub fn list(name: &str) -> Self {
        Self::new(name, ParamKind::StringList)
    }

    pub fn map(name: &str) -> Self {
        Self::new(name, ParamKind::Map)
    }

    pub fn timestamp(name: &str) -> Self {
        Self::new(name, ParamKind::Timestamp)
    }

    pub fn json(name: &str) -> Self {
        Self::new(name, ParamKind::Json)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn wire(mut self, path: &str) -> Self {
        self.wire = Some(path.to_string());
        self
    }

    pub fn position(mut self, slot: usize) -> Self {
        self.position = Some(slot);
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    /// The request path this parameter is written to.
    pub fn wire_path(&self) -> String {
        self.wire.clone().unwrap_or_else(|| camel_case(&self.name))
    }

    /// Whether a user-typed name refers to this parameter.
    ///
    /// Matching ignores case, dashes and underscores, so `ResourceShareArn`,
    /// `resource-share-arn` and `resource_share_arn` all match.
    pub fn matches(&self, raw: &str) -> bool {
        normalize_name(&self.name) == normalize_name(raw)
    }
}

/// Lowercase and strip `-`/`_` for loose name comparison.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn default_token_field() -> String {
    "nextToken".to_string()
}

fn default_page_size_field() -> Option<String> {
    Some("maxResults".to_string())
}

/// Continuation-token fields of a list operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationSpec {
    /// Request member receiving the token
    #[serde(default = "default_token_field")]
    pub input_token: String,
    /// Response member carrying the next token
    #[serde(default = "default_token_field")]
    pub output_token: String,
    /// Request member receiving the page size, if the service has one
    #[serde(default = "default_page_size_field")]
    pub page_size: Option<String>,
    /// Response member holding the page's items (used to count toward a limit)
    #[serde(default)]
    pub items_field: Option<String>,
    /// Largest page the service accepts
    #[serde(default)]
    pub service_max: Option<u32>,
}

impl Default for PaginationSpec {
    fn default() -> Self {
        PaginationSpec {
            input_token: default_token_field(),
            output_token: default_token_field(),
            page_size: default_page_size_field(),
            items_field: None,
            service_max: None,
        }
    }
}

fn default_selector() -> String {
    "*".to_string()
}

/// Full description of one remote operation exposed as a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// `aws` CLI service name (e.g. `ram`, `ssm-incidents`)
    pub service: String,
    /// API operation name, PascalCase (e.g. `GetResourceShares`)
    pub operation: String,
    /// Command name (e.g. `Get-RAMResourceShare`)
    pub command: String,
    /// Explicit impact; derived from the operation verb when absent
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// Selector used when the caller gives none
    #[serde(default = "default_selector")]
    pub default_selector: String,
    /// Top-level response members; when non-empty, field selectors are checked against it
    #[serde(default)]
    pub response_fields: Vec<String>,
    #[serde(default)]
    pub pagination: Option<PaginationSpec>,
    /// Parameter carrying the client idempotency token
    #[serde(default)]
    pub idempotency_param: Option<String>,
    /// Parameter echoed by `PassThru`
    #[serde(default)]
    pub echo_param: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
}

impl OperationDescriptor {
    /// Impact level, explicit or derived from the operation verb.
    pub fn impact(&self) -> Impact {
        self.impact
            .unwrap_or_else(|| classify_operation(&self.operation))
    }

    pub fn is_mutating(&self) -> bool {
        self.impact() > Impact::None
    }

    /// `aws` CLI operation name (e.g. `get-resource-shares`).
    pub fn cli_operation(&self) -> String {
        kebab_case(&self.operation)
    }

    /// `service:cli-operation` alias (e.g. `ram:get-resource-shares`).
    pub fn alias(&self) -> String {
        format!("{}:{}", self.service, self.cli_operation())
    }

    /// Look up a parameter by a user-typed name.
    pub fn param(&self, raw: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.matches(raw))
    }

    /// Parameter bound to the given positional slot.
    pub fn positional(&self, slot: usize) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.position == Some(slot))
    }

    /// Add implied parameters: `NextToken`/`MaxResult` for paginated
    /// operations and the idempotency parameter when declared.
    pub fn normalize(mut self) -> Self {
        if let Some(pagination) = self.pagination.clone() {
            if self.param(PARAM_NEXT_TOKEN).is_none() {
                self.params.push(
                    ParamSpec::string(PARAM_NEXT_TOKEN)
                        .wire(&pagination.input_token)
                        .describe("Continuation token from a previous page; disables auto-iteration"),
                );
            }
            if let Some(page_size) = &pagination.page_size {
                if self.param(PARAM_MAX_RESULT).is_none() {
                    self.params.push(
                        ParamSpec::integer(PARAM_MAX_RESULT)
                            .wire(page_size)
                            .describe("Maximum number of items to return"),
                    );
                }
            }
        }
        if let Some(token_param) = self.idempotency_param.clone() {
            if self.param(&token_param).is_none() {
                self.params.push(
                    ParamSpec::string(&token_param)
                        .describe("Client idempotency token; generated by the service when omitted"),
                );
            }
        }
        self
    }

    /// Check internal consistency. Called for every descriptor at registry build.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: String| ShimError::InvalidConfig(self.command.clone(), msg);

        if self.service.is_empty()
            || !self
                .service
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid(format!(
                "service '{}' must be a lowercase aws CLI service name",
                self.service
            )));
        }

        if self.operation.is_empty()
            || !self.operation.chars().all(|c| c.is_ascii_alphanumeric())
            || !self.operation.starts_with(|c: char| c.is_ascii_uppercase())
        {
            return Err(invalid(format!(
                "operation '{}' must be a PascalCase API operation name",
                self.operation
            )));
        }

        match self.command.split_once('-') {
            Some((verb, noun)) if !verb.is_empty() && !noun.is_empty() => {}
            _ => {
                return Err(invalid(format!(
                    "command '{}' must have the form Verb-Noun",
                    self.command
                )));
            }
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut slots: HashSet<usize> = HashSet::new();
        for param in &self.params {
            if param.name.is_empty() {
                return Err(invalid("parameter with empty name".to_string()));
            }
            if !seen.insert(normalize_name(&param.name)) {
                return Err(invalid(format!("duplicate parameter '{}'", param.name)));
            }
            if let Some(slot) = param.position {
                if !slots.insert(slot) {
                    return Err(invalid(format!("duplicate positional slot {}", slot)));
                }
            }
            if crate::params::is_common_param(&param.name) {
                return Err(invalid(format!(
                    "parameter '{}' collides with a common parameter",
                    param.name
                )));
            }
        }

        for (label, name) in [
            ("echo_param", &self.echo_param),
            ("idempotency_param", &self.idempotency_param),
        ] {
            if let Some(name) = name {
                if self.param(name).is_none() {
                    return Err(invalid(format!(
                        "{} '{}' is not a declared parameter",
                        label, name
                    )));
                }
            }
        }

        crate::selector::OutputSelector::parse(&self.default_selector, self).map_err(|e| {
            invalid(format!("default_selector '{}': {}", self.default_selector, e))
        })?;

        if let Some(pagination) = &self.pagination {
            if pagination.input_token.is_empty() || pagination.output_token.is_empty() {
                return Err(invalid("pagination token fields must be non-empty".to_string()));
            }
            if pagination.service_max == Some(0) {
                return Err(invalid("pagination service_max must be > 0".to_string()));
            }
            if pagination.page_size.is_some() && pagination.items_field.is_none() {
                return Err(invalid(
                    "pagination with a page_size needs items_field to count toward MaxResult"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_descriptor() -> OperationDescriptor {
        OperationDescriptor {
            service: "ram".to_string(),
            operation: "GetResourceShares".to_string(),
            command: "Get-RAMResourceShare".to_string(),
            impact: None,
            params: vec![ParamSpec::string("ResourceOwner").required()],
            default_selector: "resourceShares".to_string(),
            response_fields: vec!["resourceShares".to_string(), "nextToken".to_string()],
            pagination: Some(PaginationSpec {
                items_field: Some("resourceShares".to_string()),
                ..Default::default()
            }),
            idempotency_param: None,
            echo_param: None,
            synopsis: None,
        }
        .normalize()
    }

    #[test]
    fn test_normalize_adds_paging_params() {
        let desc = list_descriptor();
        let token = desc.param("NextToken").expect("NextToken added");
        assert_eq!(token.wire_path(), "nextToken");
        let max = desc.param("MaxResult").expect("MaxResult added");
        assert_eq!(max.kind, ParamKind::Integer);
        assert_eq!(max.wire_path(), "maxResults");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let desc = list_descriptor();
        let count = desc.params.len();
        let again = desc.normalize();
        assert_eq!(again.params.len(), count);
    }

    #[test]
    fn test_param_matching_is_loose() {
        let desc = list_descriptor();
        assert!(desc.param("resourceowner").is_some());
        assert!(desc.param("resource-owner").is_some());
        assert!(desc.param("resource_owner").is_some());
        assert!(desc.param("Owner").is_none());
    }

    #[test]
    fn test_wire_path_defaults_to_camel_case() {
        let spec = ParamSpec::string("ResourceShareArn");
        assert_eq!(spec.wire_path(), "resourceShareArn");
        let spec = ParamSpec::list("ResourceShareArn").wire("resourceShareArns");
        assert_eq!(spec.wire_path(), "resourceShareArns");
    }

    #[test]
    fn test_derived_impact() {
        let desc = list_descriptor();
        assert_eq!(desc.impact(), Impact::None);
        assert!(!desc.is_mutating());

        let mut delete = desc.clone();
        delete.operation = "DeleteResourceShare".to_string();
        assert_eq!(delete.impact(), Impact::High);

        delete.impact = Some(Impact::Low);
        assert_eq!(delete.impact(), Impact::Low);
    }

    #[test]
    fn test_alias_and_cli_operation() {
        let desc = list_descriptor();
        assert_eq!(desc.cli_operation(), "get-resource-shares");
        assert_eq!(desc.alias(), "ram:get-resource-shares");
    }

    #[test]
    fn test_validate_ok() {
        assert!(list_descriptor().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_command() {
        let mut desc = list_descriptor();
        desc.command = "GetShares".to_string();
        let result = desc.validate();
        assert!(
            matches!(result, Err(ShimError::InvalidConfig(_, ref msg)) if msg.contains("Verb-Noun"))
        );
    }

    #[test]
    fn test_validate_rejects_unknown_echo_param() {
        let mut desc = list_descriptor();
        desc.echo_param = Some("ResourceShareArn".to_string());
        let result = desc.validate();
        assert!(
            matches!(result, Err(ShimError::InvalidConfig(_, ref msg)) if msg.contains("echo_param"))
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_params() {
        let mut desc = list_descriptor();
        desc.params.push(ParamSpec::string("resource-owner"));
        let result = desc.validate();
        assert!(
            matches!(result, Err(ShimError::InvalidConfig(_, ref msg)) if msg.contains("duplicate parameter"))
        );
    }

    #[test]
    fn test_validate_rejects_common_param_collision() {
        let mut desc = list_descriptor();
        desc.params.push(ParamSpec::string("Region"));
        let result = desc.validate();
        assert!(
            matches!(result, Err(ShimError::InvalidConfig(_, ref msg)) if msg.contains("common parameter"))
        );
    }

    #[test]
    fn test_validate_rejects_bad_default_selector() {
        let mut desc = list_descriptor();
        desc.default_selector = "shares".to_string();
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_page_size_without_items_field() {
        let mut desc = list_descriptor();
        if let Some(p) = desc.pagination.as_mut() {
            p.items_field = None;
        }
        let result = desc.validate();
        assert!(
            matches!(result, Err(ShimError::InvalidConfig(_, ref msg)) if msg.contains("items_field"))
        );

        if let Some(p) = desc.pagination.as_mut() {
            p.page_size = None;
        }
        assert!(desc.validate().is_ok(), "token-only paging needs no item count");
    }

    #[test]
    fn test_impact_ordering() {
        assert!(Impact::None < Impact::Low);
        assert!(Impact::Medium < Impact::High);
        assert_eq!(Impact::High.to_string(), "high");
    }
}
