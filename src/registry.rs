//! OperationRegistry: the single public entry point for awsop operations.
//!
//! The registry validates config, loads the enabled built-in catalogs plus
//! user-declared operations, resolves commands by any of their names, and
//! dispatches invocations from the command line (`invoke_tokens`) or from MCP
//! tool calls (`call_tool`).

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use crate::client::{AwsCliClient, ServiceClient};
use crate::confirm::ConfirmationGate;
use crate::config::AwsopConfig;
use crate::error::ShimError;
use crate::namespace::{label_tool, tool_name};
use crate::operation::catalog::get_catalog;
use crate::operation::{Impact, OperationDescriptor};
use crate::output::{Output, OutputSink};
use crate::params::{bind_json, bind_tokens};
use crate::shim::{Invocation, InvocationBuilder, Outcome};

/// All operations available to one configuration, plus the client that runs them.
pub struct OperationRegistry {
    /// Sorted by command name.
    operations: Vec<Arc<OperationDescriptor>>,
    /// Lowercased command name, `service:cli-op` alias and tool name -> index.
    index: HashMap<String, usize>,
    client: Arc<dyn ServiceClient>,
    confirm_impact: Impact,
}

impl OperationRegistry {
    /// Build a registry backed by the `aws` executable.
    ///
    /// Calls `config.validate()` first; nothing is loaded if config is invalid.
    pub fn from_config(config: AwsopConfig) -> crate::Result<Self> {
        config.validate()?;
        let client = Arc::new(AwsCliClient::from_config(&config.backend));
        Self::with_client(config, client)
    }

    /// Build a registry around an existing client.
    pub fn with_client(config: AwsopConfig, client: Arc<dyn ServiceClient>) -> crate::Result<Self> {
        config.validate()?;

        let mut operations: Vec<Arc<OperationDescriptor>> = Vec::new();
        for service in &config.services {
            let catalog = get_catalog(service).ok_or_else(|| {
                ShimError::InvalidConfig("services".to_string(), format!("unknown service '{}'", service))
            })?;
            let ops = catalog.operations();
            tracing::debug!(service = %service, operations = ops.len(), "loaded catalog");
            operations.extend(ops.into_iter().map(Arc::new));
        }
        for (label, desc) in config.operations {
            tracing::debug!(label = %label, command = %desc.command, "loaded user operation");
            operations.push(Arc::new(desc.normalize()));
        }
        operations.sort_by(|a, b| a.command.cmp(&b.command));

        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, desc) in operations.iter().enumerate() {
            desc.validate()?;
            let command_key = desc.command.to_lowercase();
            let keys = [command_key.clone(), desc.alias().to_lowercase(), tool_name(desc).to_lowercase()];
            for key in keys {
                if let Some(&prev) = index.get(&key) {
                    if prev != i {
                        return Err(ShimError::DuplicateCommand(key));
                    }
                }
                index.insert(key, i);
            }
        }

        tracing::info!(
            operations = operations.len(),
            services = ?config.services,
            confirm_impact = %config.confirm_impact,
            "operation registry ready"
        );

        Ok(OperationRegistry {
            operations,
            index,
            client,
            confirm_impact: config.confirm_impact,
        })
    }

    /// Look up an operation by command name, `service:cli-op` alias or tool
    /// name, case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<&Arc<OperationDescriptor>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.operations[i])
    }

    pub fn operations(&self) -> &[Arc<OperationDescriptor>] {
        &self.operations
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn client(&self) -> &dyn ServiceClient {
        self.client.as_ref()
    }

    pub fn confirm_impact(&self) -> Impact {
        self.confirm_impact
    }

    /// Bind command-line tokens for `command` into an invocation.
    pub fn invocation(&self, command: &str, tokens: &[String]) -> crate::Result<Invocation> {
        let desc = self
            .resolve(command)
            .ok_or_else(|| ShimError::UnknownCommand(command.to_string()))?;
        let args = bind_tokens(desc, tokens)?;
        InvocationBuilder::new(desc.clone()).args(args).build()
    }

    /// Run `command` with command-line tokens.
    pub async fn invoke_tokens(
        &self,
        command: &str,
        tokens: &[String],
        gate: &ConfirmationGate,
        sink: &mut dyn OutputSink,
        cancel: &CancellationToken,
    ) -> crate::Result<Outcome> {
        let invocation = self.invocation(command, tokens)?;
        invocation.run(self.client.as_ref(), gate, sink, cancel).await
    }

    /// One MCP tool per operation.
    pub fn tools(&self) -> Vec<Tool> {
        self.operations.iter().map(|desc| build_tool(desc)).collect()
    }

    /// Call an operation as an MCP tool.
    ///
    /// The gate is non-interactive: mutating tools at or above the configured
    /// impact only run with `Force: true`. Argument errors and service faults
    /// come back as error results, not protocol errors.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> crate::Result<CallToolResult> {
        let desc = self
            .resolve(name)
            .ok_or_else(|| ShimError::Protocol(name.to_string(), format!("no tool named '{}'", name)))?;

        let invocation = match bind_json(desc, &arguments.unwrap_or_default())
            .and_then(|args| InvocationBuilder::new(desc.clone()).args(args).build())
        {
            Ok(invocation) => invocation,
            Err(ShimError::Argument(_, msg)) => {
                return Ok(error_result(vec![Content::text(msg)]));
            }
            Err(e) => return Err(e),
        };

        let gate = ConfirmationGate::non_interactive(self.confirm_impact);
        let mut outputs: Vec<Output> = Vec::new();
        let outcome = invocation
            .run(self.client.as_ref(), &gate, &mut outputs, cancel)
            .await?;

        if outcome == Outcome::Declined {
            return Ok(error_result(vec![Content::text(format!(
                "{} is a {}-impact operation; set \"Force\": true to run it",
                desc.command,
                desc.impact()
            ))]));
        }

        let mut content = Vec::with_capacity(outputs.len());
        let mut is_error = false;
        for output in outputs {
            let value = match output {
                Output::Value(v) => v,
                Output::Error(record) => {
                    is_error = true;
                    serde_json::to_value(&record)
                        .map_err(|e| ShimError::Protocol(desc.command.clone(), e.to_string()))?
                }
            };
            content.push(Content::json(value).map_err(|e| {
                ShimError::Protocol(desc.command.clone(), format!("JSON content error: {}", e))
            })?);
        }

        Ok(CallToolResult {
            content,
            is_error: Some(is_error),
            structured_content: None,
            meta: None,
        })
    }
}

fn error_result(content: Vec<Content>) -> CallToolResult {
    CallToolResult {
        content,
        is_error: Some(true),
        structured_content: None,
        meta: None,
    }
}

/// Tool definition with an input schema generated from the parameter specs.
fn build_tool(desc: &OperationDescriptor) -> Tool {
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for spec in &desc.params {
        let mut schema = spec.kind.json_schema();
        if let (Some(text), Some(obj)) = (&spec.description, schema.as_object_mut()) {
            obj.insert("description".to_string(), json!(text));
        }
        properties.insert(spec.name.clone(), schema);
        if spec.required {
            required.push(json!(spec.name));
        }
    }

    properties.insert(
        "Select".to_string(),
        json!({
            "type": "string",
            "description": format!(
                "Output selector: '*', a response member, or '^Parameter' (default '{}')",
                desc.default_selector
            )
        }),
    );
    if let Some(echo) = &desc.echo_param {
        properties.insert(
            "PassThru".to_string(),
            json!({ "type": "boolean", "description": format!("Return the {} value instead of the response", echo) }),
        );
    }
    if desc.is_mutating() {
        properties.insert(
            "Force".to_string(),
            json!({ "type": "boolean", "description": format!("Required to run this {}-impact operation", desc.impact()) }),
        );
    }
    if desc.pagination.is_some() {
        properties.insert(
            "NoAutoIteration".to_string(),
            json!({ "type": "boolean", "description": "Fetch a single page only" }),
        );
    }
    for common in ["Region", "ProfileName", "EndpointUrl"] {
        properties.insert(common.to_string(), json!({ "type": "string" }));
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }

    let description = desc
        .synopsis
        .clone()
        .unwrap_or_else(|| format!("Calls the {} {} operation", desc.service, desc.operation));

    let tool = Tool {
        name: tool_name(desc).into(),
        title: Some(desc.command.clone()),
        description: Some(description.into()),
        input_schema: Arc::new(schema),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    };
    label_tool(&desc.command, tool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::ScriptedClient;
    use crate::client::ServiceFault;
    use crate::confirm::AutoApprove;

    fn registry_with(client: Arc<ScriptedClient>) -> OperationRegistry {
        OperationRegistry::with_client(AwsopConfig::default(), client).expect("default config")
    }

    fn args(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    #[test]
    fn test_default_registry_loads_both_catalogs() {
        let registry = registry_with(Arc::new(ScriptedClient::default()));
        assert_eq!(registry.operation_count(), 34 + 31);
        assert_eq!(registry.tools().len(), 65);
    }

    #[test]
    fn test_resolve_by_any_name() {
        let registry = registry_with(Arc::new(ScriptedClient::default()));
        for name in [
            "Get-RAMResourceShare",
            "get-ramresourceshare",
            "ram:get-resource-shares",
            "RAM:Get-Resource-Shares",
            "ram__get-resource-shares",
        ] {
            let desc = registry.resolve(name).unwrap_or_else(|| panic!("{name} unresolved"));
            assert_eq!(desc.operation, "GetResourceShares");
        }
        assert!(registry.resolve("Get-RAMNothing").is_none());
    }

    #[test]
    fn test_services_filter() {
        let config = AwsopConfig::from_toml(r#"services = ["ssm-incidents"]"#).unwrap();
        let registry =
            OperationRegistry::with_client(config, Arc::new(ScriptedClient::default())).unwrap();
        assert_eq!(registry.operation_count(), 31);
        assert!(registry.resolve("Get-RAMResourceShare").is_none());
    }

    #[test]
    fn test_duplicate_command_rejected() {
        let config = AwsopConfig::from_toml(
            r#"
            [operations.clash]
            service = "ram"
            operation = "ListResources"
            command = "get-ramresourceshare"
            "#,
        )
        .unwrap();
        let err = OperationRegistry::with_client(config, Arc::new(ScriptedClient::default()))
            .err()
            .expect("duplicate should fail");
        assert!(matches!(err, ShimError::DuplicateCommand(ref name) if name == "get-ramresourceshare"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let config = AwsopConfig::from_toml(
            r#"
            [operations.again]
            service = "ram"
            operation = "GetResourceShares"
            command = "Find-RAMShare"
            "#,
        )
        .unwrap();
        let err = OperationRegistry::with_client(config, Arc::new(ScriptedClient::default()))
            .err()
            .expect("duplicate alias should fail");
        assert!(matches!(err, ShimError::DuplicateCommand(ref name) if name == "ram:get-resource-shares"));
    }

    #[test]
    fn test_tool_schema() {
        let registry = registry_with(Arc::new(ScriptedClient::default()));
        let tools = registry.tools();
        let tool = tools
            .iter()
            .find(|t| t.name == "ram__delete-resource-share")
            .unwrap();
        assert_eq!(tool.title.as_deref(), Some("Remove-RAMResourceShare"));
        assert!(tool.description.as_deref().unwrap().starts_with("[Remove-RAMResourceShare]"));

        let props = tool.input_schema["properties"].as_object().unwrap();
        assert_eq!(props["ResourceShareArn"]["type"], "string");
        assert_eq!(props["Force"]["type"], "boolean");
        assert!(props.contains_key("PassThru"));
        assert!(props.contains_key("ClientToken"));
        assert!(!props.contains_key("NoAutoIteration"));
        assert_eq!(tool.input_schema["required"], json!(["ResourceShareArn"]));

        let list = tools
            .iter()
            .find(|t| t.name == "ssm-incidents__list-incident-records")
            .unwrap();
        let props = list.input_schema["properties"].as_object().unwrap();
        assert_eq!(props["MaxResult"]["type"], "integer");
        assert!(props.contains_key("NoAutoIteration"));
        assert!(!props.contains_key("Force"));
    }

    #[tokio::test]
    async fn test_invoke_tokens() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(json!({
            "resourceShares": [{ "name": "a" }]
        }))]));
        let registry = registry_with(client.clone());
        let gate = ConfirmationGate::new(Impact::Medium, Arc::new(AutoApprove));
        let mut out: Vec<Output> = Vec::new();

        let tokens: Vec<String> = ["SELF", "-Name", "a"].iter().map(|s| s.to_string()).collect();
        let outcome = registry
            .invoke_tokens("Get-RAMResourceShare", &tokens, &gate, &mut out, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Completed { pages: 1 });
        assert_eq!(out, vec![Output::Value(json!([{ "name": "a" }]))]);
        assert_eq!(
            client.calls()[0].request,
            json!({ "resourceOwner": "SELF", "name": "a" })
        );
    }

    #[tokio::test]
    async fn test_invoke_unknown_command() {
        let registry = registry_with(Arc::new(ScriptedClient::default()));
        let gate = ConfirmationGate::non_interactive(Impact::Medium);
        let mut out: Vec<Output> = Vec::new();
        let err = registry
            .invoke_tokens("Get-Nothing", &[], &gate, &mut out, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ShimError::UnknownCommand(_)));
    }

    #[tokio::test]
    async fn test_call_tool_read_only() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(json!({
            "responsePlanSummaries": [{ "name": "p1" }]
        }))]));
        let registry = registry_with(client.clone());

        let result = registry
            .call_tool("ssm-incidents__list-response-plans", args(json!({})), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.content.len(), 1);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_call_tool_mutation_needs_force() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(json!({ "returnValue": true }))]));
        let registry = registry_with(client.clone());
        let arn = "arn:aws:ram:us-east-1:111122223333:resource-share/a";

        let declined = registry
            .call_tool(
                "ram__delete-resource-share",
                args(json!({ "ResourceShareArn": arn })),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(declined.is_error, Some(true));
        assert_eq!(client.call_count(), 0);

        let forced = registry
            .call_tool(
                "ram__delete-resource-share",
                args(json!({ "ResourceShareArn": arn, "Force": true })),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(forced.is_error, Some(false));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_call_tool_argument_error_is_result() {
        let client = Arc::new(ScriptedClient::default());
        let registry = registry_with(client.clone());
        let result = registry
            .call_tool(
                "ram__delete-resource-share",
                args(json!({ "ResourceShareArn": "arn:x", "PassThru": true, "Select": "*" })),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_call_tool_service_fault_is_error_result() {
        let client = Arc::new(ScriptedClient::new(vec![Err(ServiceFault::Service {
            code: "AccessDeniedException".to_string(),
            message: "no".to_string(),
        })]));
        let registry = registry_with(client);
        let result = registry
            .call_tool("ram__list-permissions", args(json!({})), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);
    }

    #[tokio::test]
    async fn test_call_tool_unknown_name() {
        let registry = registry_with(Arc::new(ScriptedClient::default()));
        let err = registry
            .call_tool("ram__nope", None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ShimError::Protocol(..)));
    }
}
