//! Tool naming for the MCP surface.
//!
//! Each operation is exposed as `<service>__<cli-operation>` using a double
//! underscore separator (e.g. `ram__get-resource-shares`). Descriptions are
//! prefixed with `[Command-Name]` so consuming LLMs can relate tools to the
//! command-line form.

use rmcp::model::Tool;

use crate::operation::OperationDescriptor;

/// MCP tool name for an operation.
pub fn tool_name(desc: &OperationDescriptor) -> String {
    format!("{}__{}", desc.service, desc.cli_operation())
}

/// Prefix a tool description with the command name.
pub fn label_tool(command: &str, mut tool: Tool) -> Tool {
    let label = match tool.description.as_deref() {
        Some(desc) if !desc.is_empty() => format!("[{}] {}", command, desc),
        _ => format!("[{}]", command),
    };
    tool.description = Some(label.into());
    tool
}
