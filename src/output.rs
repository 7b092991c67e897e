//! What an invocation emits: selected values and error records.

use serde::Serialize;
use serde_json::Value;

use crate::client::{ClientOverrides, ServiceFault};
use crate::operation::OperationDescriptor;

/// A failed remote call, captured as output instead of propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub command: String,
    pub operation: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl ErrorRecord {
    /// Capture `fault` for `desc`.
    ///
    /// Name-resolution faults are rewritten into an endpoint diagnostic naming
    /// the region in effect; every other fault keeps its kind, code and
    /// message.
    pub fn capture(
        desc: &OperationDescriptor,
        fault: &ServiceFault,
        overrides: &ClientOverrides,
        default_region: Option<&str>,
    ) -> Self {
        let message = match fault {
            ServiceFault::NameResolution { endpoint, message } => {
                let region = overrides
                    .region
                    .as_deref()
                    .or(default_region)
                    .unwrap_or("(not set)");
                format!(
                    "Name resolution failure attempting to reach service endpoint '{}'. \
                     The endpoint may not exist for region '{}', or the network may be unavailable. \
                     Check the -Region and -EndpointUrl values. ({})",
                    endpoint, region, message
                )
            }
            ServiceFault::Service { message, .. } => message.clone(),
            other => other.to_string(),
        };

        ErrorRecord {
            command: desc.command.clone(),
            operation: desc.operation.clone(),
            kind: fault.kind().to_string(),
            code: fault.code().map(str::to_string),
            message,
        }
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {} ({}): {}", self.command, self.kind, code, self.message),
            None => write!(f, "{}: {}: {}", self.command, self.kind, self.message),
        }
    }
}

/// One item written by an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Value(Value),
    Error(ErrorRecord),
}

impl Output {
    pub fn is_error(&self) -> bool {
        matches!(self, Output::Error(_))
    }
}

/// Receives outputs in emission order.
pub trait OutputSink: Send {
    fn emit(&mut self, output: Output);
}

impl OutputSink for Vec<Output> {
    fn emit(&mut self, output: Output) {
        self.push(output);
    }
}
