//! Backend client seam.
//!
//! A `ServiceClient` performs one remote operation call and returns the JSON
//! response document or a `ServiceFault`. The shim never talks to a backend
//! directly, so tests drive it with scripted clients.

pub mod aws_cli;
#[cfg(test)]
pub(crate) mod mock;

use std::sync::LazyLock;

use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::request::Request;

pub use aws_cli::AwsCliClient;

/// Per-invocation overrides of the client's configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOverrides {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
}

/// One remote call.
#[derive(Debug, Clone)]
pub struct ServiceCall<'a> {
    /// `aws` CLI service name
    pub service: &'a str,
    /// API operation name, PascalCase
    pub operation: &'a str,
    pub request: &'a Request,
    pub overrides: &'a ClientOverrides,
    /// Fired when the caller abandons the invocation; clients stop work
    /// and return `ServiceFault::Cancelled`.
    pub cancel: &'a CancellationToken,
}

/// A fault reported by, or on the way to, the remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceFault {
    /// The service endpoint could not be resolved or reached
    #[error("could not connect to endpoint {endpoint}: {message}")]
    NameResolution { endpoint: String, message: String },

    /// The service answered with an error code
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// Backend process or I/O failure
    #[error("transport error: {0}")]
    Transport(String),

    #[error("call timed out")]
    Timeout,

    #[error("call cancelled")]
    Cancelled,
}

impl ServiceFault {
    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceFault::NameResolution { .. } => "NameResolutionFailure",
            ServiceFault::Service { .. } => "ServiceError",
            ServiceFault::Transport(_) => "TransportError",
            ServiceFault::Timeout => "Timeout",
            ServiceFault::Cancelled => "Cancelled",
        }
    }

    /// Service error code, when the service supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ServiceFault::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Performs remote operation calls.
pub trait ServiceClient: Send + Sync {
    fn call<'a>(&'a self, call: ServiceCall<'a>) -> BoxFuture<'a, Result<Value, ServiceFault>>;

    /// Region used when a call carries no override.
    fn default_region(&self) -> Option<&str> {
        None
    }
}

static CONNECT_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Could not connect to the endpoint URL: "?([^"\s]+)"?"#).expect("valid regex")
});

static SERVICE_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"An error occurred \(([^)]+)\)(?: when calling the \w+ operation)?(?: \(reached max retries: \d+\))?: (.*)")
        .expect("valid regex")
});

/// Classify backend stderr into a fault.
///
/// Recognizes connectivity failures and service error reports; anything else
/// becomes `Transport` with the trimmed stderr text.
pub fn classify_stderr(stderr: &str) -> ServiceFault {
    let text = stderr.trim();

    if let Some(caps) = CONNECT_FAILURE.captures(text) {
        return ServiceFault::NameResolution {
            endpoint: caps[1].to_string(),
            message: text.to_string(),
        };
    }

    if let Some(caps) = SERVICE_ERROR.captures(text) {
        return ServiceFault::Service {
            code: caps[1].to_string(),
            message: caps[2].trim().to_string(),
        };
    }

    if text.is_empty() {
        ServiceFault::Transport("backend exited with an error and no diagnostics".to_string())
    } else {
        ServiceFault::Transport(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_connect_failure() {
        let fault = classify_stderr(
            "\nCould not connect to the endpoint URL: \"https://ram.mars-west-1.amazonaws.com/getresourceshares\"\n",
        );
        assert_eq!(
            fault,
            ServiceFault::NameResolution {
                endpoint: "https://ram.mars-west-1.amazonaws.com/getresourceshares".to_string(),
                message: "Could not connect to the endpoint URL: \"https://ram.mars-west-1.amazonaws.com/getresourceshares\"".to_string(),
            }
        );
        assert_eq!(fault.kind(), "NameResolutionFailure");
        assert_eq!(fault.code(), None);
    }

    #[test]
    fn test_classify_service_error() {
        let fault = classify_stderr(
            "An error occurred (UnknownResourceException) when calling the GetResourceShares operation: ResourceShare arn:x could not be found.",
        );
        assert_eq!(
            fault,
            ServiceFault::Service {
                code: "UnknownResourceException".to_string(),
                message: "ResourceShare arn:x could not be found.".to_string(),
            }
        );
        assert_eq!(fault.code(), Some("UnknownResourceException"));
    }

    #[test]
    fn test_classify_service_error_after_retries() {
        let fault = classify_stderr(
            "An error occurred (ThrottlingException) when calling the ListIncidentRecords operation (reached max retries: 2): Rate exceeded",
        );
        assert_eq!(fault.code(), Some("ThrottlingException"));
        assert_eq!(fault.to_string(), "ThrottlingException: Rate exceeded");
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(
            classify_stderr("aws: error: argument --region: expected one argument"),
            ServiceFault::Transport("aws: error: argument --region: expected one argument".to_string())
        );
        assert!(matches!(classify_stderr("  "), ServiceFault::Transport(_)));
    }
}
