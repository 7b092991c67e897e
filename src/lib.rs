//! awsop: descriptor-driven command binder for AWS operations.
//!
//! Each remote operation is described once as data (`OperationDescriptor`);
//! one generic shim binds parameters, asks for confirmation on mutating
//! calls, builds the request, follows continuation tokens, projects the
//! output and captures failures as error records. Built-in catalogs cover
//! AWS Resource Access Manager and SSM Incident Manager. The same registry
//! serves a command line and an MCP tool surface.

pub mod client;
pub mod config;
pub mod confirm;
pub mod error;
pub mod namespace;
pub mod operation;
pub mod output;
pub mod params;
pub mod registry;
pub mod request;
pub mod selector;
pub mod shim;
pub mod standalone;

pub use client::{AwsCliClient, ClientOverrides, ServiceCall, ServiceClient, ServiceFault};
pub use config::{parse_env_ref, resolve_env_vars, AwsopConfig, BackendConfig};
pub use confirm::{AutoApprove, AutoDecline, Confirm, ConfirmationGate, TerminalPrompt};
pub use error::{Result, ShimError};
pub use operation::catalog::{available_services, get_catalog, ServiceCatalog};
pub use operation::{Impact, OperationDescriptor, ParamKind, ParamSpec, PaginationSpec};
pub use output::{ErrorRecord, Output, OutputSink};
pub use registry::OperationRegistry;
pub use selector::OutputSelector;
pub use shim::{Invocation, InvocationBuilder, Outcome, Paging};
pub use standalone::hot_reload::run_hot_reload;
pub use standalone::server::AwsopMcpServer;
