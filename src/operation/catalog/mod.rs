//! Built-in operation catalogs.
//!
//! Each catalog is the descriptor table for one AWS service: every API
//! operation it exposes as a command, with typed parameters, default
//! selector, and pagination fields. Adding a service is a data change here,
//! never a new code path in the shim.

mod incidents;
mod ram;

pub use incidents::IncidentsCatalog;
pub use ram::RamCatalog;

use super::{Impact, OperationDescriptor, PaginationSpec, ParamSpec, PARAM_CLIENT_TOKEN};

/// A built-in service catalog.
///
/// Implementations provide:
/// - `service()`: the `aws` CLI service name (e.g., "ram")
/// - `noun_prefix()`: the noun prefix used in command names (e.g., "RAM")
/// - `operations()`: every operation descriptor for the service
pub trait ServiceCatalog: Send + Sync {
    /// The `aws` CLI service name used in config and aliases.
    fn service(&self) -> &'static str;

    /// Noun prefix of the service's command names (`Get-RAMResourceShare`).
    fn noun_prefix(&self) -> &'static str;

    /// All operation descriptors, normalized.
    fn operations(&self) -> Vec<OperationDescriptor>;
}

/// Resolve a built-in catalog by service name.
///
/// Supported services: "ram", "ssm-incidents".
pub fn get_catalog(name: &str) -> Option<Box<dyn ServiceCatalog>> {
    match name {
        "ram" => Some(Box::new(RamCatalog)),
        "ssm-incidents" => Some(Box::new(IncidentsCatalog)),
        _ => None,
    }
}

/// Returns a sorted list of all built-in service names.
pub fn available_services() -> Vec<&'static str> {
    let mut names = vec!["ram", "ssm-incidents"];
    names.sort_unstable();
    names
}

/// Chained constructor used by the catalog tables.
pub(crate) struct OpBuilder {
    desc: OperationDescriptor,
}

/// Start a descriptor for `service`'s `operation`, exposed as `command`.
pub(crate) fn op(service: &str, operation: &str, command: &str) -> OpBuilder {
    OpBuilder {
        desc: OperationDescriptor {
            service: service.to_string(),
            operation: operation.to_string(),
            command: command.to_string(),
            impact: None,
            params: Vec::new(),
            default_selector: "*".to_string(),
            response_fields: Vec::new(),
            pagination: None,
            idempotency_param: None,
            echo_param: None,
            synopsis: None,
        },
    }
}

impl OpBuilder {
    pub(crate) fn param(mut self, spec: ParamSpec) -> Self {
        self.desc.params.push(spec);
        self
    }

    /// Default selector plus the declared top-level response members.
    pub(crate) fn returns(mut self, selector: &str, fields: &[&str]) -> Self {
        self.desc.default_selector = selector.to_string();
        self.desc.response_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Token-paginated list; `items` is the response member holding the page.
    pub(crate) fn paginated(mut self, items: &str) -> Self {
        self.desc.pagination = Some(PaginationSpec {
            items_field: Some(items.to_string()),
            ..Default::default()
        });
        self
    }

    pub(crate) fn service_max(mut self, max: u32) -> Self {
        if let Some(p) = self.desc.pagination.as_mut() {
            p.service_max = Some(max);
        }
        self
    }

    /// Declare the standard `ClientToken` idempotency parameter.
    pub(crate) fn idempotent(mut self) -> Self {
        self.desc.idempotency_param = Some(PARAM_CLIENT_TOKEN.to_string());
        self
    }

    pub(crate) fn echo(mut self, param: &str) -> Self {
        self.desc.echo_param = Some(param.to_string());
        self
    }

    pub(crate) fn impact(mut self, impact: Impact) -> Self {
        self.desc.impact = Some(impact);
        self
    }

    pub(crate) fn synopsis(mut self, text: &str) -> Self {
        self.desc.synopsis = Some(text.to_string());
        self
    }

    pub(crate) fn build(self) -> OperationDescriptor {
        self.desc.normalize()
    }
}
