//! Output selectors: which part of a response (or input) an invocation emits.

use serde_json::Value;

use crate::error::ShimError;
use crate::operation::OperationDescriptor;
use crate::params::ParameterSet;
use crate::request::lookup;

/// The active projection for an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSelector {
    /// `*`: the entire response
    Whole,
    /// A dotted response member path, e.g. `resourceShares`
    Field(String),
    /// `^Param`: the caller's value for an input parameter (canonical name)
    Echo(String),
}

impl OutputSelector {
    /// Parse selector syntax against a descriptor.
    ///
    /// Echo targets must be declared parameters. Field selectors must start
    /// with a declared response member when the descriptor lists any.
    pub fn parse(raw: &str, desc: &OperationDescriptor) -> crate::Result<Self> {
        let arg_err = |msg: String| ShimError::argument(&desc.command, msg);
        let raw = raw.trim();

        if raw.is_empty() {
            return Err(arg_err("-Select must not be empty".to_string()));
        }

        if raw == "*" {
            return Ok(OutputSelector::Whole);
        }

        if let Some(param) = raw.strip_prefix('^') {
            let spec = desc.param(param).ok_or_else(|| {
                arg_err(format!("-Select '^{}' does not name a parameter", param))
            })?;
            return Ok(OutputSelector::Echo(spec.name.clone()));
        }

        let well_formed = raw
            .split('.')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_'));
        if !well_formed {
            return Err(arg_err(format!(
                "-Select '{}' must be '*', '^ParameterName' or a response member path",
                raw
            )));
        }

        if !desc.response_fields.is_empty() {
            let head = raw.split('.').next().unwrap_or(raw);
            if !desc.response_fields.iter().any(|f| f == head) {
                return Err(arg_err(format!(
                    "-Select '{}' is not a member of the {} response (expected one of: {})",
                    raw,
                    desc.operation,
                    desc.response_fields.join(", ")
                )));
            }
        }

        Ok(OutputSelector::Field(raw.to_string()))
    }

    /// Project a response. Echo selectors ignore the response entirely.
    pub fn apply(&self, response: &Value, params: &ParameterSet) -> Value {
        match self {
            OutputSelector::Whole => response.clone(),
            OutputSelector::Field(path) => response
                .as_object()
                .and_then(|obj| lookup(obj, path))
                .cloned()
                .unwrap_or(Value::Null),
            OutputSelector::Echo(name) => params
                .get(name)
                .map(|v| v.to_json())
                .unwrap_or(Value::Null),
        }
    }
}

impl std::fmt::Display for OutputSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputSelector::Whole => f.write_str("*"),
            OutputSelector::Field(path) => f.write_str(path),
            OutputSelector::Echo(name) => write!(f, "^{}", name),
        }
    }
}
