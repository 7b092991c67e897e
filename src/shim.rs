//! The generic command shim.
//!
//! One `Invocation` is one command run: bound parameters, the resolved output
//! selector and paging mode, fixed at build time. `run` drives it through
//! the confirmation gate, request construction, the remote call(s) and
//! output emission. Service faults are emitted as error records; only local
//! problems (argument errors, cancellation) come back as `ShimError`.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::client::{ClientOverrides, ServiceCall, ServiceClient, ServiceFault};
use crate::confirm::{ConfirmationGate, GateDecision};
use crate::error::ShimError;
use crate::operation::{OperationDescriptor, PARAM_MAX_RESULT, PARAM_NEXT_TOKEN};
use crate::output::{ErrorRecord, Output, OutputSink};
use crate::params::{BoundArgs, CommonParams, ParamValue, ParameterSet};
use crate::request::Request;
use crate::selector::OutputSelector;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every requested page was emitted
    Completed { pages: usize },
    /// Confirmation declined; nothing was sent or emitted
    Declined,
    /// A call failed; an error record was emitted after `pages` pages
    Failed { pages: usize },
}

/// Paging behaviour resolved from the caller's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Exactly one request
    Single,
    /// Follow continuation tokens, optionally stopping after `limit` items
    Auto { limit: Option<u64> },
}

/// A fully resolved command run.
#[derive(Debug, Clone)]
pub struct Invocation {
    desc: Arc<OperationDescriptor>,
    params: ParameterSet,
    selector: OutputSelector,
    paging: Paging,
    force: bool,
    overrides: ClientOverrides,
}

/// Builds an `Invocation`, rejecting bad combinations before any call.
pub struct InvocationBuilder {
    desc: Arc<OperationDescriptor>,
    args: BoundArgs,
}

impl InvocationBuilder {
    pub fn new(desc: Arc<OperationDescriptor>) -> Self {
        InvocationBuilder {
            desc,
            args: BoundArgs::default(),
        }
    }

    /// Replace all arguments with an already-bound set.
    pub fn args(mut self, args: BoundArgs) -> Self {
        self.args = args;
        self
    }

    pub fn param(mut self, name: &str, value: ParamValue) -> Self {
        self.args.params.insert(name, value);
        self
    }

    pub fn select(mut self, selector: &str) -> Self {
        self.args.common.select = Some(selector.to_string());
        self
    }

    pub fn pass_thru(mut self, on: bool) -> Self {
        self.args.common.pass_thru = on;
        self
    }

    pub fn force(mut self, on: bool) -> Self {
        self.args.common.force = on;
        self
    }

    pub fn no_auto_iteration(mut self, on: bool) -> Self {
        self.args.common.no_auto_iteration = on;
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.args.common.region = Some(region.to_string());
        self
    }

    pub fn build(self) -> crate::Result<Invocation> {
        let InvocationBuilder { desc, args } = self;
        let BoundArgs { params, common } = args;

        let selector = resolve_selector(&desc, &params, &common)?;
        let paging = resolve_paging(&desc, &params, &common)?;
        warn_missing_required(&desc, &params);

        Ok(Invocation {
            desc,
            params,
            selector,
            paging,
            force: common.force,
            overrides: ClientOverrides {
                region: common.region,
                profile: common.profile_name,
                endpoint_url: common.endpoint_url,
            },
        })
    }
}

fn resolve_selector(
    desc: &OperationDescriptor,
    params: &ParameterSet,
    common: &CommonParams,
) -> crate::Result<OutputSelector> {
    if common.pass_thru {
        if common.select.is_some() {
            return Err(ShimError::argument(
                &desc.command,
                "-PassThru cannot be used with -Select",
            ));
        }
        let echo = desc.echo_param.as_deref().ok_or_else(|| {
            ShimError::argument(&desc.command, "-PassThru is not supported by this command")
        })?;
        if !params.contains(echo) {
            tracing::debug!(command = %desc.command, param = %echo, "-PassThru with unbound parameter");
        }
        return OutputSelector::parse(&format!("^{}", echo), desc);
    }

    let raw = common.select.as_deref().unwrap_or(&desc.default_selector);
    OutputSelector::parse(raw, desc)
}

fn resolve_paging(
    desc: &OperationDescriptor,
    params: &ParameterSet,
    common: &CommonParams,
) -> crate::Result<Paging> {
    let Some(pagination) = &desc.pagination else {
        return Ok(Paging::Single);
    };
    if common.no_auto_iteration || params.contains(PARAM_NEXT_TOKEN) {
        return Ok(Paging::Single);
    }

    let limit = match params.get(PARAM_MAX_RESULT).and_then(ParamValue::as_i64) {
        Some(n) if n < 1 => {
            return Err(ShimError::argument(
                &desc.command,
                format!("-{} must be at least 1, got {}", PARAM_MAX_RESULT, n),
            ));
        }
        Some(_) if pagination.items_field.is_none() => {
            return Err(ShimError::argument(
                &desc.command,
                format!(
                    "-{} needs a paginated response with a declared items field",
                    PARAM_MAX_RESULT
                ),
            ));
        }
        Some(n) => Some(n as u64),
        None => None,
    };
    Ok(Paging::Auto { limit })
}

/// Why a required parameter will be absent (or blank) in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingRequired {
    NotSupplied,
    /// Supplied but empty, or bound to an explicit null
    Empty,
}

fn missing_required<'a>(
    desc: &'a OperationDescriptor,
    params: &ParameterSet,
) -> Vec<(&'a str, MissingRequired)> {
    desc.params
        .iter()
        .filter(|p| p.required)
        .filter_map(|spec| {
            let missing = match params.get(&spec.name) {
                Some(value) if value.is_empty() => MissingRequired::Empty,
                Some(_) => return None,
                None if params.is_null_bound(&spec.name) => MissingRequired::Empty,
                None => MissingRequired::NotSupplied,
            };
            Some((spec.name.as_str(), missing))
        })
        .collect()
}

/// Required parameters are advisory: the service rejects what it must.
fn warn_missing_required(desc: &OperationDescriptor, params: &ParameterSet) {
    for (name, missing) in missing_required(desc, params) {
        match missing {
            MissingRequired::NotSupplied => tracing::warn!(
                command = %desc.command,
                param = %name,
                "required parameter not supplied"
            ),
            MissingRequired::Empty => tracing::warn!(
                command = %desc.command,
                param = %name,
                "required parameter is empty"
            ),
        }
    }
}

impl Invocation {
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.desc
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn selector(&self) -> &OutputSelector {
        &self.selector
    }

    pub fn paging(&self) -> Paging {
        self.paging
    }

    pub fn overrides(&self) -> &ClientOverrides {
        &self.overrides
    }

    /// Run to completion, emitting into `sink`.
    pub async fn run(
        &self,
        client: &dyn ServiceClient,
        gate: &ConfirmationGate,
        sink: &mut dyn OutputSink,
        cancel: &CancellationToken,
    ) -> crate::Result<Outcome> {
        let desc = &*self.desc;

        if gate.check(desc, &self.params, self.force, cancel).await? == GateDecision::Declined {
            return Ok(Outcome::Declined);
        }

        let mut request = Request::build(desc, &self.params);
        let mut pages = 0usize;
        let mut remaining = match self.paging {
            Paging::Auto { limit } => limit,
            Paging::Single => None,
        };

        loop {
            if cancel.is_cancelled() {
                tracing::info!(command = %desc.command, pages = %pages, "invocation cancelled");
                return Err(ShimError::Cancelled(desc.command.clone()));
            }

            if let (Some(left), Some(pagination)) = (remaining, &desc.pagination) {
                if let Some(size_field) = &pagination.page_size {
                    let size = pagination
                        .service_max
                        .map_or(left, |max| left.min(u64::from(max)));
                    request.set(size_field, json!(size));
                }
            }

            let call = ServiceCall {
                service: &desc.service,
                operation: &desc.operation,
                request: &request,
                overrides: &self.overrides,
                cancel,
            };

            let result = tokio::select! {
                result = client.call(call) => result,
                _ = cancel.cancelled() => Err(ServiceFault::Cancelled),
            };

            let response = match result {
                Ok(response) => response,
                Err(ServiceFault::Cancelled) => {
                    tracing::info!(command = %desc.command, pages = %pages, "invocation cancelled");
                    return Err(ShimError::Cancelled(desc.command.clone()));
                }
                Err(fault) => {
                    let record = ErrorRecord::capture(
                        desc,
                        &fault,
                        &self.overrides,
                        client.default_region(),
                    );
                    tracing::warn!(
                        command = %desc.command,
                        kind = %record.kind,
                        code = ?record.code,
                        "call failed"
                    );
                    sink.emit(Output::Error(record));
                    return Ok(Outcome::Failed { pages });
                }
            };

            pages += 1;
            sink.emit(Output::Value(self.selector.apply(&response, &self.params)));

            let Paging::Auto { .. } = self.paging else {
                break;
            };
            let Some(pagination) = &desc.pagination else {
                break;
            };

            let next_token = response
                .get(&pagination.output_token)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty());
            let Some(token) = next_token else {
                break;
            };

            if let Some(left) = remaining {
                let got = pagination
                    .items_field
                    .as_deref()
                    .and_then(|field| response.get(field))
                    .and_then(Value::as_array)
                    .map_or(0, |items| items.len() as u64);
                let left = left.saturating_sub(got);
                if left == 0 {
                    break;
                }
                remaining = Some(left);
            }

            tracing::debug!(command = %desc.command, page = %pages, "following continuation token");
            request.set(&pagination.input_token, json!(token));
        }

        tracing::info!(command = %desc.command, pages = %pages, "invocation completed");
        Ok(Outcome::Completed { pages })
    }
}
