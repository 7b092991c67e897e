//! Confirmation gate for mutating operations.
//!
//! Evaluation order:
//! 1. Read-only operations always proceed
//! 2. `Force` always proceeds
//! 3. Operations below the configured impact threshold proceed
//! 4. Otherwise the prompter decides; declining is not an error
//!
//! Prompters may block on a terminal, so they run on the blocking pool and
//! race the cancellation token.

use std::io::{BufRead, IsTerminal, Write};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::ShimError;
use crate::operation::{Impact, OperationDescriptor};
use crate::params::ParameterSet;

/// What the caller is asked to affirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub command: String,
    pub operation: String,
    pub target: String,
    pub impact: Impact,
}

impl ConfirmRequest {
    /// The prompt line shown to the caller.
    pub fn prompt(&self) -> String {
        format!(
            "Performing the operation \"{} ({})\" on target \"{}\".",
            self.command, self.operation, self.target
        )
    }
}

/// Something that can affirm or decline a mutating call.
pub trait Confirm: Send + Sync {
    fn confirm(&self, request: &ConfirmRequest) -> bool;
}

/// Prompts on stderr and reads the answer from stdin.
///
/// Declines without asking when stdin is not a terminal, so scripted use
/// needs `-Force`.
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&self, request: &ConfirmRequest) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            tracing::warn!(
                command = %request.command,
                "stdin is not a terminal; declining confirmation (use -Force)"
            );
            return false;
        }

        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "Are you sure you want to perform this action?\n{}\n[Y] Yes  [N] No (default is \"N\"): ",
            request.prompt()
        );
        let _ = stderr.flush();

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Never affirms. Used by non-interactive surfaces (MCP tools).
pub struct AutoDecline;

impl Confirm for AutoDecline {
    fn confirm(&self, _request: &ConfirmRequest) -> bool {
        false
    }
}

/// Always affirms.
pub struct AutoApprove;

impl Confirm for AutoApprove {
    fn confirm(&self, _request: &ConfirmRequest) -> bool {
        true
    }
}

/// Outcome of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Declined,
}

/// Impact threshold plus the prompter consulted above it.
#[derive(Clone)]
pub struct ConfirmationGate {
    threshold: Impact,
    prompter: Arc<dyn Confirm>,
}

impl ConfirmationGate {
    pub fn new(threshold: Impact, prompter: Arc<dyn Confirm>) -> Self {
        ConfirmationGate {
            threshold,
            prompter,
        }
    }

    /// Gate that declines every confirmation it is asked for.
    pub fn non_interactive(threshold: Impact) -> Self {
        Self::new(threshold, Arc::new(AutoDecline))
    }

    /// Decide whether `desc` may run with `params`.
    ///
    /// Returns `ShimError::Cancelled` when `cancel` fires while the prompter
    /// is waiting for an answer.
    pub async fn check(
        &self,
        desc: &OperationDescriptor,
        params: &ParameterSet,
        force: bool,
        cancel: &CancellationToken,
    ) -> crate::Result<GateDecision> {
        let impact = desc.impact();

        if impact == Impact::None || force || impact < self.threshold {
            return Ok(GateDecision::Proceed);
        }

        let request = ConfirmRequest {
            command: desc.command.clone(),
            operation: desc.operation.clone(),
            target: describe_target(desc, params),
            impact,
        };

        let prompter = self.prompter.clone();
        let answer = tokio::select! {
            joined = tokio::task::spawn_blocking(move || prompter.confirm(&request)) => {
                joined.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "confirmation prompt failed, declining");
                    false
                })
            }
            _ = cancel.cancelled() => {
                tracing::info!(command = %desc.command, "cancelled at confirmation prompt");
                return Err(ShimError::Cancelled(desc.command.clone()));
            }
        };

        if answer {
            Ok(GateDecision::Proceed)
        } else {
            tracing::info!(
                command = %desc.command,
                impact = %impact,
                "confirmation declined, no request sent"
            );
            Ok(GateDecision::Declined)
        }
    }
}

/// Best human-readable target: the echo parameter, else the first supplied
/// positional or required parameter.
fn describe_target(desc: &OperationDescriptor, params: &ParameterSet) -> String {
    let candidates = desc
        .echo_param
        .iter()
        .map(String::as_str)
        .chain(
            desc.params
                .iter()
                .filter(|p| p.position.is_some() || p.required)
                .map(|p| p.name.as_str()),
        );

    for name in candidates {
        if let Some(value) = params.get(name) {
            return match value.to_json() {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
        }
    }
    "(no target)".to_string()
}
