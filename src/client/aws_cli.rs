//! `aws` executable backend.
//!
//! Each call spawns `aws <service> <operation> --cli-input-json <request>`
//! with structured args (never a shell), races the child against the call
//! timeout and the cancellation token, and kills the process when either
//! fires. Credentials, signing and retries stay with the `aws` tool.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{classify_stderr, ServiceCall, ServiceClient, ServiceFault};
use crate::config::{resolve_env_vars, BackendConfig};

/// Runs operations through the `aws` command-line tool.
#[derive(Debug, Clone)]
pub struct AwsCliClient {
    command: String,
    region: Option<String>,
    profile: Option<String>,
    endpoint_url: Option<String>,
    inject_flags: Vec<String>,
    /// Resolved env vars (values already extracted from `${VAR}` references)
    env: HashMap<String, String>,
    timeout: Duration,
}

impl AwsCliClient {
    pub fn from_config(config: &BackendConfig) -> Self {
        AwsCliClient {
            command: config.command.clone(),
            region: config.region.clone(),
            profile: config.profile.clone(),
            endpoint_url: config.endpoint_url.clone(),
            inject_flags: config.inject_flags.clone(),
            env: resolve_env_vars(&config.env),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full argument vector for one call. Per-call overrides win over
    /// configured defaults.
    pub fn build_args(&self, call: &ServiceCall<'_>) -> Vec<String> {
        let mut args = vec![
            call.service.to_string(),
            crate::operation::kebab_case(call.operation),
            "--cli-input-json".to_string(),
            call.request.to_json().to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--no-paginate".to_string(),
            "--no-cli-pager".to_string(),
        ];

        let region = call.overrides.region.as_ref().or(self.region.as_ref());
        let profile = call.overrides.profile.as_ref().or(self.profile.as_ref());
        let endpoint = call
            .overrides
            .endpoint_url
            .as_ref()
            .or(self.endpoint_url.as_ref());

        for (flag, value) in [
            ("--region", region),
            ("--profile", profile),
            ("--endpoint-url", endpoint),
        ] {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }

        args.extend(self.inject_flags.iter().cloned());
        args
    }

    async fn run(&self, call: ServiceCall<'_>) -> Result<Value, ServiceFault> {
        let start = Instant::now();
        let args = self.build_args(&call);

        let mut cmd = tokio::process::Command::new(&self.command);
        cmd.args(&args);
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        let mut child = cmd.spawn().map_err(|e| {
            ServiceFault::Transport(format!("failed to spawn '{}': {}", self.command, e))
        })?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        // wait() takes &mut self, so the child stays reachable for kill()
        let output = tokio::select! {
            result = async {
                let (stdout, stderr) =
                    tokio::join!(read_pipe(stdout_pipe, "stdout"), read_pipe(stderr_pipe, "stderr"));
                let (stdout, stderr) = (stdout?, stderr?);
                let status = child.wait().await.map_err(|e| {
                    ServiceFault::Transport(format!("process I/O error: {}", e))
                })?;
                Ok::<std::process::Output, ServiceFault>(std::process::Output {
                    status,
                    stdout,
                    stderr,
                })
            } => result?,
            _ = tokio::time::sleep(self.timeout) => {
                let _ = child.kill().await;
                tracing::warn!(
                    service = %call.service,
                    operation = %call.operation,
                    timeout_ms = %self.timeout.as_millis(),
                    "backend call timed out, process killed"
                );
                return Err(ServiceFault::Timeout);
            }
            _ = call.cancel.cancelled() => {
                let _ = child.kill().await;
                tracing::debug!(
                    service = %call.service,
                    operation = %call.operation,
                    "backend call cancelled, process killed"
                );
                return Err(ServiceFault::Cancelled);
            }
        };

        let elapsed = start.elapsed().as_millis();
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        tracing::info!(
            service = %call.service,
            operation = %call.operation,
            exit_code = %exit_code,
            duration_ms = %elapsed,
            "backend call"
        );

        if !output.status.success() {
            tracing::debug!(stderr = %stderr, "backend stderr");
            return Err(classify_stderr(&stderr));
        }

        // Operations without output members print nothing
        if stdout.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&stdout)
            .map_err(|e| ServiceFault::Transport(format!("backend returned invalid JSON: {}", e)))
    }
}

/// Drain a child pipe. A failed read is a transport fault, never a short
/// document.
async fn read_pipe<R>(pipe: Option<R>, name: &str) -> Result<Vec<u8>, ServiceFault>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut bytes)
            .await
            .map_err(|e| ServiceFault::Transport(format!("failed reading backend {}: {}", name, e)))?;
    }
    Ok(bytes)
}

impl ServiceClient for AwsCliClient {
    fn call<'a>(&'a self, call: ServiceCall<'a>) -> BoxFuture<'a, Result<Value, ServiceFault>> {
        Box::pin(self.run(call))
    }

    fn default_region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}
