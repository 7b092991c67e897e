//! awsop: AWS RAM and Incident Manager operations as commands and MCP tools.
//!
//! Subcommands:
//! - `awsop invoke`: run one operation, e.g. `awsop invoke Get-RAMResourceShare SELF`
//! - `awsop list` / `awsop describe`: browse the operation catalog
//! - `awsop serve`: Streamable HTTP MCP server exposing every operation as a tool
//! - `awsop stdio`: the same tools over STDIO

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use axum::http::Request;
use axum::response::IntoResponse;
use axum::Router;
use clap::{Parser, Subcommand};
use nimbus_awsop::{
    run_hot_reload, AwsopConfig, AwsopMcpServer, ConfirmationGate, OperationDescriptor,
    OperationRegistry, Outcome, Output, OutputSink, ShimError, TerminalPrompt,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::ServiceExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt as TowerServiceExt;
use tracing_subscriber::EnvFilter;

/// awsop: AWS RAM and Incident Manager operations as commands and MCP tools.
#[derive(Parser)]
#[command(
    name = "awsop",
    version,
    about = "AWS RAM and Incident Manager operations as commands and MCP tools"
)]
struct Cli {
    /// Path to awsop.toml [default: ./awsop.toml or ~/.config/awsop/awsop.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one operation by command name or service:operation alias
    Invoke {
        /// Print one JSON document per line
        #[arg(long)]
        compact: bool,
        /// Command name, e.g. Get-RAMResourceShare or ram:get-resource-shares
        command: String,
        /// Parameters, e.g. -ResourceOwner SELF -MaxResult 10 -Select '*'
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List available commands
    List {
        /// Only commands of this service (ram, ssm-incidents)
        #[arg(short, long)]
        service: Option<String>,
    },
    /// Show a command's parameters
    Describe {
        command: String,
        /// Print the full descriptor as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a Streamable HTTP MCP server exposing every operation as a tool
    Serve {
        /// HTTP port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Serve the same tools over STDIO
    Stdio,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // RUST_LOG controls verbosity; logs go to stderr so stdout stays JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down awsop...");
        cancel_for_signal.cancel();
    });

    let config_path = resolve_config(cli.config)?;

    match cli.command {
        Commands::Invoke {
            compact,
            command,
            args,
        } => {
            let config = load_config(config_path.as_deref()).await?;
            return run_invoke(config, &command, &args, compact, cancel).await;
        }
        Commands::List { service } => {
            let config = load_config(config_path.as_deref()).await?;
            run_list(config, service.as_deref())?;
        }
        Commands::Describe { command, json } => {
            let config = load_config(config_path.as_deref()).await?;
            run_describe(config, &command, json)?;
        }
        Commands::Serve { port, host } => {
            run_serve(config_path, host, port, cancel).await?;
        }
        Commands::Stdio => {
            let config = load_config(config_path.as_deref()).await?;
            run_stdio(config, cancel).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Streams outputs as they arrive: values to stdout, error records to stderr.
struct ConsoleSink {
    compact: bool,
    errors: usize,
}

impl ConsoleSink {
    fn render(&self, value: &serde_json::Value) -> String {
        let rendered = if self.compact {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        };
        rendered.unwrap_or_else(|_| value.to_string())
    }
}

impl OutputSink for ConsoleSink {
    fn emit(&mut self, output: Output) {
        match output {
            Output::Value(value) => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{}", self.render(&value));
            }
            Output::Error(record) => {
                self.errors += 1;
                let value = serde_json::to_value(&record)
                    .unwrap_or_else(|_| serde_json::Value::String(record.to_string()));
                eprintln!("{}", self.render(&value));
            }
        }
    }
}

/// Run one operation with an interactive confirmation prompt.
async fn run_invoke(
    config: AwsopConfig,
    command: &str,
    args: &[String],
    compact: bool,
    cancel: CancellationToken,
) -> Result<ExitCode> {
    let registry = OperationRegistry::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to build operation registry: {}", e))?;
    let gate = ConfirmationGate::new(registry.confirm_impact(), Arc::new(TerminalPrompt));
    let mut sink = ConsoleSink {
        compact,
        errors: 0,
    };

    let outcome = match registry
        .invoke_tokens(command, args, &gate, &mut sink, &cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(e @ ShimError::Cancelled(_)) => {
            tracing::warn!(error = %e, "invocation cancelled");
            // A confirmation prompt may still be blocked on stdin; runtime
            // shutdown would wait for it
            std::process::exit(130);
        }
        Err(e) => return Err(anyhow::anyhow!("{}", e)),
    };

    tracing::debug!(?outcome, errors = sink.errors, "invoke finished");
    Ok(match outcome {
        Outcome::Failed { .. } => ExitCode::FAILURE,
        Outcome::Completed { .. } | Outcome::Declined => ExitCode::SUCCESS,
    })
}

fn run_list(config: AwsopConfig, service: Option<&str>) -> Result<()> {
    let registry = OperationRegistry::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to build operation registry: {}", e))?;

    let ops: Vec<&Arc<OperationDescriptor>> = registry
        .operations()
        .iter()
        .filter(|d| service.is_none_or(|s| d.service.eq_ignore_ascii_case(s)))
        .collect();
    let width = ops.iter().map(|d| d.command.len()).max().unwrap_or(0);

    let mut stdout = std::io::stdout().lock();
    for desc in ops {
        writeln!(
            stdout,
            "{:<width$}  {:<6}  {}",
            desc.command,
            desc.impact().to_string(),
            desc.alias(),
            width = width
        )?;
    }
    Ok(())
}

fn run_describe(config: AwsopConfig, command: &str, json: bool) -> Result<()> {
    let registry = OperationRegistry::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to build operation registry: {}", e))?;
    let desc = registry
        .resolve(command)
        .ok_or_else(|| anyhow::anyhow!("{}", ShimError::UnknownCommand(command.to_string())))?;

    let mut stdout = std::io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(desc.as_ref())?)?;
        return Ok(());
    }

    writeln!(stdout, "{}  ({})", desc.command, desc.alias())?;
    if let Some(synopsis) = &desc.synopsis {
        writeln!(stdout, "  {}", synopsis)?;
    }
    writeln!(
        stdout,
        "  impact: {}   default output: {}   paginated: {}",
        desc.impact(),
        desc.default_selector,
        if desc.pagination.is_some() { "yes" } else { "no" }
    )?;
    if let Some(echo) = &desc.echo_param {
        writeln!(stdout, "  -PassThru returns: {}", echo)?;
    }
    writeln!(stdout, "  parameters:")?;
    for spec in &desc.params {
        let mut flags = Vec::new();
        if spec.required {
            flags.push("required".to_string());
        }
        if let Some(slot) = spec.position {
            flags.push(format!("position {}", slot));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        writeln!(
            stdout,
            "    -{} <{:?}>{}  {}",
            spec.name,
            spec.kind,
            flags,
            spec.description.as_deref().unwrap_or("")
        )?;
    }
    Ok(())
}

/// Start a Streamable HTTP MCP server exposing every operation.
///
/// Builds the registry, wraps it in AwsopMcpServer, spawns hot-reload when a
/// config file is in use, then serves via StreamableHttpService + axum.
async fn run_serve(
    config_path: Option<PathBuf>,
    host: String,
    port: u16,
    cancel: CancellationToken,
) -> Result<()> {
    let config = load_config(config_path.as_deref()).await?;
    let registry = OperationRegistry::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to build operation registry: {}", e))?;

    let server = AwsopMcpServer::new(registry);

    match config_path {
        Some(path) => {
            tokio::spawn(run_hot_reload(
                path,
                server.registry_handle(),
                server.peers_handle(),
                cancel.child_token(),
            ));
        }
        None => tracing::info!("no config file in use, hot-reload disabled"),
    }

    let session_manager = Arc::new(LocalSessionManager::default());
    let http_config = StreamableHttpServerConfig {
        cancellation_token: cancel.clone(),
        ..Default::default()
    };
    let server_for_factory = server.clone();
    let mcp_service = StreamableHttpService::new(
        move || Ok(server_for_factory.clone()),
        session_manager,
        http_config,
    );

    let app = Router::new().fallback(move |req: Request<axum::body::Body>| {
        let svc = mcp_service.clone();
        async move {
            match svc.oneshot(req).await {
                Ok(response) => response.into_response(),
                Err(e) => {
                    tracing::error!(error = ?e, "MCP service error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(host = %host, port = %port, "awsop HTTP server listening");
    tracing::info!("Connect your MCP client to http://{}:{}/mcp", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!("awsop HTTP server error: {}", e))?;

    tracing::info!("awsop HTTP server stopped");
    Ok(())
}

/// Serve the tools over stdin/stdout using rmcp's serve_with_ct.
async fn run_stdio(config: AwsopConfig, cancel: CancellationToken) -> Result<()> {
    let registry = OperationRegistry::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to build operation registry: {}", e))?;

    let server = AwsopMcpServer::new(registry);

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let running = server
        .serve_with_ct(transport, cancel.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize awsop stdio transport: {:?}", e))?;

    tracing::info!("awsop stdio transport initialized, waiting for messages");

    tokio::select! {
        result = running.waiting() => {
            match result {
                Ok(reason) => {
                    tracing::info!(?reason, "awsop stdio transport completed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "awsop stdio transport error");
                    return Err(anyhow::anyhow!("awsop stdio transport error: {}", e));
                }
            }
        }
        _ = cancel.cancelled() => {
            tracing::info!("awsop stdio transport cancelled");
        }
    }

    Ok(())
}

/// Resolve the config file: explicit flag → ./awsop.toml → ~/.config/awsop/awsop.toml.
///
/// `None` means no file exists and built-in defaults apply. An explicit path
/// that does not exist is an error.
fn resolve_config(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file {:?} does not exist", path));
        }
        return Ok(Some(path));
    }

    let local = Path::new("awsop.toml");
    if local.exists() {
        return Ok(Some(local.to_path_buf()));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("awsop").join("awsop.toml");
        if user.exists() {
            return Ok(Some(user));
        }
    }

    tracing::debug!("no awsop.toml found, using built-in defaults");
    Ok(None)
}

/// Load and parse awsop.toml, or return defaults when there is no file.
async fn load_config(config_path: Option<&Path>) -> Result<AwsopConfig> {
    let Some(config_path) = config_path else {
        return Ok(AwsopConfig::default());
    };
    let content = tokio::fs::read_to_string(config_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", config_path, e))?;
    let config: AwsopConfig = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", config_path, e))?;
    Ok(config)
}
