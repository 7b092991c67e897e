//! AwsopMcpServer: rmcp ServerHandler backed by OperationRegistry.
//!
//! The registry is stored behind an `Arc<RwLock<Arc<OperationRegistry>>>` so
//! the hot-reload task can swap the inner registry while every session shares
//! the outer handle. Connected peers are kept so hot-reload can broadcast
//! tools-list-changed after each swap.

use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{NotificationContext, Peer, RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use tokio::sync::RwLock;

use crate::error::ShimError;
use crate::OperationRegistry;

/// MCP server exposing one tool per registered operation.
///
/// `StreamableHttpService` calls the factory closure per session; each clone
/// shares the same outer `Arc`s, so a reload reaches every session.
#[derive(Clone)]
pub struct AwsopMcpServer {
    registry: Arc<RwLock<Arc<OperationRegistry>>>,
    /// Stale peers are pruned on notification error.
    peers: Arc<tokio::sync::Mutex<Vec<Peer<RoleServer>>>>,
}

impl AwsopMcpServer {
    pub fn new(registry: OperationRegistry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Arc::new(registry))),
            peers: Arc::new(tokio::sync::Mutex::new(Vec::new())),
        }
    }

    /// Registry handle for the hot-reload task.
    pub fn registry_handle(&self) -> Arc<RwLock<Arc<OperationRegistry>>> {
        self.registry.clone()
    }

    /// Peers handle for the hot-reload task.
    pub fn peers_handle(&self) -> Arc<tokio::sync::Mutex<Vec<Peer<RoleServer>>>> {
        self.peers.clone()
    }

    /// Snapshot of the current registry. Calls run against the snapshot, so a
    /// reload never waits for in-flight remote calls.
    async fn current(&self) -> Arc<OperationRegistry> {
        self.registry.read().await.clone()
    }
}

impl ServerHandler for AwsopMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "awsop".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "AWS Resource Access Manager and Incident Manager operations as tools. \
                 Mutating tools require \"Force\": true."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let registry = self.current().await;
        Ok(ListToolsResult {
            tools: registry.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let registry = self.current().await;
        registry
            .call_tool(&request.name, request.arguments, &context.ct)
            .await
            .map_err(|e| match e {
                ShimError::Protocol(..) | ShimError::UnknownCommand(_) => {
                    McpError::invalid_params(e.to_string(), None)
                }
                other => McpError::internal_error(other.to_string(), None),
            })
    }

    async fn on_initialized(&self, context: NotificationContext<RoleServer>) {
        tracing::info!("MCP client initialized, storing peer for hot-reload notifications");
        self.peers.lock().await.push(context.peer.clone());
    }
}
