//! Hot-reload for `awsop serve`.
//!
//! Watches awsop.toml with `notify`. Each change (debounced 100ms) re-reads
//! the config and rebuilds the OperationRegistry; on success the inner
//! `Arc<OperationRegistry>` is swapped and every connected peer gets a
//! tools-list-changed notification. A failed reload keeps the previous
//! registry and logs a warning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use rmcp::service::{Peer, RoleServer};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::AwsopConfig;
use crate::error::ShimError;
use crate::OperationRegistry;

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Watch `config_path` and reload the registry on each change until `cancel`
/// fires.
pub async fn run_hot_reload(
    config_path: PathBuf,
    registry_handle: Arc<RwLock<Arc<OperationRegistry>>>,
    peers_handle: Arc<tokio::sync::Mutex<Vec<Peer<RoleServer>>>>,
    cancel: CancellationToken,
) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<notify::Result<notify::Event>>();

    // notify's EventHandler is implemented for FnMut but not for tokio senders
    let mut watcher = match notify::recommended_watcher(move |event| {
        let _ = tx.send(event);
    }) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(error = %e, "failed to create file watcher for hot-reload");
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_path, RecursiveMode::NonRecursive) {
        tracing::error!(
            path = %config_path.display(),
            error = %e,
            "failed to watch config file for hot-reload"
        );
        return;
    }

    // Dropping the watcher silently stops events
    let _watcher = watcher;

    tracing::info!(path = %config_path.display(), "hot-reload watching config file");

    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = cancel.cancelled() => {
                tracing::debug!("hot-reload cancelled");
                return;
            }
        };

        match event {
            Some(Ok(_)) => {
                tokio::time::sleep(DEBOUNCE).await;
                while rx.try_recv().is_ok() {}

                match reload_registry(&config_path).await {
                    Ok(new_registry) => {
                        let operations = new_registry.operation_count();
                        *registry_handle.write().await = Arc::new(new_registry);
                        tracing::info!(
                            operations = %operations,
                            path = %config_path.display(),
                            "config reloaded"
                        );
                        notify_peers(&peers_handle).await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            path = %config_path.display(),
                            "hot-reload failed, keeping previous config"
                        );
                    }
                }
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "file watcher error during hot-reload");
            }
            None => {
                tracing::debug!("hot-reload watcher channel closed");
                return;
            }
        }
    }
}

/// Send tools-list-changed to every peer, dropping peers whose transport is gone.
async fn notify_peers(peers_handle: &Arc<tokio::sync::Mutex<Vec<Peer<RoleServer>>>>) {
    let mut peers = peers_handle.lock().await;
    let mut live_peers = Vec::with_capacity(peers.len());
    for peer in peers.drain(..) {
        match peer.notify_tool_list_changed().await {
            Ok(_) => live_peers.push(peer),
            Err(e) => {
                tracing::debug!(error = %e, "pruning stale peer after tools-list-changed error");
            }
        }
    }
    *peers = live_peers;
}

async fn reload_registry(config_path: &Path) -> crate::Result<OperationRegistry> {
    let content = tokio::fs::read_to_string(config_path)
        .await
        .map_err(|e| ShimError::InvalidConfig("hot-reload".into(), e.to_string()))?;
    let config = AwsopConfig::from_toml(&content).map_err(|e| match e {
        ShimError::InvalidConfig(_, msg) => ShimError::InvalidConfig("hot-reload".into(), msg),
        other => other,
    })?;
    OperationRegistry::from_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_reload_registry_empty_config() {
        let mut temp = NamedTempFile::new().expect("create temp file");
        writeln!(temp, "# empty awsop.toml").expect("write to temp file");

        let registry = reload_registry(temp.path())
            .await
            .expect("empty config should reload");
        assert_eq!(registry.operation_count(), 65);
    }

    #[tokio::test]
    async fn test_reload_registry_invalid_toml() {
        let mut temp = NamedTempFile::new().expect("create temp file");
        writeln!(temp, "this is not valid toml {{{{").expect("write to temp file");

        let err = reload_registry(temp.path()).await.err().expect("should fail");
        assert!(
            err.to_string().contains("hot-reload"),
            "error should mention hot-reload: {}",
            err
        );
    }

    #[tokio::test]
    async fn test_reload_registry_missing_file() {
        let path = PathBuf::from("/nonexistent/path/awsop.toml");
        assert!(reload_registry(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_reload_registry_respects_services() {
        let mut temp = NamedTempFile::new().expect("create temp file");
        writeln!(
            temp,
            r#"
services = ["ssm-incidents"]

[backend]
region = "us-west-2"
"#
        )
        .expect("write");

        let registry = reload_registry(temp.path()).await.expect("valid config");
        assert_eq!(registry.operation_count(), 31);
        assert_eq!(registry.client().default_region(), Some("us-west-2"));
    }

    #[tokio::test]
    async fn test_notify_peers_empty_vec() {
        let peers: Arc<tokio::sync::Mutex<Vec<Peer<RoleServer>>>> =
            Arc::new(tokio::sync::Mutex::new(Vec::new()));
        notify_peers(&peers).await;
        assert!(peers.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_watcher() {
        let temp = NamedTempFile::new().expect("create temp file");
        let server = crate::AwsopMcpServer::new(
            OperationRegistry::from_config(AwsopConfig::default()).expect("defaults"),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_hot_reload(
            temp.path().to_path_buf(),
            server.registry_handle(),
            server.peers_handle(),
            cancel.clone(),
        ));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("hot-reload should stop on cancel")
            .expect("task should not panic");
    }
}
