//! Local control socket
//!
//! Newline-delimited JSON over a Unix domain socket: one [`Request`] per line
//! in, one [`Response`] per line out. Each connection gets its own task;
//! requests run on the blocking pool because a trigger blocks for the whole
//! key sequence.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::constants::config::SOCKET_FILENAME;
use crate::control::protocol::{Request, Response};
use crate::control::surface::ControlSurface;

/// Default socket location: next to the config file
pub fn default_socket_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join(SOCKET_FILENAME))
        .unwrap_or_else(|| PathBuf::from(SOCKET_FILENAME))
}

pub struct ControlServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl ControlServer {
    /// Bind the socket, replacing a stale one left by a previous run
    /// Must be called from within a tokio runtime.
    pub fn bind(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {}", parent.display()))?;
        }

        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .with_context(|| format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only: anyone who can connect can type on this machine
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        info!(path = %socket_path.display(), "Control socket listening");
        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Serve until Ctrl-C
    pub async fn run(self, surface: ControlSurface) -> Result<()> {
        self.run_until(surface, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` completes; the socket file is removed on return
    pub async fn run_until(
        self,
        surface: ControlSurface,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let surface = surface.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_client(stream, surface).await {
                                    warn!(error = %e, "Control client error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Accept error");
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn handle_client(stream: UnixStream, surface: ControlSurface) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    debug!("Control client connected");

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let surface = surface.clone();
                tokio::task::spawn_blocking(move || surface.handle(request))
                    .await
                    .unwrap_or_else(|e| {
                        error!(error = %e, "Request handler panicked");
                        Response::error("internal", "request handler panicked")
                    })
            }
            Err(e) => {
                warn!(error = %e, "Malformed control request");
                Response::error("parse_error", e.to_string())
            }
        };

        let mut output = serde_json::to_string(&response)?;
        output.push('\n');
        writer.write_all(output.as_bytes()).await?;
    }

    debug!("Control client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConfigStore;
    use crate::trigger::TriggerEngine;
    use crate::trigger::engine::tests::RecordingInjector;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[test]
    fn test_default_socket_path_next_to_config() {
        let path = default_socket_path(Path::new("/tmp/deck/config.json"));
        assert_eq!(path, PathBuf::from("/tmp/deck/mobile-deck.sock"));
    }

    async fn roundtrip(
        reader: &mut BufReader<tokio::net::unix::OwnedReadHalf>,
        writer: &mut tokio::net::unix::OwnedWriteHalf,
        line: &str,
    ) -> serde_json::Value {
        writer.write_all(line.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        let mut response = String::new();
        reader.read_line(&mut response).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[tokio::test]
    async fn test_serves_requests_and_removes_socket() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ConfigStore::load(temp_dir.path().join("config.json")));
        let injector = Arc::new(RecordingInjector::default());
        let surface = ControlSurface::new(store, Arc::new(TriggerEngine::new(injector.clone())));

        let socket_path = temp_dir.path().join("deck.sock");
        let server = ControlServer::bind(socket_path.clone()).unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run_until(surface, async {
            let _ = stop_rx.await;
        }));

        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let snapshot = roundtrip(&mut reader, &mut writer, r#"{"type":"snapshot"}"#).await;
        assert_eq!(snapshot["status"], "snapshot");
        assert_eq!(snapshot["activeProfile"], "Default");

        let fired = roundtrip(
            &mut reader,
            &mut writer,
            r#"{"type":"trigger","id":0,"hotkey":["ctrl","c"]}"#,
        )
        .await;
        assert_eq!(fired["status"], "triggered");
        assert_eq!(fired["intents"], 4);
        assert_eq!(injector.sent().len(), 4);

        let bad = roundtrip(&mut reader, &mut writer, "not json").await;
        assert_eq!(bad["status"], "error");
        assert_eq!(bad["kind"], "parse_error");

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert!(!socket_path.exists());
    }
}
