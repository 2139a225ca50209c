//! IPC client for callers to communicate with the daemon.
//!
//! Used by the CLI and by generation workers (which find the socket path in
//! the THEMR_SOCKET environment variable). Provides request/response
//! correlation and event subscription over the newline-delimited JSON
//! framing.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::codec::Framed;

use crate::error::{Result, ThemrError};
use crate::ipc::codec::NdJsonCodec;
use crate::ipc::messages::{DaemonEvent, DaemonRequest, DaemonResponse, IpcMessage, Methods};

/// Configuration for IPC client.
#[derive(Debug, Clone)]
pub struct IpcClientConfig {
    /// Path to daemon Unix socket.
    pub socket_path: PathBuf,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for IpcClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/themr-daemon.sock"),
            request_timeout_ms: 30000,
        }
    }
}

impl IpcClientConfig {
    /// Create config with custom socket path.
    pub fn with_socket(path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: path.into(),
            ..Default::default()
        }
    }
}

type MessageSink = SplitSink<Framed<UnixStream, NdJsonCodec<IpcMessage>>, IpcMessage>;

/// Pending requests awaiting a response, keyed by request id
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<DaemonResponse>>>>;

/// IPC client for communicating with the daemon.
pub struct IpcClient {
    sink: Mutex<MessageSink>,
    pending: PendingMap,
    next_id: AtomicU64,
    request_timeout_ms: u64,
    events: Mutex<mpsc::Receiver<DaemonEvent>>,
}

impl IpcClient {
    /// Connect to the daemon socket.
    pub async fn connect(config: IpcClientConfig) -> Result<Self> {
        let stream = UnixStream::connect(&config.socket_path).await.map_err(|e| {
            ThemrError::Ipc(format!(
                "Failed to connect to {}: {}",
                config.socket_path.display(),
                e
            ))
        })?;

        let framed = Framed::new(stream, NdJsonCodec::<IpcMessage>::new());
        let (sink, mut messages) = framed.split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::channel(100);

        // Reader task: route responses to their pending request, queue events
        let reader_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                match message {
                    Ok(IpcMessage::Response(response)) => {
                        if let Some(tx) = reader_pending.lock().await.remove(&response.id) {
                            let _ = tx.send(response);
                        }
                    }
                    Ok(IpcMessage::Event(event)) => {
                        let _ = event_tx.send(event).await;
                    }
                    // The daemon never sends requests
                    Ok(IpcMessage::Request(_)) => {}
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            sink: Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            request_timeout_ms: config.request_timeout_ms,
            events: Mutex::new(event_rx),
        })
    }

    /// Connect using only a socket path.
    pub async fn connect_to(path: impl Into<PathBuf>) -> Result<Self> {
        Self::connect(IpcClientConfig::with_socket(path)).await
    }

    /// Send a request and wait for its response.
    ///
    /// Daemon-side errors come back as `ThemrError::Ipc` carrying the wire
    /// code and message.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.send(IpcMessage::Request(DaemonRequest::new(id, method, params))).await {
                self.pending.lock().await.remove(&id);
                return Err(ThemrError::Ipc(format!("Failed to send request: {}", e)));
            }
        }

        let response = match tokio::time::timeout(Duration::from_millis(self.request_timeout_ms), rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(ThemrError::Ipc("Connection closed before response".to_string()));
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(ThemrError::Ipc(format!("Request {} timed out", method)));
            }
        };

        match response.error {
            Some(error) => Err(ThemrError::Ipc(format!("{} (code {})", error.message, error.code))),
            None => Ok(response.result.unwrap_or(Value::Null)),
        }
    }

    /// Subscribe to daemon push events.
    pub async fn subscribe(&self) -> Result<()> {
        self.request(Methods::SUBSCRIBE, Value::Object(Default::default()))
            .await
            .map(|_| ())
    }

    /// Receive the next push event. Returns None once the connection closes.
    pub async fn next_event(&self) -> Option<DaemonEvent> {
        self.events.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::server::{IpcServer, IpcServerConfig, RequestHandler};
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct PongHandler;

    #[async_trait]
    impl RequestHandler for PongHandler {
        async fn handle(&self, request: DaemonRequest) -> DaemonResponse {
            match request.method.as_str() {
                "ping" => DaemonResponse::success(request.id, serde_json::json!({"pong": true})),
                other => DaemonResponse::error(
                    request.id,
                    crate::ipc::messages::DaemonError::method_not_found(other),
                ),
            }
        }
    }

    async fn start_server(socket_path: &std::path::Path) -> tokio::task::JoinHandle<()> {
        let config = IpcServerConfig::default().with_socket_path(socket_path);
        let mut server = IpcServer::with_config(config);
        let handle = tokio::spawn(async move {
            let _ = server.run(Arc::new(PongHandler)).await;
        });
        for _ in 0..100 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle
    }

    #[test]
    fn test_client_config_default() {
        let config = IpcClientConfig::default();
        assert_eq!(config.request_timeout_ms, 30000);
    }

    #[test]
    fn test_client_config_with_socket() {
        let config = IpcClientConfig::with_socket("/tmp/custom.sock");
        assert_eq!(config.socket_path, PathBuf::from("/tmp/custom.sock"));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let result = IpcClient::connect_to("/nonexistent/themr.sock").await;
        assert!(matches!(result, Err(ThemrError::Ipc(_))));
    }

    #[tokio::test]
    async fn test_request_response() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("client-test.sock");
        let server = start_server(&socket_path).await;

        let client = IpcClient::connect_to(&socket_path).await.unwrap();
        let result = client.request("ping", serde_json::json!({})).await.unwrap();
        assert_eq!(result["pong"], true);

        server.abort();
    }

    #[tokio::test]
    async fn test_unknown_method_is_error() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("client-test.sock");
        let server = start_server(&socket_path).await;

        let client = IpcClient::connect_to(&socket_path).await.unwrap();
        let result = client.request("nope", serde_json::json!({})).await;
        assert!(matches!(result, Err(ThemrError::Ipc(_))));

        server.abort();
    }

    #[tokio::test]
    async fn test_concurrent_requests_correlate() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("client-test.sock");
        let server = start_server(&socket_path).await;

        let client = Arc::new(IpcClient::connect_to(&socket_path).await.unwrap());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                client.request("ping", serde_json::json!({})).await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result["pong"], true);
        }

        server.abort();
    }
}
