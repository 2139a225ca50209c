//! IPC Server - Unix socket server for daemon communication
//!
//! Provides:
//! - Unix stream socket listener
//! - Client connection handling
//! - Request routing and response sending
//! - Event broadcasting to subscribers

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};

use crate::error::{Result, ThemrError};
use crate::ipc::messages::{DaemonError, DaemonEvent, DaemonRequest, DaemonResponse, Methods};

/// Configuration for the IPC server
#[derive(Debug, Clone)]
pub struct IpcServerConfig {
    /// Path to the Unix socket
    pub socket_path: PathBuf,
    /// Maximum number of concurrent clients
    pub max_clients: usize,
    /// Channel capacity for events
    pub event_channel_capacity: usize,
}

impl Default for IpcServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/themr-daemon.sock"),
            max_clients: 16,
            event_channel_capacity: 256,
        }
    }
}

impl IpcServerConfig {
    /// Create config with custom socket path
    pub fn with_socket_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.socket_path = path.as_ref().to_path_buf();
        self
    }

    /// Set max clients
    pub fn with_max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }
}

/// Handler trait for processing requests
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle a request and return a response
    async fn handle(&self, request: DaemonRequest) -> DaemonResponse;
}

/// Connected client state
#[derive(Debug)]
struct ClientState {
    /// Whether client is subscribed to events
    subscribed: bool,
}

/// IPC Server for daemon communication
pub struct IpcServer {
    config: IpcServerConfig,
    /// Connected clients
    clients: Arc<RwLock<HashMap<u64, ClientState>>>,
    /// Event broadcaster
    event_tx: broadcast::Sender<DaemonEvent>,
    /// Next client ID
    next_client_id: Arc<RwLock<u64>>,
    /// Shutdown signal
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl IpcServer {
    /// Create a new IPC server with default config
    pub fn new() -> Self {
        Self::with_config(IpcServerConfig::default())
    }

    /// Create a new IPC server with custom config
    pub fn with_config(config: IpcServerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        Self {
            config,
            clients: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            next_client_id: Arc::new(RwLock::new(1)),
            shutdown_tx: None,
        }
    }

    /// Get the socket path
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Sender half of the event channel, for sharing with the daemon context
    pub fn event_sender(&self) -> broadcast::Sender<DaemonEvent> {
        self.event_tx.clone()
    }

    /// Broadcast an event to all subscribed clients
    pub fn broadcast(&self, event: DaemonEvent) -> Result<usize> {
        match self.event_tx.send(event) {
            Ok(count) => Ok(count),
            Err(_) => Ok(0), // No receivers
        }
    }

    /// Get count of connected clients
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Run the server with a request handler
    pub async fn run<H: RequestHandler + 'static>(&mut self, handler: Arc<H>) -> Result<()> {
        // Remove existing socket if present
        if self.config.socket_path.exists() {
            std::fs::remove_file(&self.config.socket_path)?;
        }

        // Ensure parent directory exists
        if let Some(parent) = self.config.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.config.socket_path)
            .map_err(|e| ThemrError::Ipc(format!("Failed to bind socket: {}", e)))?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let client_count = self.clients.read().await.len();
                            if client_count >= self.config.max_clients {
                                // Reject connection - at capacity
                                continue;
                            }

                            let client_id = {
                                let mut id = self.next_client_id.write().await;
                                let current = *id;
                                *id += 1;
                                current
                            };

                            // Register client
                            {
                                let mut clients = self.clients.write().await;
                                clients.insert(client_id, ClientState { subscribed: false });
                            }

                            // Spawn client handler
                            let handler_clone = Arc::clone(&handler);
                            let clients = Arc::clone(&self.clients);
                            let event_rx = self.event_tx.subscribe();

                            tokio::spawn(async move {
                                let _ = handle_client(
                                    stream,
                                    client_id,
                                    handler_clone,
                                    clients,
                                    event_rx,
                                ).await;
                            });
                        }
                        Err(e) => {
                            warn!("accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        // Cleanup socket
        let _ = std::fs::remove_file(&self.config.socket_path);
        Ok(())
    }

    /// Signal the server to shutdown
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(()).await;
        }
        Ok(())
    }
}

impl Default for IpcServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle a single client connection
async fn handle_client<H: RequestHandler>(
    stream: UnixStream,
    client_id: u64,
    handler: Arc<H>,
    clients: Arc<RwLock<HashMap<u64, ClientState>>>,
    mut event_rx: broadcast::Receiver<DaemonEvent>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        tokio::select! {
            // Handle incoming requests
            read_result = reader.read_line(&mut line) => {
                match read_result {
                    Ok(0) => break, // EOF - client disconnected
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            line.clear();
                            continue;
                        }

                        let response = match serde_json::from_str::<DaemonRequest>(trimmed) {
                            Ok(request) => {
                                if request.method == Methods::SUBSCRIBE {
                                    let mut clients = clients.write().await;
                                    if let Some(state) = clients.get_mut(&client_id) {
                                        state.subscribed = true;
                                    }
                                    DaemonResponse::success(request.id, serde_json::json!({"subscribed": true}))
                                } else {
                                    handler.handle(request).await
                                }
                            }
                            Err(e) => DaemonResponse::error(
                                0,
                                DaemonError::parse_error(format!("Parse error: {}", e)),
                            ),
                        };

                        let response_json = serde_json::to_string(&response).unwrap_or_default();
                        let _ = writer.write_all(response_json.as_bytes()).await;
                        let _ = writer.write_all(b"\n").await;
                        line.clear();
                    }
                    Err(_) => break,
                }
            }
            // Forward events to subscribed clients
            event_result = event_rx.recv() => {
                match event_result {
                    Ok(event) => {
                        let is_subscribed = {
                            let clients = clients.read().await;
                            clients.get(&client_id).is_some_and(|s| s.subscribed)
                        };
                        if is_subscribed {
                            let event_json = serde_json::to_string(&event).unwrap_or_default();
                            if writer.write_all(event_json.as_bytes()).await.is_err() {
                                break;
                            }
                            if writer.write_all(b"\n").await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Client lagged behind, continue
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    // Remove client on disconnect
    {
        let mut clients = clients.write().await;
        clients.remove(&client_id);
    }

    Ok(())
}
