//! Daemon Core - request routing and the long-running server loop
//!
//! The daemon is the long-running process that:
//! - Serves the IPC socket and routes requests to handlers
//! - Supervises generation workers through the run supervisor
//! - Runs a maintenance tick to announce and prune terminal runs

pub mod context;
pub mod handlers;
pub mod tick;

pub use context::DaemonContext;
pub use tick::{tick, TickConfig, TickOutcome, TickState};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use serde_json::json;

use crate::config::ThemrConfig;
use crate::error::Result;
use crate::ipc::messages::{DaemonError, DaemonRequest, DaemonResponse, Methods};
use crate::ipc::server::{IpcServer, IpcServerConfig, RequestHandler};

/// Default daemon socket path
pub fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/themr-daemon.sock")
}

/// Routes IPC requests to the per-method handlers
pub struct DaemonHandler {
    ctx: Arc<DaemonContext>,
}

impl DaemonHandler {
    /// Create a handler over the shared context
    pub fn new(ctx: Arc<DaemonContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl RequestHandler for DaemonHandler {
    async fn handle(&self, request: DaemonRequest) -> DaemonResponse {
        let DaemonRequest { id, method, params } = request;
        match method.as_str() {
            Methods::PING => DaemonResponse::success(id, json!({"pong": true})),
            Methods::RUN_START => handlers::handle_run_start(id, &params, &self.ctx).await,
            Methods::RUN_GET => handlers::handle_run_get(id, &params, &self.ctx).await,
            Methods::RUN_LIST => handlers::handle_run_list(id, &self.ctx).await,
            Methods::THEME_LIST => handlers::handle_theme_list(id, &params, &self.ctx).await,
            Methods::THEME_UPSERT => handlers::handle_theme_upsert(id, &params, &self.ctx).await,
            Methods::IDENTITY_ADD => handlers::handle_identity_add(id, &params, &self.ctx).await,
            Methods::IDENTITY_LIST => handlers::handle_identity_list(id, &self.ctx).await,
            other => DaemonResponse::error(id, DaemonError::method_not_found(other)),
        }
    }
}

/// Run the daemon until the server loop exits.
///
/// Binds the IPC socket, wires the shared context into the server's event
/// channel, and spawns the maintenance tick.
pub async fn run_daemon(config: ThemrConfig) -> Result<()> {
    let server_config = IpcServerConfig::default()
        .with_socket_path(&config.ipc.socket_path)
        .with_max_clients(config.ipc.max_clients);
    let mut server = IpcServer::with_config(server_config);

    let ctx = Arc::new(DaemonContext::new(&config, server.event_sender())?);
    let handler = Arc::new(DaemonHandler::new(Arc::clone(&ctx)));

    let tick_config = TickConfig {
        retention_ms: config.supervisor.retention_ms,
        ..Default::default()
    };
    let tick_ctx = Arc::clone(&ctx);
    tokio::spawn(async move {
        let mut state = TickState::default();
        let mut interval = tokio::time::interval(tick_config.tick_interval);
        loop {
            interval.tick().await;
            tick::tick(&tick_ctx, &mut state, &tick_config).await;
        }
    });

    info!("daemon listening on {}", config.ipc.socket_path.display());
    server.run(handler).await
}
