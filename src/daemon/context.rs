//! Daemon context - shared state for request handlers
//!
//! DaemonContext owns the components every handler needs: the run
//! supervisor, the theme registry, and the event broadcast channel shared
//! with the IPC server.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::ThemrConfig;
use crate::error::Result;
use crate::ipc::messages::DaemonEvent;
use crate::registry::{RegistryConfig, ThemeRegistry};
use crate::storage::JsonlStorage;
use crate::supervisor::{RunSupervisor, WorkerConfig};

/// Shared context for all daemon request handlers
pub struct DaemonContext {
    /// Run launch and lifecycle observation
    pub supervisor: Arc<RunSupervisor>,
    /// Theme persistence with owner integrity
    pub registry: Arc<ThemeRegistry<JsonlStorage>>,
    /// Event broadcasting to subscribed clients
    pub event_tx: broadcast::Sender<DaemonEvent>,
}

impl DaemonContext {
    /// Create a new DaemonContext with all components initialized.
    ///
    /// The event sender is shared with the IPC server so handler broadcasts
    /// reach subscribed clients.
    pub fn new(config: &ThemrConfig, event_tx: broadcast::Sender<DaemonEvent>) -> Result<Self> {
        let data_dir = config.storage.resolve_data_dir();
        let storage = Arc::new(JsonlStorage::new(data_dir.join("registry"))?);

        let registry = Arc::new(ThemeRegistry::new(
            storage,
            RegistryConfig {
                agent_identity: config.registry.agent_identity.clone(),
                max_list_limit: config.registry.max_list_limit,
            },
        ));

        // Deterministic owner binding for worker-originated writes
        registry.ensure_agent_identity()?;

        let supervisor = Arc::new(RunSupervisor::new(WorkerConfig {
            command: config.supervisor.worker_command.clone(),
            default_iterations: config.supervisor.default_iterations,
            max_iterations: config.supervisor.max_iterations,
            max_lifetime_ms: config.supervisor.max_lifetime_ms,
            socket_path: Some(config.ipc.socket_path.clone()),
        }));

        Ok(Self {
            supervisor,
            registry,
            event_tx,
        })
    }

    /// Broadcast an event to all subscribed clients
    pub fn broadcast(&self, event: DaemonEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Get a receiver for events
    pub fn subscribe(&self) -> broadcast::Receiver<DaemonEvent> {
        self.event_tx.subscribe()
    }
}
