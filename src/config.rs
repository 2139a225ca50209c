//! Configuration for themr.
//!
//! Loaded from an explicit path, .themr.yml in the current directory, or
//! ~/.config/themr/themr.yml, falling back to defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemrConfig {
    /// Worker process and run lifecycle settings.
    pub supervisor: SupervisorSettings,

    /// Theme registry settings.
    pub registry: RegistrySettings,

    /// IPC socket settings.
    pub ipc: IpcSettings,

    /// Storage settings.
    pub storage: StorageSettings,
}

impl ThemrConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .themr.yml in current directory
    /// 3. ~/.config/themr/themr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project config
        let project_config = PathBuf::from(".themr.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .themr.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .themr.yml: {}", e);
                }
            }
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("themr").join("themr.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.supervisor.max_iterations == 0 {
            eyre::bail!("supervisor.max-iterations must be > 0");
        }
        if self.supervisor.default_iterations == 0
            || self.supervisor.default_iterations > self.supervisor.max_iterations
        {
            eyre::bail!("supervisor.default-iterations must be in [1, max-iterations]");
        }
        if self.supervisor.worker_command.trim().is_empty() {
            eyre::bail!("supervisor.worker-command must not be empty");
        }
        if self.registry.max_list_limit == 0 {
            eyre::bail!("registry.max-list-limit must be > 0");
        }
        if self.ipc.max_clients == 0 {
            eyre::bail!("ipc.max-clients must be > 0");
        }
        Ok(())
    }
}

/// Worker process and run lifecycle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SupervisorSettings {
    /// Program invoked as `<command> <goal> <iterations>`.
    pub worker_command: String,

    /// Iteration budget when the caller supplies none.
    pub default_iterations: u32,

    /// Upper bound any requested budget is clamped to.
    pub max_iterations: u32,

    /// Maximum worker wall-clock lifetime in milliseconds; unset leaves the
    /// worker unbounded.
    pub max_lifetime_ms: Option<u64>,

    /// How long terminal runs stay observable before pruning, milliseconds.
    pub retention_ms: i64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            worker_command: "themr-worker".to_string(),
            default_iterations: 3,
            max_iterations: 10,
            max_lifetime_ms: Some(15 * 60 * 1000),
            retention_ms: 60 * 60 * 1000,
        }
    }
}

/// Theme registry settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistrySettings {
    /// Identity id bound to writes without an owner hint. Created at daemon
    /// startup when missing.
    pub agent_identity: Option<String>,

    /// Default and upper bound for list page sizes.
    pub max_list_limit: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            agent_identity: Some("usr-agent".to_string()),
            max_list_limit: 50,
        }
    }
}

/// IPC socket settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IpcSettings {
    /// Path to the daemon's Unix socket.
    pub socket_path: PathBuf,

    /// Maximum number of concurrent clients.
    pub max_clients: usize,
}

impl Default for IpcSettings {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/themr-daemon.sock"),
            max_clients: 16,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageSettings {
    /// Registry data directory. Defaults to `<data_local_dir>/themr`.
    pub data_dir: Option<PathBuf>,
}

impl StorageSettings {
    /// Resolve the effective data directory.
    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("themr"),
        }
    }
}
