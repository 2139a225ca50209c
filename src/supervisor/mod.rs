//! Run supervisor - detached worker launch and lifecycle observation
//!
//! The supervisor accepts a generation request, spawns exactly one worker
//! process per request, and returns immediately: the caller contract is
//! fire-and-forget. Worker stdout/stderr are captured line-by-line into the
//! log sink, tagged with the run id, and never parsed for control
//! decisions. A single waiter task observes the worker's exit and records
//! the run's terminal state. No restart or retry is attempted.
//!
//! Runs impose no mutual exclusion on each other; registry serialization,
//! not the supervisor, is what keeps concurrent writers safe.

pub mod tracker;

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::domain::Run;
use crate::error::{Result, ThemrError};

pub use tracker::RunTracker;

/// Configuration for worker processes
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Program invoked as `<command> <goal> <iterations>`
    pub command: String,

    /// Iteration budget when the caller supplies none
    pub default_iterations: u32,

    /// Upper bound any requested budget is clamped to
    pub max_iterations: u32,

    /// Maximum worker wall-clock lifetime; the worker is killed and the run
    /// marked failed once it is exceeded. None leaves the worker unbounded.
    pub max_lifetime_ms: Option<u64>,

    /// Daemon socket exported to the worker as THEMR_SOCKET so it can call
    /// theme.upsert
    pub socket_path: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: "themr-worker".to_string(),
            default_iterations: 3,
            max_iterations: 10,
            max_lifetime_ms: None,
            socket_path: None,
        }
    }
}

/// Acknowledgment returned to the caller at spawn time.
///
/// Holding a handle promises nothing about eventual results; it only names
/// the run for later observation.
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub run_id: String,
}

/// Launches and observes detached generation workers
pub struct RunSupervisor {
    config: WorkerConfig,
    tracker: Arc<RunTracker>,
}

impl RunSupervisor {
    /// Create a supervisor with the given worker configuration
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            tracker: Arc::new(RunTracker::new()),
        }
    }

    /// The run tracker, shared with the daemon for observation and pruning
    pub fn tracker(&self) -> Arc<RunTracker> {
        Arc::clone(&self.tracker)
    }

    /// Clamp a requested iteration budget into the configured bounds
    pub fn clamp_iterations(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.config.default_iterations)
            .clamp(1, self.config.max_iterations)
    }

    /// Start a generation run for a goal.
    ///
    /// Returns as soon as the worker is spawned. An empty goal or a spawn
    /// failure is reported synchronously; anything that happens during the
    /// run only ever lands in run state and logs.
    pub async fn start_run(&self, goal: &str, iterations: Option<u32>) -> Result<RunHandle> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(ThemrError::InvalidInput("goal must not be empty".to_string()));
        }

        let iterations = self.clamp_iterations(iterations);
        let run = Run::new(goal, iterations);
        let run_id = run.id.clone();
        self.tracker.insert(run).await;

        let mut cmd = Command::new(&self.config.command);
        cmd.arg(goal)
            .arg(iterations.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(socket) = &self.config.socket_path {
            cmd.env("THEMR_SOCKET", socket);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.tracker.mark_failed(&run_id).await;
                return Err(ThemrError::Spawn(format!(
                    "failed to launch worker {}: {}",
                    self.config.command, e
                )));
            }
        };

        self.tracker.mark_running(&run_id).await;
        info!("[{}] started worker for goal: {}", run_id, goal);

        // Diagnostic stream capture, one task per stream. Per-stream line
        // order is preserved; no ordering exists across the two streams.
        if let Some(stdout) = child.stdout.take() {
            let id = run_id.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!("[{}] stdout: {}", id, line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let id = run_id.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[{}] stderr: {}", id, line);
                }
            });
        }

        // Exit watcher: the one and only subscription to the worker's exit
        let tracker = Arc::clone(&self.tracker);
        let max_lifetime_ms = self.config.max_lifetime_ms;
        let id = run_id.clone();
        tokio::spawn(async move {
            let wait_result = match max_lifetime_ms {
                Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), child.wait()).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("[{}] worker exceeded max lifetime of {} ms, killing", id, ms);
                        let _ = child.kill().await;
                        tracker.mark_failed(&id).await;
                        return;
                    }
                },
                None => child.wait().await,
            };

            match wait_result {
                Ok(status) => {
                    let code = status.code();
                    info!("[{}] worker exited with code {:?}", id, code);
                    tracker.mark_exited(&id, code).await;
                }
                Err(e) => {
                    error!("[{}] failed to observe worker exit: {}", id, e);
                    tracker.mark_failed(&id).await;
                }
            }
        });

        Ok(RunHandle { run_id })
    }

    /// Get a snapshot of a tracked run
    pub async fn get_run(&self, id: &str) -> Result<Run> {
        self.tracker
            .get(id)
            .await
            .ok_or_else(|| ThemrError::RunNotFound(id.to_string()))
    }

    /// List snapshots of all tracked runs
    pub async fn list_runs(&self) -> Vec<Run> {
        self.tracker.list().await
    }

    /// Remove terminal runs older than the retention window
    pub async fn prune_terminal(&self, retention_ms: i64) -> usize {
        self.tracker.prune_terminal(retention_ms).await
    }
}
