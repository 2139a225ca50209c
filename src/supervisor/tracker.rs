//! In-memory run tracking
//!
//! Runs exist for observability only. The tracker is the supervisor's
//! single source of truth for run state and is pruned of old terminal runs
//! by the daemon maintenance tick.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::Run;
use crate::id::now_ms;

/// Tracks every run the supervisor has accepted, keyed by run id
#[derive(Debug, Default)]
pub struct RunTracker {
    runs: RwLock<HashMap<String, Run>>,
}

impl RunTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly created run
    pub async fn insert(&self, run: Run) {
        self.runs.write().await.insert(run.id.clone(), run);
    }

    /// Get a snapshot of a run by id
    pub async fn get(&self, id: &str) -> Option<Run> {
        self.runs.read().await.get(id).cloned()
    }

    /// List snapshots of all tracked runs, most recently created first
    pub async fn list(&self) -> Vec<Run> {
        let mut runs: Vec<Run> = self.runs.read().await.values().cloned().collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs
    }

    /// Number of tracked runs
    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Whether the tracker holds no runs
    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }

    /// Transition a run to Running
    pub async fn mark_running(&self, id: &str) {
        if let Some(run) = self.runs.write().await.get_mut(id) {
            run.mark_running();
        }
    }

    /// Record a worker exit for a run
    pub async fn mark_exited(&self, id: &str, code: Option<i32>) {
        if let Some(run) = self.runs.write().await.get_mut(id) {
            run.mark_exited(code);
        }
    }

    /// Mark a run failed without a worker exit
    pub async fn mark_failed(&self, id: &str) {
        if let Some(run) = self.runs.write().await.get_mut(id) {
            run.mark_failed();
        }
    }

    /// Remove terminal runs older than the retention window.
    ///
    /// A run is removed once it has been terminal for at least
    /// `retention_ms`. Returns the number of runs removed.
    pub async fn prune_terminal(&self, retention_ms: i64) -> usize {
        let now = now_ms();
        let mut runs = self.runs.write().await;
        let before = runs.len();
        runs.retain(|_, run| {
            if !run.status.is_terminal() {
                return true;
            }
            let ended = run.ended_at.unwrap_or(run.created_at);
            now - ended < retention_ms
        });
        before - runs.len()
    }
}
