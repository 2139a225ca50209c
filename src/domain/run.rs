//! Run record and lifecycle states
//!
//! A Run is a single invocation of the generation loop for a goal. Runs are
//! owned by the supervisor's in-memory tracker and are never persisted to
//! the registry; they exist for observability, not for correctness of
//! generation.

use crate::id::{generate_run_id, now_ms};
use serde::{Deserialize, Serialize};

/// One invocation of the generation loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier ("run-1738300800123-a1b2")
    pub id: String,

    /// Caller-supplied intent, non-empty after trimming
    pub goal: String,

    /// Iteration budget passed to the worker, already clamped
    pub iterations: u32,

    /// Current lifecycle state
    pub status: RunStatus,

    /// Worker exit code, when the worker exited with one
    pub exit_code: Option<i32>,

    /// Set when the worker process starts
    pub started_at: Option<i64>,

    /// Set when the run reaches a terminal state
    pub ended_at: Option<i64>,

    pub created_at: i64,
}

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Accepted, worker not yet started
    Queued,
    /// Worker process is running
    Running,
    /// Worker exited with code 0
    Succeeded,
    /// Worker exited nonzero, was killed, or failed to spawn
    Failed,
}

impl RunStatus {
    /// Returns true if the run is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

impl Run {
    /// Create a new queued run for a goal
    pub fn new(goal: &str, iterations: u32) -> Self {
        Self {
            id: generate_run_id(),
            goal: goal.to_string(),
            iterations,
            status: RunStatus::Queued,
            exit_code: None,
            started_at: None,
            ended_at: None,
            created_at: now_ms(),
        }
    }

    /// Transition to Running when the worker process starts
    pub fn mark_running(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(now_ms());
    }

    /// Record the worker's exit. Code 0 is success, anything else
    /// (including a missing code after a signal kill) is failure.
    pub fn mark_exited(&mut self, code: Option<i32>) {
        self.status = if code == Some(0) {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };
        self.exit_code = code;
        self.ended_at = Some(now_ms());
    }

    /// Mark the run failed without a worker exit (spawn failure, forced kill)
    pub fn mark_failed(&mut self) {
        self.status = RunStatus::Failed;
        self.ended_at = Some(now_ms());
    }
}
