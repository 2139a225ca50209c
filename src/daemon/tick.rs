//! Maintenance tick - periodic daemon housekeeping
//!
//! Each tick announces newly terminal runs to subscribed clients and prunes
//! terminal runs that have aged past the retention window. Run state is
//! bookkeeping only, so a missed tick costs nothing but staleness.

use std::collections::HashSet;
use std::time::Duration;

use log::debug;

use crate::daemon::context::DaemonContext;
use crate::ipc::messages::DaemonEvent;

/// Configuration for the maintenance tick
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Interval between ticks
    pub tick_interval: Duration,
    /// How long terminal runs stay observable, milliseconds
    pub retention_ms: i64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            retention_ms: 60 * 60 * 1000,
        }
    }
}

/// Tick state tracked between ticks
#[derive(Debug, Default)]
pub struct TickState {
    /// Number of ticks since start
    pub tick_count: u64,
    /// Terminal runs already announced as finished
    announced: HashSet<String>,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Runs announced as finished this tick
    pub announced: usize,
    /// Terminal runs pruned this tick
    pub pruned: usize,
}

/// Run one maintenance tick
pub async fn tick(ctx: &DaemonContext, state: &mut TickState, config: &TickConfig) -> TickOutcome {
    state.tick_count += 1;

    let runs = ctx.supervisor.list_runs().await;

    let mut announced = 0;
    for run in &runs {
        if run.status.is_terminal() && state.announced.insert(run.id.clone()) {
            ctx.broadcast(DaemonEvent::run_finished(run));
            announced += 1;
        }
    }

    let pruned = ctx.supervisor.prune_terminal(config.retention_ms).await;
    if pruned > 0 {
        // Forget announcements for runs no longer tracked
        let tracked: HashSet<String> = ctx
            .supervisor
            .list_runs()
            .await
            .into_iter()
            .map(|run| run.id)
            .collect();
        state.announced.retain(|id| tracked.contains(id));
        debug!("pruned {} terminal runs", pruned);
    }

    TickOutcome { announced, pruned }
}
