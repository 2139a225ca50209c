//! Run request handlers
//!
//! Handles run.* IPC methods by delegating to the supervisor.

use serde_json::{json, Value};

use crate::daemon::context::DaemonContext;
use crate::ipc::messages::{DaemonError, DaemonEvent, DaemonResponse};

/// Handle run.start - launch a detached generation worker.
///
/// Returns as soon as the worker is spawned; the response carries only the
/// run id, never the eventual result.
pub async fn handle_run_start(id: u64, params: &Value, ctx: &DaemonContext) -> DaemonResponse {
    let goal = match params["goal"].as_str() {
        Some(goal) => goal,
        None => return DaemonResponse::error(id, DaemonError::invalid_params("Missing 'goal' parameter")),
    };
    let iterations = params["iterations"].as_u64().map(|n| n as u32);

    match ctx.supervisor.start_run(goal, iterations).await {
        Ok(handle) => {
            if let Ok(run) = ctx.supervisor.get_run(&handle.run_id).await {
                ctx.broadcast(DaemonEvent::run_started(&run));
            }
            DaemonResponse::success(
                id,
                json!({
                    "success": true,
                    "run_id": handle.run_id
                }),
            )
        }
        Err(e) => DaemonResponse::error(id, DaemonError::from_core(&e)),
    }
}

/// Handle run.get - get a single run snapshot by ID
pub async fn handle_run_get(id: u64, params: &Value, ctx: &DaemonContext) -> DaemonResponse {
    let run_id = match params["id"].as_str() {
        Some(id) => id,
        None => return DaemonResponse::error(id, DaemonError::invalid_params("Missing 'id' parameter")),
    };

    match ctx.supervisor.get_run(run_id).await {
        Ok(run) => match serde_json::to_value(&run) {
            Ok(value) => DaemonResponse::success(id, json!({"run": value})),
            Err(e) => DaemonResponse::error(id, DaemonError::internal_error(e.to_string())),
        },
        Err(e) => DaemonResponse::error(id, DaemonError::from_core(&e)),
    }
}

/// Handle run.list - list all tracked runs
pub async fn handle_run_list(id: u64, ctx: &DaemonContext) -> DaemonResponse {
    let runs = ctx.supervisor.list_runs().await;
    let runs_json: Vec<Value> = runs.iter().filter_map(|r| serde_json::to_value(r).ok()).collect();
    DaemonResponse::success(id, json!({"runs": runs_json}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemrConfig;
    use crate::domain::RunStatus;
    use crate::ipc::messages::ErrorCode;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    fn test_context(worker: &str) -> (DaemonContext, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut config = ThemrConfig::default();
        config.storage.data_dir = Some(temp.path().to_path_buf());
        config.supervisor.worker_command = worker.to_string();
        let (event_tx, _) = broadcast::channel(16);
        (DaemonContext::new(&config, event_tx).unwrap(), temp)
    }

    #[tokio::test]
    async fn test_run_start_returns_run_id() {
        let (ctx, _temp) = test_context("true");
        let params = json!({"goal": "fintech dashboard", "iterations": 5});

        let response = handle_run_start(1, &params, &ctx).await;
        assert!(response.is_success());
        let result = response.result.unwrap();
        assert_eq!(result["success"], true);
        assert!(result["run_id"].as_str().unwrap().starts_with("run-"));
    }

    #[tokio::test]
    async fn test_run_start_missing_goal() {
        let (ctx, _temp) = test_context("true");
        let response = handle_run_start(1, &json!({}), &ctx).await;
        assert!(!response.is_success());
        assert_eq!(response.error.unwrap().code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_run_start_empty_goal() {
        let (ctx, _temp) = test_context("true");
        let response = handle_run_start(1, &json!({"goal": "  "}), &ctx).await;
        assert!(!response.is_success());
        assert_eq!(response.error.unwrap().code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_run_start_spawn_failure() {
        let (ctx, _temp) = test_context("/nonexistent/worker-bin");
        let response = handle_run_start(1, &json!({"goal": "goal"}), &ctx).await;
        assert!(!response.is_success());
        assert_eq!(response.error.unwrap().code, ErrorCode::SPAWN_FAILED);
    }

    #[tokio::test]
    async fn test_run_start_broadcasts_event() {
        let (ctx, _temp) = test_context("true");
        let mut rx = ctx.subscribe();

        handle_run_start(1, &json!({"goal": "goal"}), &ctx).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "run.started");
    }

    #[tokio::test]
    async fn test_run_get_and_list() {
        let (ctx, _temp) = test_context("true");
        let response = handle_run_start(1, &json!({"goal": "goal"}), &ctx).await;
        let run_id = response.result.unwrap()["run_id"].as_str().unwrap().to_string();

        let response = handle_run_get(2, &json!({"id": run_id}), &ctx).await;
        assert!(response.is_success());
        assert_eq!(response.result.unwrap()["run"]["goal"], "goal");

        let response = handle_run_list(3, &ctx).await;
        assert_eq!(response.result.unwrap()["runs"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_get_unknown() {
        let (ctx, _temp) = test_context("true");
        let response = handle_run_get(1, &json!({"id": "run-missing"}), &ctx).await;
        assert!(!response.is_success());
        assert_eq!(response.error.unwrap().code, ErrorCode::RUN_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_reaches_terminal_state() {
        let (ctx, _temp) = test_context("true");
        let response = handle_run_start(1, &json!({"goal": "goal"}), &ctx).await;
        let run_id = response.result.unwrap()["run_id"].as_str().unwrap().to_string();

        for _ in 0..500 {
            let run = ctx.supervisor.get_run(&run_id).await.unwrap();
            if run.status.is_terminal() {
                assert_eq!(run.status, RunStatus::Succeeded);
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run never reached a terminal state");
    }
}
