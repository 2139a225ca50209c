//! Identity request handlers
//!
//! Handles identity.* IPC methods. Identities exist so the registry can
//! enforce owner referential integrity; creating them here is deployment
//! plumbing, not user management.

use serde_json::{json, Value};

use crate::daemon::context::DaemonContext;
use crate::ipc::messages::{DaemonError, DaemonResponse};

/// Handle identity.add - register a new owner identity
pub async fn handle_identity_add(id: u64, params: &Value, ctx: &DaemonContext) -> DaemonResponse {
    let name = match params["name"].as_str() {
        Some(name) => name,
        None => return DaemonResponse::error(id, DaemonError::invalid_params("Missing 'name' parameter")),
    };
    let identity_id = params["id"].as_str();

    match ctx.registry.add_identity(name, identity_id) {
        Ok(identity) => DaemonResponse::success(id, json!({"identity_id": identity.id})),
        Err(e) => DaemonResponse::error(id, DaemonError::from_core(&e)),
    }
}

/// Handle identity.list - list all registered identities
pub async fn handle_identity_list(id: u64, ctx: &DaemonContext) -> DaemonResponse {
    match ctx.registry.list_identities() {
        Ok(identities) => {
            let identities_json: Vec<Value> =
                identities.iter().filter_map(|i| serde_json::to_value(i).ok()).collect();
            DaemonResponse::success(id, json!({"identities": identities_json}))
        }
        Err(e) => DaemonResponse::error(id, DaemonError::from_core(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemrConfig;
    use crate::ipc::messages::ErrorCode;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    fn test_context() -> (DaemonContext, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut config = ThemrConfig::default();
        config.storage.data_dir = Some(temp.path().to_path_buf());
        config.supervisor.worker_command = "true".to_string();
        let (event_tx, _) = broadcast::channel(16);
        (DaemonContext::new(&config, event_tx).unwrap(), temp)
    }

    #[tokio::test]
    async fn test_identity_add() {
        let (ctx, _temp) = test_context();
        let response = handle_identity_add(1, &json!({"name": "alice"}), &ctx).await;
        assert!(response.is_success());
        let identity_id = response.result.unwrap()["identity_id"].as_str().unwrap().to_string();
        assert!(identity_id.starts_with("usr-"));
    }

    #[tokio::test]
    async fn test_identity_add_missing_name() {
        let (ctx, _temp) = test_context();
        let response = handle_identity_add(1, &json!({}), &ctx).await;
        assert!(!response.is_success());
        assert_eq!(response.error.unwrap().code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_identity_list_includes_agent() {
        let (ctx, _temp) = test_context();
        handle_identity_add(1, &json!({"name": "alice"}), &ctx).await;

        let response = handle_identity_list(2, &ctx).await;
        assert!(response.is_success());
        let result = response.result.unwrap();
        let identities = result["identities"].as_array().unwrap();
        // The configured agent principal plus the new identity
        assert_eq!(identities.len(), 2);
    }
}
