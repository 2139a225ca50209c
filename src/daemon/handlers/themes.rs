//! Theme request handlers
//!
//! Handles theme.* IPC methods by delegating to the registry. These are the
//! endpoints generation workers call back into while a run is in flight.

use serde_json::{json, Value};

use crate::daemon::context::DaemonContext;
use crate::ipc::messages::{DaemonError, DaemonEvent, DaemonResponse};
use crate::registry::UpsertTheme;

/// Handle theme.list - list themes, most recently updated first
pub async fn handle_theme_list(id: u64, params: &Value, ctx: &DaemonContext) -> DaemonResponse {
    let limit = params["limit"].as_u64().map(|n| n as usize);
    let owner = params["owner"].as_str();

    match ctx.registry.list_themes(limit, owner) {
        Ok(themes) => {
            let themes_json: Vec<Value> = themes.iter().filter_map(|t| serde_json::to_value(t).ok()).collect();
            DaemonResponse::success(id, json!({"themes": themes_json}))
        }
        Err(e) => DaemonResponse::error(id, DaemonError::from_core(&e)),
    }
}

/// Handle theme.upsert - insert or overwrite a theme
pub async fn handle_theme_upsert(id: u64, params: &Value, ctx: &DaemonContext) -> DaemonResponse {
    let name = params["name"].as_str().unwrap_or_default();
    let styles = match params["styles"].as_object() {
        Some(map) => map.clone(),
        None => {
            return DaemonResponse::error(
                id,
                DaemonError::from_core(&crate::error::ThemrError::Validation(
                    "styles must be an object".to_string(),
                )),
            )
        }
    };

    let request = UpsertTheme {
        id: params["id"].as_str().map(str::to_string),
        owner_id: params["owner"].as_str().map(str::to_string),
        name: name.to_string(),
        styles,
    };

    match ctx.registry.upsert_theme(request) {
        Ok(theme_id) => {
            ctx.broadcast(DaemonEvent::theme_upserted(&theme_id));
            DaemonResponse::success(
                id,
                json!({
                    "success": true,
                    "theme_id": theme_id
                }),
            )
        }
        Err(e) => DaemonResponse::error(id, DaemonError::from_core(&e)),
    }
}
