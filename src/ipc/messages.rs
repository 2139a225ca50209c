//! IPC message types for caller <-> daemon communication.
//!
//! Uses JSON Lines (newline-delimited JSON) over a Unix stream socket.
//! Message schema uses familiar field names (id, method, params, result,
//! error) but does NOT implement JSON-RPC 2.0 specification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Run;
use crate::error::ThemrError;

/// Request sent from a caller (CLI or worker) to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRequest {
    /// Unique request ID for correlating responses.
    pub id: u64,
    /// Method name (e.g., "run.start", "theme.upsert").
    pub method: String,
    /// Method parameters as JSON value.
    #[serde(default)]
    pub params: Value,
}

impl DaemonRequest {
    /// Create a new request with the given method and params.
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Create a request with no parameters.
    pub fn no_params(id: u64, method: impl Into<String>) -> Self {
        Self::new(id, method, Value::Object(Default::default()))
    }
}

/// Response sent from the daemon to a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    /// Request ID this response corresponds to.
    pub id: u64,
    /// Result value on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error details on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DaemonError>,
}

impl DaemonResponse {
    /// Create a success response.
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: u64, error: DaemonError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Check if this response indicates success.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Error details in a daemon response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonError {
    /// Error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
}

impl DaemonError {
    /// Create a new error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Parse error (-32700).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PARSE_ERROR, message)
    }

    /// Unknown method error (-32601).
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::METHOD_NOT_FOUND,
            format!("Unknown method: {}", method.into()),
        )
    }

    /// Invalid params error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_PARAMS, message)
    }

    /// Internal daemon error (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INTERNAL_ERROR, message)
    }

    /// Run not found error (1001).
    pub fn run_not_found(id: impl Into<String>) -> Self {
        Self::new(ErrorCode::RUN_NOT_FOUND, format!("Run not found: {}", id.into()))
    }

    /// Map a core error onto the wire taxonomy.
    ///
    /// Synchronous contract violations keep their caller-correctable codes;
    /// everything else surfaces as an internal error.
    pub fn from_core(err: &ThemrError) -> Self {
        match err {
            ThemrError::InvalidInput(_) => Self::new(ErrorCode::INVALID_PARAMS, err.to_string()),
            ThemrError::Validation(_) => Self::new(ErrorCode::VALIDATION_FAILED, err.to_string()),
            ThemrError::OwnerResolution(_) => Self::new(ErrorCode::OWNER_NOT_FOUND, err.to_string()),
            ThemrError::Spawn(_) => Self::new(ErrorCode::SPAWN_FAILED, err.to_string()),
            ThemrError::RunNotFound(_) => Self::new(ErrorCode::RUN_NOT_FOUND, err.to_string()),
            _ => Self::new(ErrorCode::INTERNAL_ERROR, err.to_string()),
        }
    }
}

/// Standard error codes.
pub struct ErrorCode;

impl ErrorCode {
    /// Invalid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Unknown method.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal daemon error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Run ID doesn't exist.
    pub const RUN_NOT_FOUND: i32 = 1001;
    /// Theme payload failed structural validation.
    pub const VALIDATION_FAILED: i32 = 1002;
    /// No live owner identity could be bound to the write.
    pub const OWNER_NOT_FOUND: i32 = 1003;
    /// Worker process could not be launched.
    pub const SPAWN_FAILED: i32 = 1004;
}

/// Push event sent from the daemon to subscribed clients (no request ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonEvent {
    /// Event type (e.g., "run.started", "theme.upserted").
    pub event: String,
    /// Event data.
    pub data: Value,
}

impl DaemonEvent {
    /// Create a new event.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Create a run.started event.
    pub fn run_started(run: &Run) -> Self {
        Self::new(Events::RUN_STARTED, serde_json::to_value(run).unwrap_or(Value::Null))
    }

    /// Create a run.finished event.
    pub fn run_finished(run: &Run) -> Self {
        Self::new(Events::RUN_FINISHED, serde_json::to_value(run).unwrap_or(Value::Null))
    }

    /// Create a theme.upserted event.
    pub fn theme_upserted(theme_id: &str) -> Self {
        Self::new(
            Events::THEME_UPSERTED,
            serde_json::json!({ "theme_id": theme_id }),
        )
    }
}

/// IPC message enum for unified handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcMessage {
    /// Request from a caller.
    Request(DaemonRequest),
    /// Response from the daemon.
    Response(DaemonResponse),
    /// Push event from the daemon.
    Event(DaemonEvent),
}

/// Known method names as constants.
pub struct Methods;

impl Methods {
    // Connection
    pub const PING: &'static str = "ping";
    pub const SUBSCRIBE: &'static str = "subscribe";

    // Runs
    pub const RUN_START: &'static str = "run.start";
    pub const RUN_GET: &'static str = "run.get";
    pub const RUN_LIST: &'static str = "run.list";

    // Themes
    pub const THEME_LIST: &'static str = "theme.list";
    pub const THEME_UPSERT: &'static str = "theme.upsert";

    // Identities
    pub const IDENTITY_ADD: &'static str = "identity.add";
    pub const IDENTITY_LIST: &'static str = "identity.list";
}

/// Known event names as constants.
pub struct Events;

impl Events {
    pub const RUN_STARTED: &'static str = "run.started";
    pub const RUN_FINISHED: &'static str = "run.finished";
    pub const THEME_UPSERTED: &'static str = "theme.upserted";
}
