//! IPC Layer - Unix socket protocol between callers and the daemon
//!
//! This module provides:
//! - Message types for requests, responses, and push events
//! - Unix socket server for the daemon
//! - Client for CLI and worker connections
//! - Newline-delimited JSON codec

pub mod client;
pub mod codec;
pub mod messages;
pub mod server;

pub use client::{IpcClient, IpcClientConfig};
pub use codec::NdJsonCodec;
pub use messages::{
    DaemonError, DaemonEvent, DaemonRequest, DaemonResponse, ErrorCode, Events, IpcMessage, Methods,
};
pub use server::{IpcServer, IpcServerConfig, RequestHandler};
