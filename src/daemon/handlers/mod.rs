//! Request handlers for the daemon
//!
//! Each submodule handles a category of IPC methods:
//! - runs: run lifecycle (start, get, list)
//! - themes: theme registry (list, upsert)
//! - identities: owner identities (add, list)

pub mod identities;
pub mod runs;
pub mod themes;

pub use identities::*;
pub use runs::*;
pub use themes::*;
