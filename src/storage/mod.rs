//! Storage layer for themr - JSONL-backed collection persistence
//!
//! Collections (themes, identities) are stored as newline-delimited JSON
//! files with an in-memory cache. The registry builds its referential
//! integrity and ordering guarantees on top of this generic layer.

pub mod jsonl;
pub mod traits;

pub use jsonl::JsonlStorage;
pub use traits::{Filter, FilterOp, HasId, Storage};
