//! Identity record - an owner that themes are bound to
//!
//! Identities are opaque to the core: resolution of real users happens
//! elsewhere. The registry only enforces that every theme references one
//! live identity.

use crate::id::{generate_identity_id, now_ms};
use crate::storage::HasId;
use serde::{Deserialize, Serialize};

/// An owner principal that themes resolve to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier ("usr-1738300800123-a1b2")
    pub id: String,

    /// Display label
    pub name: String,

    pub created_at: i64,
}

impl Identity {
    /// Create a new identity with a generated identifier
    pub fn new(name: &str) -> Self {
        Self::with_id(&generate_identity_id(), name)
    }

    /// Create a new identity with a caller-supplied identifier.
    ///
    /// Used for the configured agent principal, whose id is fixed at
    /// deployment rather than generated.
    pub fn with_id(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            created_at: now_ms(),
        }
    }
}

impl HasId for Identity {
    fn id(&self) -> &str {
        &self.id
    }
}
