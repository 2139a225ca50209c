//! Theme record - the persisted design artifact
//!
//! A Theme is a named bundle of style tokens produced by a generation run
//! (or submitted directly) and stored in the registry. The `styles` mapping
//! is schema-checked for shape only; token names and values are opaque to
//! the core.

use crate::id::{generate_theme_id, now_ms};
use crate::storage::HasId;
use serde::{Deserialize, Serialize};

/// Style-token name to value mapping
pub type Styles = serde_json::Map<String, serde_json::Value>;

/// A persisted design artifact owned by exactly one identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    /// Unique identifier ("thm-1738300800123-a1b2")
    pub id: String,

    /// Owning identity; must reference a live identity at write time
    pub owner_id: String,

    /// Display name, non-empty after trimming
    pub name: String,

    /// Style tokens, non-empty, otherwise opaque
    pub styles: Styles,

    /// Set once at insertion, never changed
    pub created_at: i64,

    /// Bumped on every successful upsert
    pub updated_at: i64,
}

impl Theme {
    /// Create a new theme with a generated identifier
    pub fn new(owner_id: &str, name: &str, styles: Styles) -> Self {
        Self::with_id(&generate_theme_id(), owner_id, name, styles)
    }

    /// Create a new theme with a caller-supplied identifier
    pub fn with_id(id: &str, owner_id: &str, name: &str, styles: Styles) -> Self {
        let now = now_ms();
        Self {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            styles,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the mutable fields from a resubmission.
    ///
    /// `updated_at` never moves backwards even if the clock does.
    pub fn apply_update(&mut self, name: &str, styles: Styles) {
        self.name = name.to_string();
        self.styles = styles;
        self.updated_at = now_ms().max(self.updated_at);
    }
}

impl HasId for Theme {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_styles() -> Styles {
        let mut styles = Styles::new();
        styles.insert("primary".to_string(), json!("#1a1a2e"));
        styles.insert("radius".to_string(), json!("0.5rem"));
        styles
    }

    #[test]
    fn test_new_theme_generates_id() {
        let theme = Theme::new("usr-1", "Midnight", sample_styles());
        assert!(theme.id.starts_with("thm-"));
        assert_eq!(theme.owner_id, "usr-1");
        assert_eq!(theme.name, "Midnight");
    }

    #[test]
    fn test_with_id_keeps_caller_id() {
        let theme = Theme::with_id("thm-custom", "usr-1", "Midnight", sample_styles());
        assert_eq!(theme.id, "thm-custom");
    }

    #[test]
    fn test_timestamps_equal_at_creation() {
        let theme = Theme::new("usr-1", "Midnight", sample_styles());
        assert_eq!(theme.created_at, theme.updated_at);
    }

    #[test]
    fn test_apply_update_overwrites_mutable_fields() {
        let mut theme = Theme::new("usr-1", "Midnight", sample_styles());
        let created = theme.created_at;

        let mut new_styles = Styles::new();
        new_styles.insert("primary".to_string(), json!("#ffffff"));
        theme.apply_update("Daylight", new_styles);

        assert_eq!(theme.name, "Daylight");
        assert_eq!(theme.styles["primary"], json!("#ffffff"));
        assert_eq!(theme.created_at, created);
        assert!(theme.updated_at >= created);
    }

    #[test]
    fn test_apply_update_updated_at_monotonic() {
        let mut theme = Theme::new("usr-1", "Midnight", sample_styles());
        let first = theme.updated_at;
        theme.apply_update("Midnight", sample_styles());
        assert!(theme.updated_at >= first);
    }

    #[test]
    fn test_has_id() {
        let theme = Theme::with_id("thm-x", "usr-1", "Midnight", sample_styles());
        assert_eq!(HasId::id(&theme), "thm-x");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let theme = Theme::new("usr-1", "Midnight", sample_styles());
        let json = serde_json::to_string(&theme).unwrap();
        let restored: Theme = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id, theme.id);
        assert_eq!(restored.owner_id, theme.owner_id);
        assert_eq!(restored.styles, theme.styles);
    }
}
