//! Theme registry - owner-scoped, idempotent store of theme artifacts
//!
//! The registry is the only write path for generation workers and direct
//! callers alike. Upserts are keyed by theme id: resubmitting an id
//! overwrites the mutable fields, so repeating an identical payload changes
//! nothing but `updated_at`.
//!
//! Owner resolution is deterministic: an explicit owner hint must name a
//! live identity, otherwise the configured agent principal is used. There is
//! no fallback to an arbitrary existing identity - a write that cannot be
//! bound to exactly one live owner is rejected.

use std::sync::{Arc, Mutex};

use log::debug;

use crate::domain::{Identity, Styles, Theme};
use crate::error::{Result, ThemrError};
use crate::storage::{Filter, Storage};

/// Collection name for theme records
const THEMES: &str = "themes";
/// Collection name for identity records
const IDENTITIES: &str = "identities";

/// Configuration for the theme registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Identity id bound to writes that carry no owner hint.
    ///
    /// This is the service principal for worker-originated writes,
    /// configured at deployment.
    pub agent_identity: Option<String>,

    /// Default and upper bound for list page sizes
    pub max_list_limit: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            agent_identity: None,
            max_list_limit: 50,
        }
    }
}

/// An upsert request as received from a worker or direct caller
#[derive(Debug, Clone)]
pub struct UpsertTheme {
    /// Existing theme id to overwrite, or None to insert with a generated id
    pub id: Option<String>,
    /// Explicit owner hint; must name a live identity when present
    pub owner_id: Option<String>,
    pub name: String,
    pub styles: Styles,
}

/// Owner-scoped theme store with identity referential integrity
pub struct ThemeRegistry<S: Storage> {
    storage: Arc<S>,
    config: RegistryConfig,
    /// Serializes read-modify-write upserts so same-id writers commit in
    /// lock acquisition order (last writer wins by commit order).
    write_lock: Mutex<()>,
}

impl<S: Storage> ThemeRegistry<S> {
    /// Create a registry over the given storage
    pub fn new(storage: Arc<S>, config: RegistryConfig) -> Self {
        Self {
            storage,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// List themes, most recently updated first.
    ///
    /// Ties are broken by insertion order. `limit` is clamped to the
    /// configured maximum, which is also the default when absent. Each call
    /// re-queries current state, so readers observe partially-completed runs
    /// as their themes land. Themes whose owner no longer resolves are never
    /// returned.
    pub fn list_themes(&self, limit: Option<usize>, owner: Option<&str>) -> Result<Vec<Theme>> {
        let effective = limit.unwrap_or(self.config.max_list_limit).min(self.config.max_list_limit);

        let filters: Vec<Filter> = match owner {
            Some(owner_id) => vec![Filter::eq("owner_id", owner_id)],
            None => Vec::new(),
        };

        let mut themes: Vec<Theme> = self.storage.query(THEMES, &filters)?;

        let live: Vec<String> = self
            .list_identities()?
            .into_iter()
            .map(|identity| identity.id)
            .collect();
        themes.retain(|theme| live.iter().any(|id| *id == theme.owner_id));

        // Stable sort keeps insertion order within equal timestamps
        themes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        themes.truncate(effective);

        Ok(themes)
    }

    /// Insert or update a theme, returning its id.
    ///
    /// Validation and owner resolution happen before anything is written;
    /// a rejected request leaves no record behind.
    pub fn upsert_theme(&self, request: UpsertTheme) -> Result<String> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ThemrError::Validation("name must not be empty".to_string()));
        }
        if request.styles.is_empty() {
            return Err(ThemrError::Validation("styles must not be empty".to_string()));
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| ThemrError::Storage(e.to_string()))?;

        if let Some(id) = &request.id {
            if let Some(mut existing) = self.storage.get::<Theme>(THEMES, id)? {
                // No orphan may survive a write: the record's owner must
                // still resolve at write time.
                if !self.identity_exists(&existing.owner_id)? {
                    return Err(ThemrError::OwnerResolution(format!(
                        "owner {} of theme {} is not a live identity",
                        existing.owner_id, id
                    )));
                }

                existing.apply_update(name, request.styles);
                self.storage.update(THEMES, id, &existing)?;
                debug!("updated theme {}", id);
                return Ok(id.clone());
            }
        }

        let owner_id = self.resolve_owner(request.owner_id.as_deref())?;
        let theme = match &request.id {
            Some(id) => Theme::with_id(id, &owner_id, name, request.styles),
            None => Theme::new(&owner_id, name, request.styles),
        };

        self.storage.create(THEMES, &theme)?;
        debug!("created theme {} for owner {}", theme.id, owner_id);
        Ok(theme.id)
    }

    /// Bind a write to exactly one live identity.
    fn resolve_owner(&self, hint: Option<&str>) -> Result<String> {
        if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
            return if self.identity_exists(hint)? {
                Ok(hint.to_string())
            } else {
                Err(ThemrError::OwnerResolution(format!(
                    "owner hint {} does not name a live identity",
                    hint
                )))
            };
        }

        match &self.config.agent_identity {
            Some(agent) => {
                if self.identity_exists(agent)? {
                    Ok(agent.clone())
                } else {
                    Err(ThemrError::OwnerResolution(format!(
                        "configured agent identity {} does not exist",
                        agent
                    )))
                }
            }
            None => Err(ThemrError::OwnerResolution(
                "no owner supplied and no agent identity configured".to_string(),
            )),
        }
    }

    /// Register a new identity. The id is caller-supplied for deployment
    /// principals, generated otherwise.
    pub fn add_identity(&self, name: &str, id: Option<&str>) -> Result<Identity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ThemrError::Validation("identity name must not be empty".to_string()));
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| ThemrError::Storage(e.to_string()))?;

        let identity = match id {
            Some(id) => {
                if self.identity_exists(id)? {
                    return Err(ThemrError::InvalidInput(format!("identity {} already exists", id)));
                }
                Identity::with_id(id, name)
            }
            None => Identity::new(name),
        };

        self.storage.create(IDENTITIES, &identity)?;
        Ok(identity)
    }

    /// List all registered identities in insertion order
    pub fn list_identities(&self) -> Result<Vec<Identity>> {
        self.storage.list(IDENTITIES)
    }

    /// Check whether an identity id resolves to a live identity
    pub fn identity_exists(&self, id: &str) -> Result<bool> {
        Ok(self.storage.get::<Identity>(IDENTITIES, id)?.is_some())
    }

    /// Create the configured agent principal if it is missing.
    ///
    /// Called once at daemon startup so worker-originated writes have a
    /// deterministic owner from the first run onward. Returns the identity
    /// when one was created.
    pub fn ensure_agent_identity(&self) -> Result<Option<Identity>> {
        let Some(agent) = self.config.agent_identity.clone() else {
            return Ok(None);
        };

        if self.identity_exists(&agent)? {
            return Ok(None);
        }

        let identity = self.add_identity("agent", Some(&agent))?;
        debug!("created agent identity {}", identity.id);
        Ok(Some(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonlStorage;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_styles() -> Styles {
        let mut styles = Styles::new();
        styles.insert("primary".to_string(), json!("#1a1a2e"));
        styles
    }

    fn upsert(name: &str) -> UpsertTheme {
        UpsertTheme {
            id: None,
            owner_id: None,
            name: name.to_string(),
            styles: sample_styles(),
        }
    }

    fn registry_with_agent() -> (ThemeRegistry<JsonlStorage>, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(JsonlStorage::new(temp.path()).unwrap());
        let registry = ThemeRegistry::new(
            storage,
            RegistryConfig {
                agent_identity: Some("usr-agent".to_string()),
                max_list_limit: 50,
            },
        );
        registry.add_identity("agent", Some("usr-agent")).unwrap();
        (registry, temp)
    }

    #[test]
    fn test_upsert_creates_theme() {
        let (registry, _temp) = registry_with_agent();
        let id = registry.upsert_theme(upsert("Midnight")).unwrap();

        let themes = registry.list_themes(None, None).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].id, id);
        assert_eq!(themes[0].owner_id, "usr-agent");
    }

    #[test]
    fn test_upsert_empty_name_rejected() {
        let (registry, _temp) = registry_with_agent();
        let result = registry.upsert_theme(upsert("   "));
        assert!(matches!(result, Err(ThemrError::Validation(_))));
        assert!(registry.list_themes(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_empty_styles_rejected() {
        let (registry, _temp) = registry_with_agent();
        let request = UpsertTheme {
            id: None,
            owner_id: None,
            name: "Midnight".to_string(),
            styles: Styles::new(),
        };
        let result = registry.upsert_theme(request);
        assert!(matches!(result, Err(ThemrError::Validation(_))));
        assert!(registry.list_themes(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_no_identities_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(JsonlStorage::new(temp.path()).unwrap());
        let registry = ThemeRegistry::new(
            storage,
            RegistryConfig {
                agent_identity: Some("usr-agent".to_string()),
                max_list_limit: 50,
            },
        );

        // Agent identity configured but never registered
        let result = registry.upsert_theme(upsert("Midnight"));
        assert!(matches!(result, Err(ThemrError::OwnerResolution(_))));
        assert!(registry.list_themes(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_no_agent_configured_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(JsonlStorage::new(temp.path()).unwrap());
        let registry = ThemeRegistry::new(storage, RegistryConfig::default());
        registry.add_identity("someone", None).unwrap();

        // An identity exists, but without a hint or configured agent the
        // write must not be bound to it.
        let result = registry.upsert_theme(upsert("Midnight"));
        assert!(matches!(result, Err(ThemrError::OwnerResolution(_))));
    }

    #[test]
    fn test_upsert_unknown_owner_hint_rejected() {
        let (registry, _temp) = registry_with_agent();
        let request = UpsertTheme {
            id: None,
            owner_id: Some("usr-ghost".to_string()),
            name: "Midnight".to_string(),
            styles: sample_styles(),
        };
        let result = registry.upsert_theme(request);
        assert!(matches!(result, Err(ThemrError::OwnerResolution(_))));
    }

    #[test]
    fn test_upsert_explicit_owner_hint() {
        let (registry, _temp) = registry_with_agent();
        let user = registry.add_identity("alice", None).unwrap();

        let request = UpsertTheme {
            id: None,
            owner_id: Some(user.id.clone()),
            name: "Midnight".to_string(),
            styles: sample_styles(),
        };
        registry.upsert_theme(request).unwrap();

        let themes = registry.list_themes(None, Some(&user.id)).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].owner_id, user.id);
    }

    #[test]
    fn test_upsert_idempotent() {
        let (registry, _temp) = registry_with_agent();
        let id = registry.upsert_theme(upsert("Midnight")).unwrap();

        let first = registry.list_themes(None, None).unwrap().remove(0);

        let request = UpsertTheme {
            id: Some(id.clone()),
            owner_id: None,
            name: "Midnight".to_string(),
            styles: sample_styles(),
        };
        let second_id = registry.upsert_theme(request).unwrap();
        assert_eq!(second_id, id);

        let themes = registry.list_themes(None, None).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, first.name);
        assert_eq!(themes[0].styles, first.styles);
        assert_eq!(themes[0].created_at, first.created_at);
        assert!(themes[0].updated_at >= first.updated_at);
    }

    #[test]
    fn test_upsert_overwrites_mutable_fields() {
        let (registry, _temp) = registry_with_agent();
        let id = registry.upsert_theme(upsert("Midnight")).unwrap();

        let mut new_styles = Styles::new();
        new_styles.insert("primary".to_string(), json!("#ffffff"));
        let request = UpsertTheme {
            id: Some(id.clone()),
            owner_id: None,
            name: "Daylight".to_string(),
            styles: new_styles,
        };
        registry.upsert_theme(request).unwrap();

        let themes = registry.list_themes(None, None).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Daylight");
        assert_eq!(themes[0].styles["primary"], json!("#ffffff"));
    }

    #[test]
    fn test_upsert_with_caller_supplied_id() {
        let (registry, _temp) = registry_with_agent();
        let request = UpsertTheme {
            id: Some("thm-worker-7".to_string()),
            owner_id: None,
            name: "Midnight".to_string(),
            styles: sample_styles(),
        };
        let id = registry.upsert_theme(request).unwrap();
        assert_eq!(id, "thm-worker-7");
    }

    #[test]
    fn test_list_ordering_most_recent_first() {
        let (registry, _temp) = registry_with_agent();
        let first = registry.upsert_theme(upsert("First")).unwrap();
        let second = registry.upsert_theme(upsert("Second")).unwrap();

        // Touch the first one so it becomes the most recently updated
        let request = UpsertTheme {
            id: Some(first.clone()),
            owner_id: None,
            name: "First".to_string(),
            styles: sample_styles(),
        };
        registry.upsert_theme(request).unwrap();

        let themes = registry.list_themes(None, None).unwrap();
        assert_eq!(themes.len(), 2);
        // Equal timestamps fall back to insertion order; otherwise the
        // re-upserted record leads.
        if themes[0].updated_at == themes[1].updated_at {
            assert_eq!(themes[0].id, first);
            assert_eq!(themes[1].id, second);
        } else {
            assert_eq!(themes[0].id, first);
        }
    }

    #[test]
    fn test_list_limit_clamped() {
        let (registry, _temp) = registry_with_agent();
        for i in 0..5 {
            registry.upsert_theme(upsert(&format!("Theme {}", i))).unwrap();
        }

        let limited = registry.list_themes(Some(2), None).unwrap();
        assert_eq!(limited.len(), 2);

        // Requests above the maximum are clamped to it
        let all = registry.list_themes(Some(1000), None).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_list_never_returns_orphans() {
        let (registry, _temp) = registry_with_agent();
        registry.upsert_theme(upsert("Midnight")).unwrap();

        // Write a record whose owner was never registered, bypassing the
        // registry's write path
        let orphan = Theme::with_id("thm-orphan", "usr-gone", "Orphan", sample_styles());
        registry.storage.create(THEMES, &orphan).unwrap();

        let themes = registry.list_themes(None, None).unwrap();
        assert_eq!(themes.len(), 1);
        assert_ne!(themes[0].id, "thm-orphan");
    }

    #[test]
    fn test_add_identity_duplicate_rejected() {
        let (registry, _temp) = registry_with_agent();
        let result = registry.add_identity("again", Some("usr-agent"));
        assert!(matches!(result, Err(ThemrError::InvalidInput(_))));
    }

    #[test]
    fn test_ensure_agent_identity_creates_once() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(JsonlStorage::new(temp.path()).unwrap());
        let registry = ThemeRegistry::new(
            storage,
            RegistryConfig {
                agent_identity: Some("usr-agent".to_string()),
                max_list_limit: 50,
            },
        );

        let created = registry.ensure_agent_identity().unwrap();
        assert!(created.is_some());
        assert_eq!(created.unwrap().id, "usr-agent");

        let again = registry.ensure_agent_identity().unwrap();
        assert!(again.is_none());
        assert_eq!(registry.list_identities().unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_agent_identity_noop_when_unconfigured() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(JsonlStorage::new(temp.path()).unwrap());
        let registry = ThemeRegistry::new(storage, RegistryConfig::default());
        assert!(registry.ensure_agent_identity().unwrap().is_none());
    }
}
