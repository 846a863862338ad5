use sea_orm::ConnectionTrait;
use tracing::{debug, info};

use crate::config::CompilerConfig;
use crate::document::{DefaultsSet, LayerType};
use crate::errors::{CompilerResult, ConfigurationError};
use crate::repositories::DefaultsRepository;

/// Loads and saves a portal's defaults block inside the caller's transaction.
pub struct DefaultsStore<'a, C> {
    repo: DefaultsRepository<'a, C>,
    config: &'a CompilerConfig,
}

impl<'a, C: ConnectionTrait> DefaultsStore<'a, C> {
    pub fn new(conn: &'a C, config: &'a CompilerConfig) -> Self {
        Self {
            repo: DefaultsRepository::new(conn),
            config,
        }
    }

    /// Defaults and id of a registered portal. Fails when the portal is unknown or when any
    /// required per-type defaults object is absent.
    pub async fn load(&self, portal_code: &str) -> CompilerResult<(DefaultsSet, i32)> {
        let portal = self
            .repo
            .find_portal(portal_code)
            .await?
            .ok_or_else(|| ConfigurationError::PortalNotFound(portal_code.to_string()))?;

        let defaults = self.repo.load_defaults(portal.id).await?;
        require_type_defaults(portal_code, &defaults)?;
        debug!(
            "Loaded defaults for portal {} ({} global, {} per-type)",
            portal_code,
            defaults.globals.len(),
            defaults.type_defaults.len()
        );
        Ok((defaults, portal.id))
    }

    /// Replace every stored default of the portal with `defaults`. Built-in switchlayer defaults
    /// are added when the block has none and seeding is enabled. Returns what was stored.
    pub async fn save(&self, portal_id: i32, defaults: &DefaultsSet) -> CompilerResult<DefaultsSet> {
        let mut stored = defaults.clone();
        if self.config.seed_switchlayer_defaults
            && stored.for_type(LayerType::SwitchLayer).is_none()
        {
            info!("Seeding built-in switchlayer defaults for portal {}", portal_id);
            stored.type_defaults.insert(
                LayerType::SwitchLayer,
                DefaultsSet::builtin_switchlayer_defaults(),
            );
        }

        self.repo.replace_defaults(portal_id, &stored).await?;
        Ok(stored)
    }
}

/// Every type in `LayerType::REQUIRED_DEFAULTS` must carry a defaults object.
pub fn require_type_defaults(
    portal_code: &str,
    defaults: &DefaultsSet,
) -> Result<(), ConfigurationError> {
    let missing = defaults.missing_required_types();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ConfigurationError::MissingTypeDefaults {
        portal: portal_code.to_string(),
        missing: missing.iter().map(|t| t.as_str().to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use serde_json::json;

    fn defaults(raw: serde_json::Value) -> DefaultsSet {
        DefaultsSet::from_json(raw.as_object().unwrap())
    }

    #[tokio::test]
    async fn test_load_unknown_portal() {
        let db = setup_test_db().await;
        let config = CompilerConfig::default();
        let err = DefaultsStore::new(&db, &config).load("nowhere").await.unwrap_err();
        assert_eq!(err.error_code(), "PORTAL_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_load_names_every_missing_type() {
        let db = setup_test_db().await;
        let config = CompilerConfig::default();
        let portal = DefaultsRepository::new(&db)
            .ensure_portal("default")
            .await
            .unwrap();
        let store = DefaultsStore::new(&db, &config);
        store
            .save(portal.id, &defaults(json!({"wms": {}, "xyz": {}})))
            .await
            .unwrap();

        let err = store.load("default").await.unwrap_err();
        assert_eq!(err.error_code(), "MISSING_TYPE_DEFAULTS");
        assert_eq!(
            err.to_string(),
            "Portal 'default' is missing per-type defaults for: wfs, arcgisrest"
        );
    }

    #[tokio::test]
    async fn test_save_seeds_switchlayer_defaults() {
        let db = setup_test_db().await;
        let config = CompilerConfig::default();
        let portal = DefaultsRepository::new(&db)
            .ensure_portal("default")
            .await
            .unwrap();
        let store = DefaultsStore::new(&db, &config);

        let block = defaults(json!({"wms": {}, "wfs": {}, "xyz": {}, "arcgisrest": {}}));
        store.save(portal.id, &block).await.unwrap();

        let (loaded, id) = store.load("default").await.unwrap();
        assert_eq!(id, portal.id);
        assert_eq!(
            loaded.for_type(LayerType::SwitchLayer),
            Some(&DefaultsSet::builtin_switchlayer_defaults())
        );
    }

    #[tokio::test]
    async fn test_seeding_can_be_disabled() {
        let db = setup_test_db().await;
        let config = CompilerConfig {
            seed_switchlayer_defaults: false,
            ..CompilerConfig::default()
        };
        let portal = DefaultsRepository::new(&db)
            .ensure_portal("default")
            .await
            .unwrap();
        let store = DefaultsStore::new(&db, &config);

        let block = defaults(json!({"wms": {}, "wfs": {}, "xyz": {}, "arcgisrest": {}}));
        let stored = store.save(portal.id, &block).await.unwrap();
        assert_eq!(stored, block);
    }
}
