use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::Value;

use crate::database::entities::{global_defaults, layer_type_defaults, portals};
use crate::document::{DefaultsSet, LayerType};
use crate::errors::{CompilerError, CompilerResult, ConfigurationError};

/// Portals and their defaults blocks
pub struct DefaultsRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> DefaultsRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_portal(&self, code: &str) -> Result<Option<portals::Model>, sea_orm::DbErr> {
        portals::Entity::find()
            .filter(portals::Column::Code.eq(code))
            .one(self.conn)
            .await
    }

    /// Find the portal, registering it when unknown
    pub async fn ensure_portal(&self, code: &str) -> Result<portals::Model, sea_orm::DbErr> {
        if let Some(portal) = self.find_portal(code).await? {
            return Ok(portal);
        }

        let active = portals::ActiveModel {
            code: Set(code.to_string()),
            title: Set(portal_title(code)),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let result = portals::Entity::insert(active).exec(self.conn).await?;
        portals::Entity::find_by_id(result.last_insert_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| sea_orm::DbErr::RecordNotFound(format!("portal {}", code)))
    }

    pub async fn list_portals(&self) -> Result<Vec<portals::Model>, sea_orm::DbErr> {
        portals::Entity::find()
            .order_by_asc(portals::Column::Code)
            .all(self.conn)
            .await
    }

    /// Stored defaults for a portal; globals keep their insertion order.
    pub async fn load_defaults(&self, portal_id: i32) -> CompilerResult<DefaultsSet> {
        let mut set = DefaultsSet::default();

        let globals = global_defaults::Entity::find()
            .filter(global_defaults::Column::PortalId.eq(portal_id))
            .order_by_asc(global_defaults::Column::Id)
            .all(self.conn)
            .await?;
        for row in globals {
            let value: Value = serde_json::from_str(&row.value_json).map_err(|e| {
                CompilerError::parse(format!("global_defaults.{}", row.key), e.to_string())
            })?;
            set.globals.insert(row.key, value);
        }

        let type_rows = layer_type_defaults::Entity::find()
            .filter(layer_type_defaults::Column::PortalId.eq(portal_id))
            .all(self.conn)
            .await?;
        for row in type_rows {
            let Ok(layer_type) = row.layer_type.parse::<LayerType>() else {
                continue;
            };
            match row.defaults {
                Value::Object(defaults) => {
                    set.type_defaults.insert(layer_type, defaults);
                }
                _ => {
                    return Err(ConfigurationError::InvalidTypeDefaults {
                        layer_type: row.layer_type,
                    }
                    .into())
                }
            }
        }

        Ok(set)
    }

    /// Delete every stored default of the portal, then insert `defaults`.
    pub async fn replace_defaults(
        &self,
        portal_id: i32,
        defaults: &DefaultsSet,
    ) -> Result<(), sea_orm::DbErr> {
        global_defaults::Entity::delete_many()
            .filter(global_defaults::Column::PortalId.eq(portal_id))
            .exec(self.conn)
            .await?;
        layer_type_defaults::Entity::delete_many()
            .filter(layer_type_defaults::Column::PortalId.eq(portal_id))
            .exec(self.conn)
            .await?;

        for (key, value) in &defaults.globals {
            let active = global_defaults::ActiveModel {
                portal_id: Set(portal_id),
                key: Set(key.clone()),
                value_json: Set(value.to_string()),
                ..Default::default()
            };
            global_defaults::Entity::insert(active).exec(self.conn).await?;
        }

        for (layer_type, object) in &defaults.type_defaults {
            let active = layer_type_defaults::ActiveModel {
                portal_id: Set(portal_id),
                layer_type: Set(layer_type.as_str().to_string()),
                defaults: Set(Value::Object(object.clone())),
                ..Default::default()
            };
            layer_type_defaults::Entity::insert(active)
                .exec(self.conn)
                .await?;
        }

        Ok(())
    }
}

/// `nta_default` -> `Nta Default`
pub fn portal_title(code: &str) -> String {
    code.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use serde_json::json;

    #[test]
    fn test_portal_title() {
        assert_eq!(portal_title("nta_default"), "Nta Default");
        assert_eq!(portal_title("EDITOR"), "Editor");
    }

    #[tokio::test]
    async fn test_ensure_portal_is_idempotent() {
        let db = setup_test_db().await;
        let repo = DefaultsRepository::new(&db);

        let first = repo.ensure_portal("tii_default").await.unwrap();
        let second = repo.ensure_portal("tii_default").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.title, "Tii Default");
        assert_eq!(repo.list_portals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_defaults_drops_stale_keys() {
        let db = setup_test_db().await;
        let repo = DefaultsRepository::new(&db);
        let portal = repo.ensure_portal("default").await.unwrap();

        let first = DefaultsSet::from_json(
            json!({"stale": 1, "wms": {"isBaseLayer": false}})
                .as_object()
                .unwrap(),
        );
        repo.replace_defaults(portal.id, &first).await.unwrap();

        let second = DefaultsSet::from_json(
            json!({"nothing": null, "wfs": {"visibility": true}})
                .as_object()
                .unwrap(),
        );
        repo.replace_defaults(portal.id, &second).await.unwrap();

        let loaded = repo.load_defaults(portal.id).await.unwrap();
        assert_eq!(loaded, second);
        assert_eq!(loaded.globals["nothing"], Value::Null);
    }
}
