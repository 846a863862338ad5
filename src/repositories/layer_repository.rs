use std::collections::HashSet;

use chrono::Utc;
use sea_orm::ActiveValue::{self, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde_json::{Map, Value};

use crate::database::entities::{
    layer_server_options, layer_styles, layer_xyz_options, layers, switch_layer_children,
};
use crate::document::{
    LayerAttributes, LayerBody, LayerSpec, LayerType, ServerOptions, ServiceBody, StyleSpec,
    TokenPolicy, XyzBody,
};
use crate::errors::{CompilerError, CompilerResult};

/// Layer rows and their side tables
pub struct LayerRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> LayerRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_key(
        &self,
        portal_id: i32,
        layer_key: &str,
    ) -> Result<Option<layers::Model>, sea_orm::DbErr> {
        layers::Entity::find()
            .filter(layers::Column::PortalId.eq(portal_id))
            .filter(layers::Column::LayerKey.eq(layer_key))
            .one(self.conn)
            .await
    }

    /// Insert the core row, or overwrite every attribute of the existing row in place so its id
    /// survives. Returns the layer id.
    pub async fn upsert_layer(&self, portal_id: i32, spec: &LayerSpec) -> Result<i32, sea_orm::DbErr> {
        let now = Utc::now();
        let attrs = &spec.attributes;

        let mut active = match self.find_by_key(portal_id, &spec.layer_key).await? {
            Some(existing) => existing.into(),
            None => layers::ActiveModel {
                portal_id: Set(portal_id),
                layer_key: Set(spec.layer_key.clone()),
                created_at: Set(now),
                ..Default::default()
            },
        };
        active.layer_type = Set(spec.layer_type.as_str().to_string());
        active.title = Set(attrs.title.clone());
        active.grid_xtype = Set(attrs.grid_xtype.clone());
        active.id_property = Set(attrs.id_property.clone());
        active.label_class_name = Set(attrs.label_class_name.clone());
        active.legend_width = Set(attrs.legend_width);
        active.visibility = Set(attrs.visibility);
        active.vector_features_min_scale = Set(attrs.vector_features_min_scale);
        active.feature_info_window = Set(attrs.feature_info_window);
        active.has_metadata = Set(attrs.has_metadata);
        active.is_base_layer = Set(attrs.is_base_layer);
        active.qtip = Set(attrs.qtip.clone());
        active.open_layers = Set(attrs.open_layers.clone().map(Value::Object));
        active.tooltips_config = Set(attrs.tooltips_config.clone().map(Value::Array));
        active.grouping = Set(attrs.grouping.clone().map(Value::Object));
        active.extras = Set(object_or_none(&attrs.extras));
        active.updated_at = Set(now);

        let saved = active.save(self.conn).await?;
        match saved.id {
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Ok(id),
            ActiveValue::NotSet => Err(sea_orm::DbErr::RecordNotFound(format!(
                "layer {}",
                spec.layer_key
            ))),
        }
    }

    /// Rewrite the server options, styles and xyz options of a layer from its body. Switchlayer
    /// bodies only clear them; their children are linked separately. Any other body also drops
    /// child links left from when the layer was a switchlayer.
    pub async fn replace_body(
        &self,
        layer_id: i32,
        body: &LayerBody,
        policy: &TokenPolicy,
    ) -> Result<(), sea_orm::DbErr> {
        self.clear_side_tables(layer_id).await?;
        if !matches!(body, LayerBody::Switch(_)) {
            switch_layer_children::Entity::delete_many()
                .filter(switch_layer_children::Column::ParentLayerId.eq(layer_id))
                .exec(self.conn)
                .await?;
        }

        match body {
            LayerBody::Service(service) => {
                let options = &service.server_options;
                let active = layer_server_options::ActiveModel {
                    layer_id: Set(layer_id),
                    wms_layers: Set(options.layers.clone()),
                    order_by: Set(options.order_by.clone()),
                    property_name: Set(options.property_name.clone()),
                    version: Set(options.version.clone()),
                    max_resolution: Set(options.max_resolution),
                    feature_type: Set(service.feature_type.clone()),
                    geom_field_name: Set(service.geom_field_name.clone()),
                    extras: Set(object_or_none(&options.extras)),
                };
                layer_server_options::Entity::insert(active)
                    .exec(self.conn)
                    .await?;

                for (index, style) in service.styles.iter().enumerate() {
                    let active = layer_styles::ActiveModel {
                        layer_id: Set(layer_id),
                        name: Set(style.name.clone()),
                        title: Set(style.title.clone()),
                        label_rule: Set(style.label_rule.clone()),
                        legend_url: Set(style.legend_url.clone()),
                        is_default: Set(index == 0),
                        display_order: Set(index as i32 + 1),
                        ..Default::default()
                    };
                    layer_styles::Entity::insert(active).exec(self.conn).await?;
                }
            }
            LayerBody::Xyz(xyz) => {
                let (url_template, access_token) = match &xyz.url {
                    Some(url) => {
                        let (template, token) = policy.tokenize(url);
                        (Some(template), token)
                    }
                    None => (None, None),
                };
                let active = layer_xyz_options::ActiveModel {
                    layer_id: Set(layer_id),
                    url_template: Set(url_template),
                    access_token: Set(access_token),
                    projection: Set(xyz.projection.clone()),
                    tile_size: Set(xyz.tile_size.clone()),
                    attribution_html: Set(xyz.attribution.clone()),
                    extent: Set(xyz.extent.clone()),
                    tile_grid: Set(xyz.tile_grid.clone()),
                };
                layer_xyz_options::Entity::insert(active)
                    .exec(self.conn)
                    .await?;
            }
            LayerBody::Switch(_) => {}
        }
        Ok(())
    }

    async fn clear_side_tables(&self, layer_id: i32) -> Result<(), sea_orm::DbErr> {
        layer_server_options::Entity::delete_many()
            .filter(layer_server_options::Column::LayerId.eq(layer_id))
            .exec(self.conn)
            .await?;
        layer_styles::Entity::delete_many()
            .filter(layer_styles::Column::LayerId.eq(layer_id))
            .exec(self.conn)
            .await?;
        layer_xyz_options::Entity::delete_many()
            .filter(layer_xyz_options::Column::LayerId.eq(layer_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// Delete every child link of `parent_id`, then link `child_ids` at positions 1..n.
    pub async fn replace_switch_children(
        &self,
        parent_id: i32,
        child_ids: &[i32],
    ) -> Result<(), sea_orm::DbErr> {
        switch_layer_children::Entity::delete_many()
            .filter(switch_layer_children::Column::ParentLayerId.eq(parent_id))
            .exec(self.conn)
            .await?;

        for (index, child_id) in child_ids.iter().enumerate() {
            let active = switch_layer_children::ActiveModel {
                parent_layer_id: Set(parent_id),
                child_layer_id: Set(*child_id),
                position: Set(index as i32 + 1),
                ..Default::default()
            };
            switch_layer_children::Entity::insert(active)
                .exec(self.conn)
                .await?;
        }
        Ok(())
    }

    pub async fn list_layers(&self, portal_id: i32) -> Result<Vec<layers::Model>, sea_orm::DbErr> {
        layers::Entity::find()
            .filter(layers::Column::PortalId.eq(portal_id))
            .order_by_asc(layers::Column::LayerType)
            .order_by_asc(layers::Column::LayerKey)
            .all(self.conn)
            .await
    }

    /// Ids of every layer used as a switchlayer child within the portal
    pub async fn switch_child_ids(&self, portal_id: i32) -> Result<HashSet<i32>, sea_orm::DbErr> {
        let parent_ids: Vec<i32> = self
            .list_layers(portal_id)
            .await?
            .into_iter()
            .map(|layer| layer.id)
            .collect();
        if parent_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let links = switch_layer_children::Entity::find()
            .filter(switch_layer_children::Column::ParentLayerId.is_in(parent_ids))
            .all(self.conn)
            .await?;
        Ok(links.into_iter().map(|link| link.child_layer_id).collect())
    }

    /// Rebuild the full layer, switchlayer children included, from its rows.
    pub async fn load_spec(&self, layer: &layers::Model, policy: &TokenPolicy) -> CompilerResult<LayerSpec> {
        let mut spec = self.load_single(layer, policy).await?;
        if spec.layer_type != LayerType::SwitchLayer {
            return Ok(spec);
        }

        let links = switch_layer_children::Entity::find()
            .filter(switch_layer_children::Column::ParentLayerId.eq(layer.id))
            .order_by_asc(switch_layer_children::Column::Position)
            .all(self.conn)
            .await?;
        let mut children = Vec::with_capacity(links.len());
        for link in links {
            let child = layers::Entity::find_by_id(link.child_layer_id)
                .one(self.conn)
                .await?
                .ok_or_else(|| {
                    sea_orm::DbErr::RecordNotFound(format!("layer {}", link.child_layer_id))
                })?;
            children.push(self.load_single(&child, policy).await?);
        }
        spec.body = LayerBody::Switch(children);
        Ok(spec)
    }

    /// Core row plus side tables. Switchlayer bodies come back without children.
    async fn load_single(&self, layer: &layers::Model, policy: &TokenPolicy) -> CompilerResult<LayerSpec> {
        let layer_type: LayerType = layer.layer_type.parse().map_err(|reason| {
            CompilerError::parse(format!("layers.{}", layer.layer_key), reason)
        })?;

        let body = match layer_type {
            LayerType::Wms | LayerType::Wfs | LayerType::ArcGisRest => {
                LayerBody::Service(self.load_service_body(layer.id).await?)
            }
            LayerType::Xyz => {
                let row = layer_xyz_options::Entity::find_by_id(layer.id)
                    .one(self.conn)
                    .await?;
                LayerBody::Xyz(row.map(|row| xyz_body(row, policy)).unwrap_or_default())
            }
            LayerType::SwitchLayer => LayerBody::Switch(Vec::new()),
        };

        Ok(LayerSpec {
            layer_key: layer.layer_key.clone(),
            layer_type,
            attributes: attributes(layer),
            body,
        })
    }

    async fn load_service_body(&self, layer_id: i32) -> Result<ServiceBody, sea_orm::DbErr> {
        let options = layer_server_options::Entity::find_by_id(layer_id)
            .one(self.conn)
            .await?;
        let styles = layer_styles::Entity::find()
            .filter(layer_styles::Column::LayerId.eq(layer_id))
            .order_by_asc(layer_styles::Column::DisplayOrder)
            .order_by_asc(layer_styles::Column::Name)
            .all(self.conn)
            .await?;

        let styles = styles
            .into_iter()
            .map(|style| StyleSpec {
                name: style.name,
                title: style.title,
                label_rule: style.label_rule,
                legend_url: style.legend_url,
            })
            .collect();

        Ok(match options {
            Some(row) => ServiceBody {
                server_options: ServerOptions {
                    layers: row.wms_layers,
                    order_by: row.order_by,
                    property_name: row.property_name,
                    version: row.version,
                    max_resolution: row.max_resolution,
                    extras: into_object(row.extras),
                },
                styles,
                feature_type: row.feature_type,
                geom_field_name: row.geom_field_name,
            },
            None => ServiceBody {
                styles,
                ..Default::default()
            },
        })
    }
}

fn attributes(layer: &layers::Model) -> LayerAttributes {
    LayerAttributes {
        title: layer.title.clone(),
        grid_xtype: layer.grid_xtype.clone(),
        id_property: layer.id_property.clone(),
        label_class_name: layer.label_class_name.clone(),
        legend_width: layer.legend_width,
        visibility: layer.visibility,
        vector_features_min_scale: layer.vector_features_min_scale,
        feature_info_window: layer.feature_info_window,
        has_metadata: layer.has_metadata,
        is_base_layer: layer.is_base_layer,
        qtip: layer.qtip.clone(),
        open_layers: match &layer.open_layers {
            Some(Value::Object(object)) if !object.is_empty() => Some(object.clone()),
            _ => None,
        },
        tooltips_config: match &layer.tooltips_config {
            Some(Value::Array(items)) if !items.is_empty() => Some(items.clone()),
            _ => None,
        },
        grouping: match &layer.grouping {
            Some(Value::Object(object)) if !object.is_empty() => Some(object.clone()),
            _ => None,
        },
        extras: into_object(layer.extras.clone()),
    }
}

fn xyz_body(row: layer_xyz_options::Model, policy: &TokenPolicy) -> XyzBody {
    XyzBody {
        url: row
            .url_template
            .map(|template| policy.resolve(&template, row.access_token.as_deref())),
        projection: row.projection,
        tile_size: row.tile_size,
        attribution: row.attribution_html,
        extent: row.extent,
        tile_grid: row.tile_grid,
    }
}

fn object_or_none(object: &Map<String, Value>) -> Option<Value> {
    (!object.is_empty()).then(|| Value::Object(object.clone()))
}

fn into_object(value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(object)) => object,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::repositories::DefaultsRepository;
    use serde_json::json;

    fn spec(raw: Value) -> LayerSpec {
        LayerSpec::from_json(&raw, "test.json").unwrap()
    }

    #[tokio::test]
    async fn test_upsert_preserves_layer_id() {
        let db = setup_test_db().await;
        let portal = DefaultsRepository::new(&db)
            .ensure_portal("default")
            .await
            .unwrap();
        let repo = LayerRepository::new(&db);

        let first = repo
            .upsert_layer(portal.id, &spec(json!({"layerType": "wms", "layerKey": "A", "title": "Old"})))
            .await
            .unwrap();
        let second = repo
            .upsert_layer(portal.id, &spec(json!({"layerType": "wms", "layerKey": "A", "title": "New"})))
            .await
            .unwrap();

        assert_eq!(first, second);
        let stored = repo.find_by_key(portal.id, "A").await.unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("New"));
    }

    #[tokio::test]
    async fn test_xyz_url_is_stored_as_template() {
        let db = setup_test_db().await;
        let portal = DefaultsRepository::new(&db)
            .ensure_portal("default")
            .await
            .unwrap();
        let repo = LayerRepository::new(&db);
        let policy = TokenPolicy::new("access_token", "{MAPBOX_TOKEN}").unwrap();

        let layer = spec(json!({
            "layerType": "xyz",
            "layerKey": "BASE",
            "url": "https://x/{z}/{x}/{y}?access_token=ABC123",
        }));
        let id = repo.upsert_layer(portal.id, &layer).await.unwrap();
        repo.replace_body(id, &layer.body, &policy).await.unwrap();

        let row = layer_xyz_options::Entity::find_by_id(id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            row.url_template.as_deref(),
            Some("https://x/{z}/{x}/{y}?access_token={MAPBOX_TOKEN}")
        );
        assert_eq!(row.access_token.as_deref(), Some("ABC123"));

        let stored = repo.find_by_key(portal.id, "BASE").await.unwrap().unwrap();
        let loaded = repo.load_spec(&stored, &policy).await.unwrap();
        assert_eq!(loaded, layer);
    }

    #[tokio::test]
    async fn test_styles_are_rewritten_in_order() {
        let db = setup_test_db().await;
        let portal = DefaultsRepository::new(&db)
            .ensure_portal("default")
            .await
            .unwrap();
        let repo = LayerRepository::new(&db);
        let policy = TokenPolicy::new("access_token", "{MAPBOX_TOKEN}").unwrap();

        let layer = spec(json!({
            "layerType": "wms",
            "layerKey": "ROADS",
            "styles": [{"name": "b", "title": "B"}, {"name": "a", "title": "A"}],
        }));
        let id = repo.upsert_layer(portal.id, &layer).await.unwrap();
        repo.replace_body(id, &layer.body, &policy).await.unwrap();
        repo.replace_body(id, &layer.body, &policy).await.unwrap();

        let styles = layer_styles::Entity::find()
            .filter(layer_styles::Column::LayerId.eq(id))
            .order_by_asc(layer_styles::Column::DisplayOrder)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].name, "b");
        assert!(styles[0].is_default);
        assert!(!styles[1].is_default);
    }
}
