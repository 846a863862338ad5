use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::database::entities::{portal_tree_nodes, service_layers};
use crate::tree::{FolderSpec, LeafSpec, TreeDocument, TreeNodeSpec};

/// Navigation tree rows and the service-layer registry
pub struct TreeRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> TreeRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn registered_keys(&self) -> Result<HashSet<String>, sea_orm::DbErr> {
        let rows = service_layers::Entity::find().all(self.conn).await?;
        Ok(rows.into_iter().map(|row| row.layer_key).collect())
    }

    /// Add the keys missing from the registry. Returns how many were inserted.
    pub async fn register_keys(&self, keys: &BTreeSet<String>) -> Result<usize, sea_orm::DbErr> {
        let existing = self.registered_keys().await?;
        let now = Utc::now();
        let mut inserted = 0;
        for key in keys.iter().filter(|key| !existing.contains(*key)) {
            let active = service_layers::ActiveModel {
                layer_key: Set(key.clone()),
                created_at: Set(now),
                ..Default::default()
            };
            service_layers::Entity::insert(active).exec(self.conn).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    pub async fn delete_tree(&self, portal_id: i32) -> Result<u64, sea_orm::DbErr> {
        let result = portal_tree_nodes::Entity::delete_many()
            .filter(portal_tree_nodes::Column::PortalId.eq(portal_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Insert every node of `tree`; `display_order` is the index within the parent's children.
    /// Returns the number of rows written.
    pub async fn insert_tree(&self, portal_id: i32, tree: &TreeDocument) -> Result<usize, sea_orm::DbErr> {
        let mut pending: Vec<(Option<i32>, &[TreeNodeSpec])> = vec![(None, tree.children.as_slice())];
        let mut written = 0;

        while let Some((parent_id, children)) = pending.pop() {
            for (index, node) in children.iter().enumerate() {
                let active = node_row(portal_id, parent_id, index as i32, node);
                let result = portal_tree_nodes::Entity::insert(active)
                    .exec(self.conn)
                    .await?;
                written += 1;
                if let TreeNodeSpec::Folder(folder) = node {
                    pending.push((Some(result.last_insert_id), folder.children.as_slice()));
                }
            }
        }
        Ok(written)
    }

    /// Rebuild the stored tree. Folders without a stored id are named `folder-<rowId>`.
    pub async fn load_tree(&self, portal_id: i32) -> Result<TreeDocument, sea_orm::DbErr> {
        let rows = portal_tree_nodes::Entity::find()
            .filter(portal_tree_nodes::Column::PortalId.eq(portal_id))
            .order_by_asc(portal_tree_nodes::Column::DisplayOrder)
            .order_by_asc(portal_tree_nodes::Column::Id)
            .all(self.conn)
            .await?;

        let mut by_parent: HashMap<Option<i32>, Vec<portal_tree_nodes::Model>> = HashMap::new();
        for row in rows {
            by_parent.entry(row.parent_node_id).or_default().push(row);
        }
        Ok(TreeDocument {
            children: build_children(&mut by_parent, None),
        })
    }
}

fn node_row(
    portal_id: i32,
    parent_id: Option<i32>,
    display_order: i32,
    node: &TreeNodeSpec,
) -> portal_tree_nodes::ActiveModel {
    match node {
        TreeNodeSpec::Folder(folder) => portal_tree_nodes::ActiveModel {
            portal_id: Set(portal_id),
            parent_node_id: Set(parent_id),
            is_folder: Set(true),
            folder_title: Set(Some(folder.title.clone())),
            folder_id: Set(folder.id.clone()),
            expanded_default: Set(Some(folder.expanded)),
            checked_default: Set(Some(folder.checked)),
            display_order: Set(display_order),
            ..Default::default()
        },
        TreeNodeSpec::Leaf(leaf) => portal_tree_nodes::ActiveModel {
            portal_id: Set(portal_id),
            parent_node_id: Set(parent_id),
            is_folder: Set(false),
            layer_key: Set(Some(leaf.layer_key.clone())),
            layer_title: Set(leaf.title.clone()),
            glyph: Set(leaf.glyph.clone()),
            tooltip: Set(leaf.tooltip.clone()),
            checked_default: Set(Some(leaf.checked)),
            display_order: Set(display_order),
            ..Default::default()
        },
    }
}

fn build_children(
    by_parent: &mut HashMap<Option<i32>, Vec<portal_tree_nodes::Model>>,
    parent_id: Option<i32>,
) -> Vec<TreeNodeSpec> {
    let rows = by_parent.remove(&parent_id).unwrap_or_default();
    rows.into_iter()
        .map(|row| {
            if row.is_folder {
                TreeNodeSpec::Folder(FolderSpec {
                    id: Some(row.folder_id.unwrap_or_else(|| format!("folder-{}", row.id))),
                    title: row.folder_title.unwrap_or_default(),
                    expanded: row.expanded_default.unwrap_or(false),
                    checked: row.checked_default.unwrap_or(false),
                    children: build_children(by_parent, Some(row.id)),
                })
            } else {
                TreeNodeSpec::Leaf(LeafSpec {
                    layer_key: row.layer_key.unwrap_or_default(),
                    title: row.layer_title,
                    glyph: row.glyph,
                    tooltip: row.tooltip,
                    checked: row.checked_default.unwrap_or(false),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::repositories::DefaultsRepository;
    use serde_json::json;

    #[tokio::test]
    async fn test_tree_round_trip() {
        let db = setup_test_db().await;
        let portal = DefaultsRepository::new(&db)
            .ensure_portal("default")
            .await
            .unwrap();
        let repo = TreeRepository::new(&db);

        let keys: BTreeSet<String> = ["A", "B"].iter().map(|k| k.to_string()).collect();
        assert_eq!(repo.register_keys(&keys).await.unwrap(), 2);
        assert_eq!(repo.register_keys(&keys).await.unwrap(), 0);

        let raw = json!({"treeConfig": {"children": [
            {"id": "grp", "title": "Group", "children": [{"id": "B"}, {"id": "A", "text": "Layer A"}]},
            {"id": "A", "checked": true},
        ]}});
        let tree = TreeDocument::from_json(&raw, "tree.json", "default").unwrap();
        assert_eq!(repo.insert_tree(portal.id, &tree).await.unwrap(), 4);

        let loaded = repo.load_tree(portal.id).await.unwrap();
        assert_eq!(loaded, tree);

        repo.delete_tree(portal.id).await.unwrap();
        assert!(repo.load_tree(portal.id).await.unwrap().children.is_empty());
    }
}
