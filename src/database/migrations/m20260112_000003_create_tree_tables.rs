use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceLayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceLayers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceLayers::LayerKey)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceLayers::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PortalTreeNodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PortalTreeNodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PortalTreeNodes::PortalId).integer().not_null())
                    .col(ColumnDef::new(PortalTreeNodes::ParentNodeId).integer().null())
                    .col(ColumnDef::new(PortalTreeNodes::IsFolder).boolean().not_null())
                    .col(ColumnDef::new(PortalTreeNodes::FolderTitle).string().null())
                    .col(ColumnDef::new(PortalTreeNodes::FolderId).string().null())
                    .col(
                        ColumnDef::new(PortalTreeNodes::ExpandedDefault)
                            .boolean()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PortalTreeNodes::CheckedDefault)
                            .boolean()
                            .null(),
                    )
                    .col(ColumnDef::new(PortalTreeNodes::LayerKey).string().null())
                    .col(ColumnDef::new(PortalTreeNodes::LayerTitle).string().null())
                    .col(ColumnDef::new(PortalTreeNodes::Glyph).string().null())
                    .col(ColumnDef::new(PortalTreeNodes::Tooltip).text().null())
                    .col(
                        ColumnDef::new(PortalTreeNodes::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portal_tree_nodes_portal")
                            .from(PortalTreeNodes::Table, PortalTreeNodes::PortalId)
                            .to(Portals::Table, Portals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portal_tree_nodes_parent")
                            .from(PortalTreeNodes::Table, PortalTreeNodes::ParentNodeId)
                            .to(PortalTreeNodes::Table, PortalTreeNodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portal_tree_nodes_service_layer")
                            .from(PortalTreeNodes::Table, PortalTreeNodes::LayerKey)
                            .to(ServiceLayers::Table, ServiceLayers::LayerKey),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_portal_tree_nodes_portal_parent")
                    .table(PortalTreeNodes::Table)
                    .col(PortalTreeNodes::PortalId)
                    .col(PortalTreeNodes::ParentNodeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PortalTreeNodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServiceLayers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceLayers {
    Table,
    Id,
    LayerKey,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PortalTreeNodes {
    Table,
    Id,
    PortalId,
    ParentNodeId,
    IsFolder,
    FolderTitle,
    FolderId,
    ExpandedDefault,
    CheckedDefault,
    LayerKey,
    LayerTitle,
    Glyph,
    Tooltip,
    DisplayOrder,
}

#[derive(DeriveIden)]
enum Portals {
    Table,
    Id,
}
