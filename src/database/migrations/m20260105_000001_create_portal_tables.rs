use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Portals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Portals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Portals::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Portals::Title).string().not_null())
                    .col(
                        ColumnDef::new(Portals::CreatedAt)
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
                    .table(GlobalDefaults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GlobalDefaults::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GlobalDefaults::PortalId).integer().not_null())
                    .col(ColumnDef::new(GlobalDefaults::Key).string().not_null())
                    .col(ColumnDef::new(GlobalDefaults::ValueJson).text().not_null())
                    .index(
                        Index::create()
                            .name("idx_global_defaults_portal_key")
                            .col(GlobalDefaults::PortalId)
                            .col(GlobalDefaults::Key)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_global_defaults_portal")
                            .from(GlobalDefaults::Table, GlobalDefaults::PortalId)
                            .to(Portals::Table, Portals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LayerTypeDefaults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LayerTypeDefaults::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LayerTypeDefaults::PortalId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LayerTypeDefaults::LayerType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LayerTypeDefaults::Defaults)
                            .json_binary()
                            .not_null(),
                    )
                    .index(
                        Index::create()
                            .name("idx_layer_type_defaults_portal_type")
                            .col(LayerTypeDefaults::PortalId)
                            .col(LayerTypeDefaults::LayerType)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_layer_type_defaults_portal")
                            .from(LayerTypeDefaults::Table, LayerTypeDefaults::PortalId)
                            .to(Portals::Table, Portals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LayerTypeDefaults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GlobalDefaults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Portals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Portals {
    Table,
    Id,
    Code,
    Title,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GlobalDefaults {
    Table,
    Id,
    PortalId,
    Key,
    ValueJson,
}

#[derive(DeriveIden)]
enum LayerTypeDefaults {
    Table,
    Id,
    PortalId,
    LayerType,
    Defaults,
}
