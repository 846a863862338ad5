use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Layers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Layers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Layers::PortalId).integer().not_null())
                    .col(ColumnDef::new(Layers::LayerKey).string().not_null())
                    .col(ColumnDef::new(Layers::LayerType).string().not_null())
                    .col(ColumnDef::new(Layers::Title).string().null())
                    .col(ColumnDef::new(Layers::GridXtype).string().null())
                    .col(ColumnDef::new(Layers::IdProperty).string().null())
                    .col(ColumnDef::new(Layers::LabelClassName).string().null())
                    .col(ColumnDef::new(Layers::LegendWidth).double().null())
                    .col(ColumnDef::new(Layers::Visibility).boolean().null())
                    .col(
                        ColumnDef::new(Layers::VectorFeaturesMinScale)
                            .double()
                            .null(),
                    )
                    .col(ColumnDef::new(Layers::FeatureInfoWindow).boolean().null())
                    .col(ColumnDef::new(Layers::HasMetadata).boolean().null())
                    .col(ColumnDef::new(Layers::IsBaseLayer).boolean().null())
                    .col(ColumnDef::new(Layers::Qtip).string().null())
                    .col(ColumnDef::new(Layers::OpenLayers).json_binary().null())
                    .col(ColumnDef::new(Layers::TooltipsConfig).json_binary().null())
                    .col(ColumnDef::new(Layers::Grouping).json_binary().null())
                    .col(ColumnDef::new(Layers::Extras).json_binary().null())
                    .col(
                        ColumnDef::new(Layers::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Layers::UpdatedAt)
                            .date_time()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .index(
                        Index::create()
                            .name("idx_layers_portal_layer_key")
                            .col(Layers::PortalId)
                            .col(Layers::LayerKey)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_layers_portal")
                            .from(Layers::Table, Layers::PortalId)
                            .to(Portals::Table, Portals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LayerServerOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LayerServerOptions::LayerId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LayerServerOptions::WmsLayers).string().null())
                    .col(ColumnDef::new(LayerServerOptions::OrderBy).string().null())
                    .col(
                        ColumnDef::new(LayerServerOptions::PropertyName)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(LayerServerOptions::Version).string().null())
                    .col(
                        ColumnDef::new(LayerServerOptions::MaxResolution)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LayerServerOptions::FeatureType)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LayerServerOptions::GeomFieldName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LayerServerOptions::Extras)
                            .json_binary()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_layer_server_options_layer")
                            .from(LayerServerOptions::Table, LayerServerOptions::LayerId)
                            .to(Layers::Table, Layers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LayerXyzOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LayerXyzOptions::LayerId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LayerXyzOptions::UrlTemplate).text().null())
                    .col(ColumnDef::new(LayerXyzOptions::AccessToken).string().null())
                    .col(ColumnDef::new(LayerXyzOptions::Projection).string().null())
                    .col(ColumnDef::new(LayerXyzOptions::TileSize).json_binary().null())
                    .col(
                        ColumnDef::new(LayerXyzOptions::AttributionHtml)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(LayerXyzOptions::Extent).json_binary().null())
                    .col(ColumnDef::new(LayerXyzOptions::TileGrid).json_binary().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_layer_xyz_options_layer")
                            .from(LayerXyzOptions::Table, LayerXyzOptions::LayerId)
                            .to(Layers::Table, Layers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LayerStyles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LayerStyles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LayerStyles::LayerId).integer().not_null())
                    .col(ColumnDef::new(LayerStyles::Name).string().not_null())
                    .col(ColumnDef::new(LayerStyles::Title).string().not_null())
                    .col(ColumnDef::new(LayerStyles::LabelRule).string().null())
                    .col(ColumnDef::new(LayerStyles::LegendUrl).text().null())
                    .col(
                        ColumnDef::new(LayerStyles::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LayerStyles::DisplayOrder)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_layer_styles_layer")
                            .from(LayerStyles::Table, LayerStyles::LayerId)
                            .to(Layers::Table, Layers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SwitchLayerChildren::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SwitchLayerChildren::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SwitchLayerChildren::ParentLayerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SwitchLayerChildren::ChildLayerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SwitchLayerChildren::Position)
                            .integer()
                            .not_null(),
                    )
                    .index(
                        Index::create()
                            .name("idx_switch_layer_children_parent_position")
                            .col(SwitchLayerChildren::ParentLayerId)
                            .col(SwitchLayerChildren::Position)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_switch_layer_children_parent")
                            .from(SwitchLayerChildren::Table, SwitchLayerChildren::ParentLayerId)
                            .to(Layers::Table, Layers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_switch_layer_children_child")
                            .from(SwitchLayerChildren::Table, SwitchLayerChildren::ChildLayerId)
                            .to(Layers::Table, Layers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SwitchLayerChildren::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LayerStyles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LayerXyzOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LayerServerOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Layers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Layers {
    Table,
    Id,
    PortalId,
    LayerKey,
    LayerType,
    Title,
    GridXtype,
    IdProperty,
    LabelClassName,
    LegendWidth,
    Visibility,
    VectorFeaturesMinScale,
    FeatureInfoWindow,
    HasMetadata,
    IsBaseLayer,
    Qtip,
    OpenLayers,
    TooltipsConfig,
    Grouping,
    Extras,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LayerServerOptions {
    Table,
    LayerId,
    WmsLayers,
    OrderBy,
    PropertyName,
    Version,
    MaxResolution,
    FeatureType,
    GeomFieldName,
    Extras,
}

#[derive(DeriveIden)]
enum LayerXyzOptions {
    Table,
    LayerId,
    UrlTemplate,
    AccessToken,
    Projection,
    TileSize,
    AttributionHtml,
    Extent,
    TileGrid,
}

#[derive(DeriveIden)]
enum LayerStyles {
    Table,
    Id,
    LayerId,
    Name,
    Title,
    LabelRule,
    LegendUrl,
    IsDefault,
    DisplayOrder,
}

#[derive(DeriveIden)]
enum SwitchLayerChildren {
    Table,
    Id,
    ParentLayerId,
    ChildLayerId,
    Position,
}

#[derive(DeriveIden)]
enum Portals {
    Table,
    Id,
}
