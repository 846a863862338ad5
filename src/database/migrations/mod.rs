pub use sea_orm_migration::prelude::*;

mod m20260105_000001_create_portal_tables;
mod m20260105_000002_create_layer_tables;
mod m20260112_000003_create_tree_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_create_portal_tables::Migration),
            Box::new(m20260105_000002_create_layer_tables::Migration),
            Box::new(m20260112_000003_create_tree_tables::Migration),
        ]
    }
}
