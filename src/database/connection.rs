use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::debug;

use super::migrations::Migrator;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    // One writer, one batch at a time
    opt.max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Database::connect(opt).await
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(path) if path == ":memory:" => "sqlite::memory:".to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
        None => "sqlite://layerconfig.db?mode=rwc".to_string(),
    }
}

/// Open (creating if needed) and migrate the database at `database_path`
pub async fn connect_and_migrate(database_path: Option<&str>) -> Result<DatabaseConnection, DbErr> {
    let url = get_database_url(database_path);
    debug!("Opening database {}", url);
    let db = establish_connection(&url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}
