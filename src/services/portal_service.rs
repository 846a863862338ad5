use sea_orm::DatabaseConnection;

use crate::database::entities::portals;
use crate::errors::CompilerResult;
use crate::repositories::DefaultsRepository;

pub struct PortalService {
    db: DatabaseConnection,
}

impl PortalService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registered portals ordered by code
    pub async fn list_portals(&self) -> CompilerResult<Vec<portals::Model>> {
        Ok(DefaultsRepository::new(&self.db).list_portals().await?)
    }
}
