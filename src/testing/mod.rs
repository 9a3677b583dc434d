use std::path::Path;

use crate::auth::PasswordHasher;
use crate::config::DatabaseConfig;
use crate::database::DatabaseManager;
use crate::services::{AssetService, OwnerService, UserService};

/// Services wired to a private in-memory database, one per test
pub struct TestContext {
    pub db: DatabaseManager,
    pub owners: OwnerService,
    pub assets: AssetService,
    pub users: UserService,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let db = DatabaseManager::connect_in_memory()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open test database: {}", e))?;
        Ok(Self::with_database(db))
    }

    /// Services over a database file in `dir`, with a pool of several
    /// connections so writers really overlap.
    pub async fn on_file(dir: &Path, max_connections: u32) -> anyhow::Result<Self> {
        let path = dir.join("eyesonasset.db");
        let db = DatabaseManager::connect(&DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", path.display()),
            max_connections,
            connection_timeout: 10,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open test database file: {}", e))?;
        Ok(Self::with_database(db))
    }

    fn with_database(db: DatabaseManager) -> Self {
        Self {
            owners: OwnerService::new(db.clone()),
            assets: AssetService::new(db.clone()),
            users: UserService::new(db.clone(), PasswordHasher::new()),
            db,
        }
    }
}
