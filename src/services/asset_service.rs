use tracing::{info, warn};
use uuid::Uuid;

use super::{EntityKind, ServiceError};
use crate::database::models::{Asset, AssetDetail, Owner};
use crate::database::{Changes, DatabaseError, DatabaseManager, Page, Repository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub name: String,
    pub category: String,
    pub owner_id: String,
}

/// Fields to change on an asset. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssetService {
    db: DatabaseManager,
}

impl AssetService {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    /// Create an asset for an existing owner. A missing owner is reported as
    /// `NotFound(Owner, owner_id)` and nothing is written.
    pub async fn create(&self, new: NewAsset) -> Result<Asset, ServiceError> {
        let mut tx = self.db.begin_write().await?;

        if !Repository::<Owner>::exists(tx.conn()?, &new.owner_id).await? {
            warn!("Rejected asset for unknown owner {}", new.owner_id);
            return Err(ServiceError::not_found(EntityKind::Owner, new.owner_id));
        }

        let changes = Changes::new()
            .set("id", Uuid::new_v4().to_string())
            .set("name", new.name)
            .set("category", new.category)
            .set("owner_id", new.owner_id.clone());

        let asset = Repository::<Asset>::insert(tx.conn()?, changes)
            .await
            .map_err(|e| owner_gone(e, &new.owner_id))?;
        tx.commit().await?;

        info!("Created asset {} for owner {}", asset.id, asset.owner_id);
        Ok(asset)
    }

    pub async fn get(&self, id: &str) -> Result<Asset, ServiceError> {
        let mut conn = self.db.acquire().await?;
        Repository::<Asset>::find(&mut *conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Asset, id))
    }

    /// The asset together with its owner
    pub async fn get_detailed(&self, id: &str) -> Result<AssetDetail, ServiceError> {
        let mut conn = self.db.acquire().await?;
        let asset = Repository::<Asset>::find(&mut *conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Asset, id))?;
        let owner_ref = Repository::<Owner>::find(&mut *conn, &asset.owner_id).await?;

        Ok(AssetDetail { asset, owner_ref })
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Asset>, ServiceError> {
        let mut conn = self.db.acquire().await?;
        Ok(Repository::<Asset>::list(&mut *conn, page).await?)
    }

    /// Apply only the supplied fields. When `owner_id` is supplied the new owner
    /// must exist; otherwise the whole update is rejected and nothing changes.
    pub async fn update(&self, id: &str, patch: AssetPatch) -> Result<Asset, ServiceError> {
        let mut tx = self.db.begin_write().await?;

        let current = Repository::<Asset>::find(tx.conn()?, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Asset, id))?;

        if let Some(owner_id) = patch.owner_id.as_deref() {
            if owner_id != current.owner_id && !Repository::<Owner>::exists(tx.conn()?, owner_id).await? {
                warn!("Rejected move of asset {} to unknown owner {}", id, owner_id);
                return Err(ServiceError::not_found(EntityKind::Owner, owner_id));
            }
        }

        let target_owner = patch.owner_id.clone().unwrap_or(current.owner_id);
        let changes = Changes::new()
            .set_opt("name", patch.name)
            .set_opt("category", patch.category)
            .set_opt("owner_id", patch.owner_id);

        let asset = Repository::<Asset>::update(tx.conn()?, id, changes)
            .await
            .map_err(|e| owner_gone(e, &target_owner))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Asset, id))?;
        tx.commit().await?;

        Ok(asset)
    }

    /// Returns false when the asset does not exist
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let mut tx = self.db.begin_write().await?;
        if !Repository::<Asset>::delete(tx.conn()?, id).await? {
            return Ok(false);
        }
        tx.commit().await?;

        info!("Deleted asset {}", id);
        Ok(true)
    }
}

/// The owner was removed between the existence check and the write
fn owner_gone(err: DatabaseError, owner_id: &str) -> ServiceError {
    match err {
        DatabaseError::ForeignKeyViolation(_) => ServiceError::not_found(EntityKind::Owner, owner_id),
        other => other.into(),
    }
}
