use tracing::{info, warn};
use uuid::Uuid;

use super::{EntityKind, ServiceError};
use crate::database::models::{Asset, Owner};
use crate::database::{Changes, DatabaseError, DatabaseManager, Page, Repository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOwner {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Fields to change on an owner. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OwnerService {
    db: DatabaseManager,
}

impl OwnerService {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    /// Create an owner. The email is checked up front, and a unique violation
    /// from a concurrent writer is still reported as the same conflict.
    pub async fn create(&self, new: NewOwner) -> Result<Owner, ServiceError> {
        let mut tx = self.db.begin_write().await?;

        if Repository::<Owner>::find_by(tx.conn()?, "email", &new.email).await?.is_some() {
            warn!("Owner email already registered: {}", new.email);
            return Err(ServiceError::conflict("email", new.email));
        }

        let changes = Changes::new()
            .set("id", Uuid::new_v4().to_string())
            .set("name", new.name)
            .set("email", new.email.clone())
            .set("phone", new.phone);

        let owner = Repository::<Owner>::insert(tx.conn()?, changes)
            .await
            .map_err(|e| email_conflict(e, &new.email))?;
        tx.commit().await?;

        info!("Created owner {}", owner.id);
        Ok(owner)
    }

    pub async fn get(&self, id: &str) -> Result<Owner, ServiceError> {
        let mut conn = self.db.acquire().await?;
        Repository::<Owner>::find(&mut *conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Owner, id))
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Owner>, ServiceError> {
        let mut conn = self.db.acquire().await?;
        Ok(Repository::<Owner>::list(&mut *conn, page).await?)
    }

    /// Apply only the supplied fields. A new email must not belong to another owner.
    pub async fn update(&self, id: &str, patch: OwnerPatch) -> Result<Owner, ServiceError> {
        let mut tx = self.db.begin_write().await?;

        let current = Repository::<Owner>::find(tx.conn()?, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Owner, id))?;

        if let Some(email) = patch.email.as_deref() {
            if email != current.email
                && Repository::<Owner>::taken_by_other(tx.conn()?, "email", email, id).await?
            {
                warn!("Owner {} cannot take email already registered: {}", id, email);
                return Err(ServiceError::conflict("email", email));
            }
        }

        let attempted_email = patch.email.clone().unwrap_or_default();
        let changes = Changes::new()
            .set_opt("name", patch.name)
            .set_opt("email", patch.email)
            .set_opt("phone", patch.phone);

        let owner = Repository::<Owner>::update(tx.conn()?, id, changes)
            .await
            .map_err(|e| email_conflict(e, &attempted_email))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Owner, id))?;
        tx.commit().await?;

        Ok(owner)
    }

    /// Delete the owner and, through the foreign key cascade, all of its assets
    /// in one transaction. Returns false when the owner does not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let mut tx = self.db.begin_write().await?;

        let asset_count = Repository::<Asset>::count_where(tx.conn()?, "owner_id", id).await?;
        if !Repository::<Owner>::delete(tx.conn()?, id).await? {
            return Ok(false);
        }
        tx.commit().await?;

        info!("Deleted owner {} with {} asset(s)", id, asset_count);
        Ok(true)
    }
}

fn email_conflict(err: DatabaseError, email: &str) -> ServiceError {
    match err {
        DatabaseError::UniqueViolation(_) => ServiceError::conflict("email", email),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NewAsset;
    use crate::testing::TestContext;

    fn ana() -> NewOwner {
        NewOwner {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_uuid_and_get_returns_it() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.owners.create(ana()).await.unwrap();

        assert!(Uuid::parse_str(&owner.id).is_ok());
        assert_eq!(ctx.owners.get(&owner.id).await.unwrap(), owner);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_without_writing() {
        let ctx = TestContext::new().await.unwrap();
        ctx.owners.create(ana()).await.unwrap();

        let mut dup = ana();
        dup.name = "Other".to_string();
        let err = ctx.owners.create(dup).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { field: "email", .. }));

        let all = ctx.owners.list(Page::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Ana");
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let ctx = TestContext::new().await.unwrap();
        ctx.owners.create(ana()).await.unwrap();

        let err = ctx
            .owners
            .create(NewOwner {
                email: "ANA@X.COM".to_string(),
                ..ana()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { field: "email", .. }));
    }

    async fn create_concurrently(ctx: &TestContext, emails: Vec<String>) -> Vec<Result<Owner, ServiceError>> {
        let tasks: Vec<_> = emails
            .into_iter()
            .map(|email| {
                let owners = ctx.owners.clone();
                tokio::spawn(async move { owners.create(NewOwner { email, ..ana() }).await })
            })
            .collect();

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_on_a_file_database_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TestContext::on_file(dir.path(), 8).await.unwrap();

        let emails = (0..16).map(|i| format!("owner{}@x.com", i)).collect();
        let results = create_concurrently(&ctx, emails).await;

        for result in &results {
            assert!(result.is_ok(), "{:?}", result);
        }
        assert_eq!(ctx.owners.list(Page::default()).await.unwrap().len(), 16);
        ctx.db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_creates_for_one_email_yield_one_owner_and_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TestContext::on_file(dir.path(), 8).await.unwrap();

        let results = create_concurrently(&ctx, vec!["same@x.com".to_string(); 16]).await;

        let created = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::Conflict { field: "email", .. })))
            .count();
        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(ctx.owners.list(Page::default()).await.unwrap().len(), 1);
        ctx.db.close().await;
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let err = ctx.owners.get("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(EntityKind::Owner, _)));
    }

    #[tokio::test]
    async fn partial_update_changes_only_supplied_fields() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.owners.create(ana()).await.unwrap();

        let updated = ctx
            .owners
            .update(
                &owner.id,
                OwnerPatch {
                    phone: Some("X".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.phone, "X");
        assert_eq!(updated.name, owner.name);
        assert_eq!(updated.email, owner.email);
    }

    #[tokio::test]
    async fn update_email_excludes_self_but_not_others() {
        let ctx = TestContext::new().await.unwrap();
        let first = ctx.owners.create(ana()).await.unwrap();
        let second = ctx
            .owners
            .create(NewOwner {
                email: "bia@x.com".to_string(),
                ..ana()
            })
            .await
            .unwrap();

        // Re-submitting your own email is fine
        let same = ctx
            .owners
            .update(
                &first.id,
                OwnerPatch {
                    email: Some("ana@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.email, "ana@x.com");

        let err = ctx
            .owners
            .update(
                &second.id,
                OwnerPatch {
                    name: Some("Renamed".to_string()),
                    email: Some("ana@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { .. }));

        // Rejected update left the row untouched
        assert_eq!(ctx.owners.get(&second.id).await.unwrap(), second);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let err = ctx
            .owners
            .update("missing", OwnerPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(EntityKind::Owner, _)));
    }

    #[tokio::test]
    async fn delete_cascades_to_assets() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.owners.create(ana()).await.unwrap();
        let keeper = ctx
            .owners
            .create(NewOwner {
                email: "keeper@x.com".to_string(),
                ..ana()
            })
            .await
            .unwrap();

        let mut owned = Vec::new();
        for i in 0..3 {
            let asset = ctx
                .assets
                .create(NewAsset {
                    name: format!("Asset {}", i),
                    category: "Tool".to_string(),
                    owner_id: owner.id.clone(),
                })
                .await
                .unwrap();
            owned.push(asset.id);
        }
        let survivor = ctx
            .assets
            .create(NewAsset {
                name: "Kept".to_string(),
                category: "Tool".to_string(),
                owner_id: keeper.id.clone(),
            })
            .await
            .unwrap();

        assert!(ctx.owners.delete(&owner.id).await.unwrap());
        assert!(!ctx.owners.delete(&owner.id).await.unwrap());

        for id in owned {
            let err = ctx.assets.get(&id).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(EntityKind::Asset, _)));
        }
        assert_eq!(ctx.assets.get(&survivor.id).await.unwrap(), survivor);
    }
}
