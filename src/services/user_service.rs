use tracing::{info, warn};
use uuid::Uuid;

use super::{EntityKind, ServiceError};
use crate::auth::PasswordHasher;
use crate::database::models::User;
use crate::database::{Changes, DatabaseError, DatabaseManager, Page, Repository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub login: String,
    pub password: String,
}

/// Fields to change on a user. A new password is hashed before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub login: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UserService {
    db: DatabaseManager,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(db: DatabaseManager, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    pub async fn create_user(&self, new: NewUser) -> Result<User, ServiceError> {
        let hashed_password = self.hash(&new.password).await?;
        let mut tx = self.db.begin_write().await?;

        if Repository::<User>::find_by(tx.conn()?, "login", &new.login).await?.is_some() {
            warn!("Login already registered: {}", new.login);
            return Err(ServiceError::conflict("login", new.login));
        }

        let changes = Changes::new()
            .set("id", Uuid::new_v4().to_string())
            .set("login", new.login.clone())
            .set("hashed_password", hashed_password)
            .set("is_active", true);

        let user = Repository::<User>::insert(tx.conn()?, changes)
            .await
            .map_err(|e| login_conflict(e, &new.login))?;
        tx.commit().await?;

        info!("Created user {} ({})", user.login, user.id);
        Ok(user)
    }

    /// Create the account unless the login already exists. Returns the user and
    /// whether it was created.
    pub async fn ensure_user(&self, login: &str, password: &str) -> Result<(User, bool), ServiceError> {
        if let Some(existing) = self.find_by_login(login).await? {
            return Ok((existing, false));
        }

        let new = NewUser {
            login: login.to_string(),
            password: password.to_string(),
        };
        match self.create_user(new).await {
            Ok(user) => Ok((user, true)),
            // Lost a race with another writer; theirs is as good as ours
            Err(ServiceError::Conflict { .. }) => {
                let user = self
                    .find_by_login(login)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(EntityKind::User, login))?;
                Ok((user, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Unknown login, wrong password and inactive account all yield `None`.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>, ServiceError> {
        let user = match self.find_by_login(login).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if !user.is_active {
            return Ok(None);
        }
        let verified = self
            .hasher
            .verify_blocking(password, &user.hashed_password)
            .await
            .map_err(|e| ServiceError::Hashing(e.to_string()))?;
        if !verified {
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub async fn get(&self, id: &str) -> Result<User, ServiceError> {
        let mut conn = self.db.acquire().await?;
        Repository::<User>::find(&mut *conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, ServiceError> {
        let mut conn = self.db.acquire().await?;
        Ok(Repository::<User>::find_by(&mut *conn, "login", login).await?)
    }

    pub async fn list(&self, page: Page) -> Result<Vec<User>, ServiceError> {
        let mut conn = self.db.acquire().await?;
        Ok(Repository::<User>::list(&mut *conn, page).await?)
    }

    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, ServiceError> {
        let hashed_password = match patch.password.as_deref() {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        let mut tx = self.db.begin_write().await?;

        let current = Repository::<User>::find(tx.conn()?, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))?;

        if let Some(login) = patch.login.as_deref() {
            if login != current.login && Repository::<User>::taken_by_other(tx.conn()?, "login", login, id).await? {
                warn!("User {} cannot take login already registered: {}", id, login);
                return Err(ServiceError::conflict("login", login));
            }
        }

        let attempted_login = patch.login.clone().unwrap_or_default();
        let changes = Changes::new()
            .set_opt("login", patch.login)
            .set_opt("hashed_password", hashed_password)
            .set_opt("is_active", patch.is_active);

        let user = Repository::<User>::update(tx.conn()?, id, changes)
            .await
            .map_err(|e| login_conflict(e, &attempted_login))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))?;
        tx.commit().await?;

        Ok(user)
    }

    /// Returns false when the user does not exist
    pub async fn delete_user(&self, id: &str) -> Result<bool, ServiceError> {
        let mut tx = self.db.begin_write().await?;
        if !Repository::<User>::delete(tx.conn()?, id).await? {
            return Ok(false);
        }
        tx.commit().await?;

        info!("Deleted user {}", id);
        Ok(true)
    }

    async fn hash(&self, password: &str) -> Result<String, ServiceError> {
        self.hasher
            .hash_blocking(password)
            .await
            .map_err(|e| ServiceError::Hashing(e.to_string()))
    }
}

fn login_conflict(err: DatabaseError, login: &str) -> ServiceError {
    match err {
        DatabaseError::UniqueViolation(_) => ServiceError::conflict("login", login),
        other => other.into(),
    }
}
