pub mod asset_service;
pub mod owner_service;
pub mod user_service;

pub use asset_service::{AssetPatch, AssetService, NewAsset};
pub use owner_service::{NewOwner, OwnerPatch, OwnerService};
pub use user_service::{NewUser, UserPatch, UserService};

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Owner,
    Asset,
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Owner => f.write_str("Owner"),
            EntityKind::Asset => f.write_str("Asset"),
            EntityKind::User => f.write_str("User"),
        }
    }
}

/// Domain outcomes that are not a plain value
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// `NotFound(Owner, ..)` raised while writing an asset means the referenced
    /// owner is missing, not the asset.
    #[error("{0} with ID '{1}' not found")]
    NotFound(EntityKind, String),

    #[error("{field} '{value}' is already registered")]
    Conflict { field: &'static str, value: String },

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        ServiceError::NotFound(kind, id.into())
    }

    pub fn conflict(field: &'static str, value: impl Into<String>) -> Self {
        ServiceError::Conflict {
            field,
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(err.into())
    }
}
