use serde::Deserialize;

use super::validate::FieldErrors;
use crate::error::ApiError;
use crate::services::{AssetPatch, NewAsset};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAssetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub owner_id: Option<String>,
}

impl CreateAssetRequest {
    pub fn validate(self) -> Result<NewAsset, ApiError> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("name", self.name.as_deref(), 1, 140);
        let category = errors.required_text("category", self.category.as_deref(), 1, 60);
        let owner_id = errors.required_uuid("owner_id", self.owner_id.as_deref());
        errors.finish()?;

        match (name, category, owner_id) {
            (Some(name), Some(category), Some(owner_id)) => Ok(NewAsset {
                name,
                category,
                owner_id,
            }),
            _ => Err(ApiError::internal_server_error("Asset validation produced no value")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub owner_id: Option<String>,
}

impl UpdateAssetRequest {
    pub fn validate(self) -> Result<AssetPatch, ApiError> {
        let mut errors = FieldErrors::new();
        let patch = AssetPatch {
            name: errors.optional_text("name", self.name.as_deref(), 1, 140),
            category: errors.optional_text("category", self.category.as_deref(), 1, 60),
            owner_id: errors.optional_uuid("owner_id", self.owner_id.as_deref()),
        };
        errors.finish()?;
        Ok(patch)
    }
}
