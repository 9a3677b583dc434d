use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::models::owner::Owner;
use crate::database::repository::Entity;

/// A tracked item belonging to exactly one owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub category: String,
    pub owner_id: String,
}

impl Entity for Asset {
    const TABLE: &'static str = "assets";
    const COLUMNS: &'static [&'static str] = &["id", "name", "category", "owner_id"];
}

/// Asset with its owner embedded, as returned by the single-asset endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: Asset,
    pub owner_ref: Option<Owner>,
}
