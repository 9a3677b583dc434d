use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::Entity;

/// A party responsible for zero or more assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Entity for Owner {
    const TABLE: &'static str = "owners";
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "phone"];
}
