//! HTTP request and response shapes, and the extractors that produce them.
pub mod asset;
pub mod auth;
pub mod extract;
pub mod owner;
pub mod user;
pub mod validate;

use serde::Deserialize;

use crate::config::ApiConfig;
use crate::database::Page;
use crate::error::ApiError;
use validate::FieldErrors;

pub use extract::{JsonOrForm, ValidJson, ValidPath, ValidQuery};

/// `?skip=&limit=` on list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Apply defaults and clamp `limit` to the configured maximum.
    pub fn into_page(self, api: &ApiConfig) -> Result<Page, ApiError> {
        let mut errors = FieldErrors::new();
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(api.default_limit);

        if skip < 0 {
            errors.add("skip", "must not be negative");
        }
        if limit < 0 {
            errors.add("limit", "must not be negative");
        }
        errors.finish()?;

        Ok(Page {
            skip,
            limit: limit.min(api.max_limit),
        })
    }
}
