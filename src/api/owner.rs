use serde::Deserialize;

use super::validate::FieldErrors;
use crate::error::ApiError;
use crate::services::{NewOwner, OwnerPatch};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOwnerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CreateOwnerRequest {
    pub fn validate(self) -> Result<NewOwner, ApiError> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("name", self.name.as_deref(), 1, 140);
        let email = errors.required_email("email", self.email.as_deref());
        let phone = errors.required_text("phone", self.phone.as_deref(), 1, 20);
        errors.finish()?;

        match (name, email, phone) {
            (Some(name), Some(email), Some(phone)) => Ok(NewOwner { name, email, phone }),
            _ => Err(ApiError::internal_server_error("Owner validation produced no value")),
        }
    }
}

/// Every field optional; only the ones present are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOwnerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateOwnerRequest {
    pub fn validate(self) -> Result<OwnerPatch, ApiError> {
        let mut errors = FieldErrors::new();
        let patch = OwnerPatch {
            name: errors.optional_text("name", self.name.as_deref(), 1, 140),
            email: errors.optional_email("email", self.email.as_deref()),
            phone: errors.optional_text("phone", self.phone.as_deref(), 1, 20),
        };
        errors.finish()?;
        Ok(patch)
    }
}
