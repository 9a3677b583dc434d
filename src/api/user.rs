use serde::Deserialize;

use super::validate::FieldErrors;
use crate::error::ApiError;
use crate::services::{NewUser, UserPatch};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, ApiError> {
        let mut errors = FieldErrors::new();
        let login = errors.required_text("login", self.login.as_deref(), 3, 140);
        let password = errors.required_password("password", self.password.as_deref());
        errors.finish()?;

        match (login, password) {
            (Some(login), Some(password)) => Ok(NewUser { login, password }),
            _ => Err(ApiError::internal_server_error("User validation produced no value")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserPatch, ApiError> {
        let mut errors = FieldErrors::new();
        let patch = UserPatch {
            login: errors.optional_text("login", self.login.as_deref(), 3, 140),
            password: errors.optional_password("password", self.password.as_deref()),
            is_active: self.is_active,
        };
        errors.finish()?;
        Ok(patch)
    }
}
