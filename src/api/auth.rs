use serde::{Deserialize, Serialize};

use crate::auth::IssuedToken;

/// Credentials posted to the login endpoint, as JSON or form fields.
/// Missing fields are treated as empty so they fail authentication the same
/// way a wrong password does.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: "bearer",
            expires_in: token.expires_in,
        }
    }
}
