use axum::extract::State;
use tracing::{info, warn};

use crate::api::auth::{LoginRequest, TokenResponse};
use crate::api::JsonOrForm;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /auth - exchange login and password for a bearer token
///
/// Accepts `{"login": "...", "password": "..."}` as JSON, or the same fields
/// form-encoded. Unknown login, wrong password and a deactivated account all
/// produce the same 401.
pub async fn login_post(
    State(state): State<AppState>,
    JsonOrForm(credentials): JsonOrForm<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let user = state
        .users
        .authenticate(credentials.login.trim(), &credentials.password)
        .await?
        .ok_or_else(|| {
            warn!("Failed login attempt for {:?}", credentials.login);
            ApiError::unauthorized("Incorrect login or password")
        })?;

    let token = state.tokens.issue(&user)?;
    info!("Issued token for {}", user.login);

    Ok(ApiResponse::success(token.into()))
}
