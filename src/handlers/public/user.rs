use axum::extract::State;

use crate::api::user::CreateUserRequest;
use crate::api::ValidJson;
use crate::app::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /user - open signup
pub async fn signup_post(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateUserRequest>,
) -> ApiResult<User> {
    let new_user = body.validate()?;
    let user = state.users.create_user(new_user).await?;
    Ok(ApiResponse::created(user))
}
