use axum::extract::State;
use axum::Extension;
use uuid::Uuid;

use crate::api::user::UpdateUserRequest;
use crate::api::{PageParams, ValidJson, ValidPath, ValidQuery};
use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{EntityKind, ServiceError};

/// GET /users?skip&limit
pub async fn user_list(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<Vec<User>> {
    let page = params.into_page(&state.config.api)?;
    Ok(ApiResponse::success(state.users.list(page).await?))
}

/// GET /user/:id
pub async fn user_get(State(state): State<AppState>, ValidPath(id): ValidPath<Uuid>) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.get(&id.to_string()).await?))
}

/// PUT /user/:id - change login, password or the active flag
pub async fn user_put(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<UpdateUserRequest>,
) -> ApiResult<User> {
    update(&state, &id.to_string(), body).await
}

/// DELETE /user/:id
pub async fn user_delete(State(state): State<AppState>, ValidPath(id): ValidPath<Uuid>) -> ApiResult<()> {
    delete(&state, &id.to_string()).await
}

/// GET /user - the caller's own account
pub async fn me_get(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.get(&auth.user_id).await?))
}

/// PUT /user - update the caller's own account
pub async fn me_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(body): ValidJson<UpdateUserRequest>,
) -> ApiResult<User> {
    update(&state, &auth.user_id, body).await
}

/// DELETE /user - delete the caller's own account. Tokens already issued stay
/// valid until they expire but resolve to no user.
pub async fn me_delete(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<()> {
    delete(&state, &auth.user_id).await
}

async fn update(state: &AppState, id: &str, body: UpdateUserRequest) -> ApiResult<User> {
    let patch = body.validate()?;
    let user = state.users.update_user(id, patch).await?;
    Ok(ApiResponse::success(user))
}

async fn delete(state: &AppState, id: &str) -> ApiResult<()> {
    if !state.users.delete_user(id).await? {
        return Err(ApiError::from(ServiceError::not_found(EntityKind::User, id)));
    }
    Ok(ApiResponse::no_content())
}
