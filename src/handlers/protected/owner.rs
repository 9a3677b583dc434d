use axum::extract::State;
use uuid::Uuid;

use crate::api::owner::{CreateOwnerRequest, UpdateOwnerRequest};
use crate::api::{PageParams, ValidJson, ValidPath, ValidQuery};
use crate::app::AppState;
use crate::database::models::Owner;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{EntityKind, ServiceError};

/// POST /owner - register an owner; the email must be unused
pub async fn owner_post(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateOwnerRequest>,
) -> ApiResult<Owner> {
    let owner = state.owners.create(body.validate()?).await?;
    Ok(ApiResponse::created(owner))
}

/// GET /owner?skip&limit
pub async fn owner_list(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<Vec<Owner>> {
    let page = params.into_page(&state.config.api)?;
    Ok(ApiResponse::success(state.owners.list(page).await?))
}

/// GET /owner/:id
pub async fn owner_get(State(state): State<AppState>, ValidPath(id): ValidPath<Uuid>) -> ApiResult<Owner> {
    Ok(ApiResponse::success(state.owners.get(&id.to_string()).await?))
}

/// PUT /owner/:id - partial update, absent fields are kept
pub async fn owner_put(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<UpdateOwnerRequest>,
) -> ApiResult<Owner> {
    let patch = body.validate()?;
    let owner = state.owners.update(&id.to_string(), patch).await?;
    Ok(ApiResponse::success(owner))
}

/// DELETE /owner/:id - removes the owner and all of its assets
pub async fn owner_delete(State(state): State<AppState>, ValidPath(id): ValidPath<Uuid>) -> ApiResult<()> {
    let id = id.to_string();
    if !state.owners.delete(&id).await? {
        return Err(ApiError::from(ServiceError::not_found(EntityKind::Owner, id)));
    }
    Ok(ApiResponse::no_content())
}
