use axum::extract::State;
use uuid::Uuid;

use crate::api::asset::{CreateAssetRequest, UpdateAssetRequest};
use crate::api::{PageParams, ValidJson, ValidPath, ValidQuery};
use crate::app::AppState;
use crate::database::models::{Asset, AssetDetail};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{EntityKind, ServiceError};

/// POST /asset - the referenced owner must exist (404 naming the owner otherwise)
pub async fn asset_post(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateAssetRequest>,
) -> ApiResult<Asset> {
    let asset = state.assets.create(body.validate()?).await?;
    Ok(ApiResponse::created(asset))
}

/// GET /asset?skip&limit
pub async fn asset_list(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<Vec<Asset>> {
    let page = params.into_page(&state.config.api)?;
    Ok(ApiResponse::success(state.assets.list(page).await?))
}

/// GET /asset/:id - includes the owning owner as `owner_ref`
pub async fn asset_get(State(state): State<AppState>, ValidPath(id): ValidPath<Uuid>) -> ApiResult<AssetDetail> {
    Ok(ApiResponse::success(state.assets.get_detailed(&id.to_string()).await?))
}

pub async fn asset_put(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<UpdateAssetRequest>,
) -> ApiResult<Asset> {
    let patch = body.validate()?;
    let asset = state.assets.update(&id.to_string(), patch).await?;
    Ok(ApiResponse::success(asset))
}

pub async fn asset_delete(State(state): State<AppState>, ValidPath(id): ValidPath<Uuid>) -> ApiResult<()> {
    let id = id.to_string();
    if !state.assets.delete(&id).await? {
        return Err(ApiError::from(ServiceError::not_found(EntityKind::Asset, id)));
    }
    Ok(ApiResponse::no_content())
}
