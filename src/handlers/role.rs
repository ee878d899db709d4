//! Role handlers

use axum::extract::State;
use uuid::Uuid;

use crate::entity::role::Model as Role;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::routes::ApiResponse;
use crate::service::role::{self, CreateRole, RolePatch};
use crate::state::AppState;

/// POST /api/role/create
pub async fn create_role(
    State(state): State<AppState>,
    Json(req): Json<CreateRole>,
) -> AppResult<Json<ApiResponse<Role>>> {
    let role = role::create(state.db(), req).await?;
    Ok(Json(ApiResponse::with_message("Role created", role)))
}

/// GET /api/role/list
pub async fn list_roles(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Role>>>> {
    Ok(Json(ApiResponse::success(role::list(state.db()).await?)))
}

/// PUT /api/role/update/:id
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<RolePatch>,
) -> AppResult<Json<ApiResponse<Role>>> {
    let role = role::update(state.db(), id, patch).await?;
    Ok(Json(ApiResponse::with_message("Role updated", role)))
}

/// DELETE /api/role/delete/:id
pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Role>>> {
    let role = role::delete(state.db(), id).await?;
    Ok(Json(ApiResponse::with_message("Role deleted", role)))
}
