//! Department handlers

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::department::{DeptTree, Model as Department};
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::routes::ApiResponse;
use crate::service::dept::{self, CreateDept, DeptPatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub dept_id: Option<Uuid>,
}

/// POST /api/dept/create
pub async fn create_dept(
    State(state): State<AppState>,
    Json(req): Json<CreateDept>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let dept = dept::create(state.db(), req).await?;
    Ok(Json(ApiResponse::with_message("Department created", dept)))
}

/// GET /api/dept/list
pub async fn list_depts(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Department>>>> {
    let depts = dept::list(state.db()).await?;
    Ok(Json(ApiResponse::success(depts)))
}

/// GET /api/dept/tree?dept_id=
///
/// Without `dept_id` every root department is returned with its subtree.
pub async fn dept_tree(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> AppResult<Json<ApiResponse<Vec<DeptTree>>>> {
    let tree = dept::list_subtree(state.db(), query.dept_id).await?;
    Ok(Json(ApiResponse::success(tree)))
}

/// GET /api/dept/:id
pub async fn get_dept(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let dept = dept::get(state.db(), id).await?;
    Ok(Json(ApiResponse::success(dept)))
}

/// PUT /api/dept/update/:id
pub async fn update_dept(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<DeptPatch>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let dept = dept::update(state.db(), id, patch).await?;
    Ok(Json(ApiResponse::with_message("Department updated", dept)))
}

/// DELETE /api/dept/delete/:id
///
/// Responds with the ids removed, descendants first.
pub async fn delete_dept(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Uuid>>>> {
    let removed = dept::delete(state.db(), id).await?;
    Ok(Json(ApiResponse::with_message("Department deleted", removed)))
}
