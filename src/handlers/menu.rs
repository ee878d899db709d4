//! Menu handlers

use axum::extract::State;
use serde::Deserialize;

use crate::entity::menu::{MenuTree, Model as Menu};
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::routes::ApiResponse;
use crate::service::menu::{self, CreateMenu, MenuPatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub menu_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ChildrenQuery {
    pub parent_id: Option<i32>,
}

/// POST /api/menu/create
pub async fn create_menu(
    State(state): State<AppState>,
    Json(req): Json<CreateMenu>,
) -> AppResult<Json<ApiResponse<Menu>>> {
    let menu = menu::create(state.db(), req).await?;
    Ok(Json(ApiResponse::with_message("Menu created", menu)))
}

/// GET /api/menu/list?menu_id=
pub async fn list_menus(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> AppResult<Json<ApiResponse<Vec<MenuTree>>>> {
    let tree = menu::list_subtree(state.db(), query.menu_id).await?;
    Ok(Json(ApiResponse::success(tree)))
}

/// GET /api/menu/getRouter?menu_id=
///
/// Same tree as `list`, consumed by the front end to build its routes.
pub async fn get_router(
    state: State<AppState>,
    query: Query<TreeQuery>,
) -> AppResult<Json<ApiResponse<Vec<MenuTree>>>> {
    list_menus(state, query).await
}

/// GET /api/menu/children?parent_id=
pub async fn menu_children(
    State(state): State<AppState>,
    Query(query): Query<ChildrenQuery>,
) -> AppResult<Json<ApiResponse<Vec<Menu>>>> {
    let menus = menu::children(state.db(), query.parent_id).await?;
    Ok(Json(ApiResponse::success(menus)))
}

/// PUT /api/menu/update/:id
pub async fn update_menu(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<MenuPatch>,
) -> AppResult<Json<ApiResponse<Menu>>> {
    let menu = menu::update(state.db(), id, patch).await?;
    Ok(Json(ApiResponse::with_message("Menu updated", menu)))
}

/// DELETE /api/menu/delete/:id
pub async fn delete_menu(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<i32>>>> {
    let removed = menu::delete(state.db(), id).await?;
    Ok(Json(ApiResponse::with_message("Menu deleted", removed)))
}
