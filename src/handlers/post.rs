//! Post handlers

use axum::extract::State;
use uuid::Uuid;

use crate::entity::post::Model as Post;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::routes::ApiResponse;
use crate::service::post::{self, CreatePost, PostPatch};
use crate::state::AppState;

/// POST /api/post/create
pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePost>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let post = post::create(state.db(), req).await?;
    Ok(Json(ApiResponse::with_message("Post created", post)))
}

/// GET /api/post/list
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Post>>>> {
    Ok(Json(ApiResponse::success(post::list(state.db()).await?)))
}

/// PUT /api/post/update/:id
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<PostPatch>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let post = post::update(state.db(), id, patch).await?;
    Ok(Json(ApiResponse::with_message("Post updated", post)))
}

/// DELETE /api/post/delete/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let post = post::delete(state.db(), id).await?;
    Ok(Json(ApiResponse::with_message("Post deleted", post)))
}
