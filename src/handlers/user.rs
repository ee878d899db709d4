//! User handlers
//!
//! Plain-text passwords stop here: they are validated and bcrypt-hashed
//! before anything reaches the user service.

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::user::{Gender, UserResponse};
use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::routes::ApiResponse;
use crate::service::default_true;
use crate::service::user::{self, NewUser, UserPatch};
use crate::state::AppState;

/// Create user request
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub dept_id: Option<Uuid>,
    #[serde(default)]
    pub role_id: Option<Uuid>,
    #[serde(default)]
    pub post_id: Option<Uuid>,
}

/// Set password request
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

/// Query parameters for listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub dept_id: Option<Uuid>,
}

/// Validate and hash a plain-text password off the async runtime
async fn hash_password(state: &AppState, password: String) -> AppResult<String> {
    user::check_password(&password)?;

    let cost = state.bcrypt_cost();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AppError::Internal("Failed to hash password".to_string())
        })
}

/// POST /api/user/create
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let hashed_password = hash_password(&state, req.password).await?;

    let new = NewUser {
        username: req.username,
        email: req.email,
        phone: req.phone,
        hashed_password,
        gender: req.gender,
        is_active: req.is_active,
        is_superuser: false,
        nickname: req.nickname,
        remark: req.remark,
        dept_id: req.dept_id,
        role_id: req.role_id,
        post_id: req.post_id,
    };

    let created = user::create_user(state.db(), new).await?;
    Ok(Json(ApiResponse::with_message("User created", created)))
}

/// GET /api/user/list?dept_id=
///
/// With `dept_id`, users of that department and all of its descendants.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    let users = user::list_users(state.db(), query.dept_id).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// GET /api/user/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    Ok(Json(ApiResponse::success(user::get_user(state.db(), id).await?)))
}

/// PUT /api/user/update/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let updated = user::update_user(state.db(), id, patch).await?;
    Ok(Json(ApiResponse::with_message("User updated", updated)))
}

/// PUT /api/user/password/:id
pub async fn set_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetPasswordRequest>,
) -> AppResult<Json<ApiResponse<Option<()>>>> {
    let hashed_password = hash_password(&state, req.password).await?;
    user::set_password(state.db(), id, hashed_password).await?;
    Ok(Json(ApiResponse::with_message("Password updated", None)))
}

/// DELETE /api/user/delete/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let removed = user::delete_user(state.db(), id).await?;
    Ok(Json(ApiResponse::with_message("User deleted", removed)))
}
