use axum::{
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub mod health;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_message("success", data)
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Department routes
        .route("/dept/create", post(handlers::dept::create_dept))
        .route("/dept/list", get(handlers::dept::list_depts))
        .route("/dept/tree", get(handlers::dept::dept_tree))
        .route("/dept/:id", get(handlers::dept::get_dept))
        .route("/dept/update/:id", put(handlers::dept::update_dept))
        .route("/dept/delete/:id", delete(handlers::dept::delete_dept))
        // Post routes
        .route("/post/create", post(handlers::post::create_post))
        .route("/post/list", get(handlers::post::list_posts))
        .route("/post/update/:id", put(handlers::post::update_post))
        .route("/post/delete/:id", delete(handlers::post::delete_post))
        // Role routes
        .route("/role/create", post(handlers::role::create_role))
        .route("/role/list", get(handlers::role::list_roles))
        .route("/role/update/:id", put(handlers::role::update_role))
        .route("/role/delete/:id", delete(handlers::role::delete_role))
        // User routes
        .route("/user/create", post(handlers::user::create_user))
        .route("/user/list", get(handlers::user::list_users))
        .route("/user/:id", get(handlers::user::get_user))
        .route("/user/update/:id", put(handlers::user::update_user))
        .route("/user/password/:id", put(handlers::user::set_password))
        .route("/user/delete/:id", delete(handlers::user::delete_user))
        // Menu routes
        .route("/menu/create", post(handlers::menu::create_menu))
        .route("/menu/list", get(handlers::menu::list_menus))
        .route("/menu/getRouter", get(handlers::menu::get_router))
        .route("/menu/children", get(handlers::menu::menu_children))
        .route("/menu/update/:id", put(handlers::menu::update_menu))
        .route("/menu/delete/:id", delete(handlers::menu::delete_menu));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<Option<()>>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse {
            code: StatusCode::NOT_FOUND.as_u16(),
            message: "Not Found".to_string(),
            data: None,
        }),
    )
}
