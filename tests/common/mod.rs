//! Shared fixtures: an in-memory SQLite database with every table created.
#![allow(dead_code)]

use orgadmin::entity::{department, menu, post, role, user::{Gender, UserResponse}};
use orgadmin::service::user::NewUser;
use orgadmin::service::{dept as dept_svc, menu as menu_svc, post as post_svc, role as role_svc, user as user_svc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::json;
use uuid::Uuid;

/// Fresh database; one pooled connection so every query sees the same memory store
pub async fn setup() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    orgadmin::db::auto_migrate(&db).await.unwrap();
    db
}

pub async fn dept(db: &DatabaseConnection, name: &str, parent: Option<Uuid>) -> department::Model {
    let req = serde_json::from_value(json!({ "name": name, "parent_id": parent })).unwrap();
    dept_svc::create(db, req).await.unwrap()
}

pub async fn menu(db: &DatabaseConnection, name: &str, parent: Option<i32>) -> menu::Model {
    let req = serde_json::from_value(json!({
        "menu_type": "menu",
        "menu_name": name,
        "parent_id": parent,
    }))
    .unwrap();
    menu_svc::create(db, req).await.unwrap()
}

pub async fn post(db: &DatabaseConnection, name: &str) -> post::Model {
    let req = serde_json::from_value(json!({ "name": name })).unwrap();
    post_svc::create(db, req).await.unwrap()
}

pub async fn role(db: &DatabaseConnection, name: &str, key: &str) -> role::Model {
    let req = serde_json::from_value(json!({ "name": name, "permission_key": key })).unwrap();
    role_svc::create(db, req).await.unwrap()
}

/// A regular user with unique contact details derived from `username`
pub fn new_user(username: &str, seq: u32) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        phone: format!("1380000{:04}", seq),
        hashed_password: "$2b$04$placeholderhashplaceholderhashplaceholderhashpl".to_string(),
        gender: Gender::default(),
        is_active: true,
        is_superuser: false,
        nickname: None,
        remark: None,
        dept_id: None,
        role_id: None,
        post_id: None,
    }
}

pub async fn user_in(
    db: &DatabaseConnection,
    username: &str,
    seq: u32,
    dept_id: Option<Uuid>,
) -> UserResponse {
    let new = NewUser {
        dept_id,
        ..new_user(username, seq)
    };
    user_svc::create_user(db, new).await.unwrap()
}
