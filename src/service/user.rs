//! User aggregation service
//!
//! Users carry optional references to a department, role and post. Reads
//! return `UserResponse` views with `{id, name}` summaries of those references;
//! filtering by department includes the department's whole subtree.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::entity::user::{self, Gender, RefInfo, UserResponse};
use crate::entity::{department, post, role};
use crate::error::{AppError, AppResult, OptionExt};
use crate::service::{dept, validate};
use crate::service::double_option;

const ENTITY: &str = "user";

/// A user ready for insertion. The credential arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub hashed_password: String,
    pub gender: Gender,
    pub is_active: bool,
    pub is_superuser: bool,
    pub nickname: Option<String>,
    pub remark: Option<String>,
    pub dept_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
}

/// Partial update. Credentials are not part of it; see `set_password`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub nickname: Option<Option<String>>,
    pub gender: Option<Gender>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub remark: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub dept_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub role_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub post_id: Option<Option<Uuid>>,
}

/// Plain-text password rules, checked before hashing
pub fn check_password(password: &str) -> AppResult<()> {
    validate::require("password", password)?;
    validate::len_between("password", password, 6, 128)
}

fn check_identity(username: Option<&str>, email: Option<&str>, phone: Option<&str>) -> AppResult<()> {
    if let Some(username) = username {
        validate::require("username", username)?;
        validate::len_between("username", username, 1, 50)?;
    }
    if let Some(email) = email {
        validate::require("email", email)?;
        validate::max_len("email", email, 100)?;
    }
    if let Some(phone) = phone {
        validate::require("phone", phone)?;
        validate::len_between("phone", phone, 11, 20)?;
    }
    Ok(())
}

fn check_profile(nickname: Option<&str>, remark: Option<&str>) -> AppResult<()> {
    validate::max_len_opt("nickname", nickname, 50)?;
    validate::max_len_opt("remark", remark, 255)
}

async fn ensure_identity_unique<C: ConnectionTrait>(
    conn: &C,
    username: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let checks = [
        ("username", user::Column::Username, username),
        ("email", user::Column::Email, email),
        ("phone", user::Column::Phone, phone),
    ];
    for (field, column, value) in checks {
        if let Some(value) = value {
            validate::ensure_unique::<user::Entity, _>(conn, ENTITY, field, column, value, exclude)
                .await?;
        }
    }
    Ok(())
}

async fn ensure_links<C: ConnectionTrait>(
    conn: &C,
    dept_id: Option<Uuid>,
    role_id: Option<Uuid>,
    post_id: Option<Uuid>,
) -> AppResult<()> {
    validate::ensure_reference::<department::Entity, _, _>(conn, "department", "dept_id", dept_id)
        .await?;
    validate::ensure_reference::<role::Entity, _, _>(conn, "role", "role_id", role_id).await?;
    validate::ensure_reference::<post::Entity, _, _>(conn, "post", "post_id", post_id).await
}

pub async fn create_user(db: &DatabaseConnection, new: NewUser) -> AppResult<UserResponse> {
    check_identity(
        Some(new.username.as_str()),
        Some(new.email.as_str()),
        Some(new.phone.as_str()),
    )?;
    check_profile(new.nickname.as_deref(), new.remark.as_deref())?;

    let created = validate::atomically(db, move |txn| {
        Box::pin(async move {
            ensure_identity_unique(
                txn,
                Some(new.username.as_str()),
                Some(new.email.as_str()),
                Some(new.phone.as_str()),
                None,
            )
            .await?;
            ensure_links(txn, new.dept_id, new.role_id, new.post_id).await?;

            let model = user::ActiveModel {
                id: Set(Uuid::new_v4()),
                username: Set(new.username),
                email: Set(new.email),
                phone: Set(new.phone),
                hashed_password: Set(new.hashed_password),
                gender: Set(new.gender),
                is_active: Set(new.is_active),
                is_superuser: Set(new.is_superuser),
                nickname: Set(new.nickname),
                remark: Set(new.remark),
                dept_id: Set(new.dept_id),
                role_id: Set(new.role_id),
                post_id: Set(new.post_id),
            };
            Ok(model.insert(txn).await?)
        })
    })
    .await?;

    info!("Created user {} ({})", created.username, created.id);
    let mut views = denormalize(db, vec![created]).await?;
    views.pop().ok_or_else(|| AppError::Internal("created user vanished".to_string()))
}

/// All users ordered by username. With `dept_filter`, only users whose
/// department lies in that department's subtree (itself included).
pub async fn list_users(
    db: &DatabaseConnection,
    dept_filter: Option<Uuid>,
) -> AppResult<Vec<UserResponse>> {
    let mut query = user::Entity::find().order_by_asc(user::Column::Username);

    if let Some(dept_id) = dept_filter {
        let scope = dept::subtree_ids(db, dept_id).await?;
        query = query.filter(user::Column::DeptId.is_in(scope));
    }

    let users = query.all(db).await?;
    denormalize(db, users).await
}

pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> AppResult<UserResponse> {
    let found = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_not_found(format!("User {}", id))?;
    let mut views = denormalize(db, vec![found]).await?;
    views
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
}

pub async fn update_user(
    db: &DatabaseConnection,
    id: Uuid,
    patch: UserPatch,
) -> AppResult<UserResponse> {
    check_identity(
        patch.username.as_deref(),
        patch.email.as_deref(),
        patch.phone.as_deref(),
    )?;
    check_profile(
        patch.nickname.clone().flatten().as_deref(),
        patch.remark.clone().flatten().as_deref(),
    )?;

    let updated = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let current = user::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("User {}", id))?;

            ensure_identity_unique(
                txn,
                patch.username.as_deref(),
                patch.email.as_deref(),
                patch.phone.as_deref(),
                Some(id),
            )
            .await?;
            ensure_links(
                txn,
                patch.dept_id.flatten(),
                patch.role_id.flatten(),
                patch.post_id.flatten(),
            )
            .await?;

            let mut active: user::ActiveModel = current.clone().into();
            if let Some(username) = patch.username {
                active.username = Set(username);
            }
            if let Some(email) = patch.email {
                active.email = Set(email);
            }
            if let Some(phone) = patch.phone {
                active.phone = Set(phone);
            }
            if let Some(nickname) = patch.nickname {
                active.nickname = Set(nickname);
            }
            if let Some(gender) = patch.gender {
                active.gender = Set(gender);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = Set(is_active);
            }
            if let Some(remark) = patch.remark {
                active.remark = Set(remark);
            }
            if let Some(dept_id) = patch.dept_id {
                active.dept_id = Set(dept_id);
            }
            if let Some(role_id) = patch.role_id {
                active.role_id = Set(role_id);
            }
            if let Some(post_id) = patch.post_id {
                active.post_id = Set(post_id);
            }

            if !active.is_changed() {
                return Ok(current);
            }
            Ok(active.update(txn).await?)
        })
    })
    .await?;

    info!("Updated user {} ({})", updated.username, updated.id);
    let mut views = denormalize(db, vec![updated]).await?;
    views
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
}

/// Replace the stored credential with an already hashed one
pub async fn set_password(db: &DatabaseConnection, id: Uuid, hashed_password: String) -> AppResult<()> {
    validate::atomically(db, move |txn| {
        Box::pin(async move {
            let current = user::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("User {}", id))?;

            let mut active: user::ActiveModel = current.into();
            active.hashed_password = Set(hashed_password);
            active.update(txn).await?;
            Ok(())
        })
    })
    .await?;

    info!("Password changed for user {}", id);
    Ok(())
}

/// Delete a user. Superusers are protected.
pub async fn delete_user(db: &DatabaseConnection, id: Uuid) -> AppResult<UserResponse> {
    let deleted = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let found = user::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("User {}", id))?;

            if found.is_superuser {
                return Err(AppError::Forbidden(format!(
                    "superuser {} cannot be deleted",
                    found.username
                )));
            }

            // Summaries are resolved before the row goes away
            let mut views = denormalize(txn, vec![found]).await?;
            let view = views
                .pop()
                .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

            user::Entity::delete_by_id(id).exec(txn).await?;
            Ok(view)
        })
    })
    .await?;

    info!("Deleted user {} ({})", deleted.username, deleted.id);
    Ok(deleted)
}

/// `{id -> name}` for the given ids of one entity kind
async fn names<E, C>(
    conn: &C,
    id_column: E::Column,
    name_column: E::Column,
    ids: HashSet<Uuid>,
) -> AppResult<HashMap<Uuid, String>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, String)> = E::find()
        .select_only()
        .column(id_column)
        .column(name_column)
        .filter(id_column.is_in(ids))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Attach department / role / post summaries, one query per kind
async fn denormalize<C: ConnectionTrait>(
    conn: &C,
    users: Vec<user::Model>,
) -> AppResult<Vec<UserResponse>> {
    let dept_ids = users.iter().filter_map(|u| u.dept_id).collect();
    let role_ids = users.iter().filter_map(|u| u.role_id).collect();
    let post_ids = users.iter().filter_map(|u| u.post_id).collect();

    let depts = names::<department::Entity, _>(
        conn,
        department::Column::Id,
        department::Column::Name,
        dept_ids,
    )
    .await?;
    let roles =
        names::<role::Entity, _>(conn, role::Column::Id, role::Column::Name, role_ids).await?;
    let posts =
        names::<post::Entity, _>(conn, post::Column::Id, post::Column::Name, post_ids).await?;

    let summary = |map: &HashMap<Uuid, String>, id: Option<Uuid>| {
        id.and_then(|id| map.get(&id).map(|name| RefInfo { id, name: name.clone() }))
    };

    Ok(users
        .into_iter()
        .map(|u| {
            let dept_info = summary(&depts, u.dept_id);
            let role_info = summary(&roles, u.role_id);
            let post_info = summary(&posts, u.post_id);
            UserResponse {
                dept_info,
                role_info,
                post_info,
                ..UserResponse::from(u)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_password() {
        assert!(check_password("secret1").is_ok());
        assert!(check_password("short").is_err());
        assert!(check_password("      ").is_err());
    }

    #[test]
    fn test_check_identity() {
        assert!(check_identity(Some("alice"), Some("a@example.com"), Some("13800000000")).is_ok());
        assert!(check_identity(None, None, Some("12345")).is_err());
        assert!(check_identity(Some(""), None, None).is_err());
    }

    #[test]
    fn test_patch_ignores_password() {
        let patch: UserPatch =
            serde_json::from_str(r#"{"nickname": "Al", "password": "hunter22", "dept_id": null}"#)
                .unwrap();
        assert_eq!(patch.nickname, Some(Some("Al".to_string())));
        assert_eq!(patch.dept_id, Some(None));
        assert!(patch.username.is_none());
    }
}
