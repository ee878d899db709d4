//! Role service

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::entity::{role, user};
use crate::error::{AppError, AppResult, OptionExt};
use crate::service::validate;
use crate::service::{default_true, double_option};

const ENTITY: &str = "role";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub permission_key: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolePatch {
    pub name: Option<String>,
    pub permission_key: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub remark: Option<Option<String>>,
}

fn check_fields(
    name: Option<&str>,
    permission_key: Option<&str>,
    remark: Option<&str>,
) -> AppResult<()> {
    if let Some(name) = name {
        validate::require("name", name)?;
        validate::max_len("name", name, 100)?;
    }
    if let Some(key) = permission_key {
        validate::require("permission_key", key)?;
        validate::len_between("permission_key", key, 3, 100)?;
    }
    validate::max_len_opt("remark", remark, 255)
}

pub async fn create(db: &DatabaseConnection, req: CreateRole) -> AppResult<role::Model> {
    check_fields(
        Some(req.name.as_str()),
        Some(req.permission_key.as_str()),
        req.remark.as_deref(),
    )?;

    let role = validate::atomically(db, move |txn| {
        Box::pin(async move {
            validate::ensure_unique::<role::Entity, _>(
                txn,
                ENTITY,
                "name",
                role::Column::Name,
                &req.name,
                None,
            )
            .await?;
            validate::ensure_unique::<role::Entity, _>(
                txn,
                ENTITY,
                "permission_key",
                role::Column::PermissionKey,
                &req.permission_key,
                None,
            )
            .await?;

            let model = role::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(req.name),
                permission_key: Set(req.permission_key),
                is_active: Set(req.is_active),
                remark: Set(req.remark),
            };
            Ok(model.insert(txn).await?)
        })
    })
    .await?;

    info!("Created role {} ({})", role.name, role.id);
    Ok(role)
}

/// All roles ordered by name
pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<role::Model>> {
    Ok(role::Entity::find()
        .order_by_asc(role::Column::Name)
        .all(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<role::Model> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_not_found(format!("Role {}", id))
}

pub async fn update(db: &DatabaseConnection, id: Uuid, patch: RolePatch) -> AppResult<role::Model> {
    check_fields(
        patch.name.as_deref(),
        patch.permission_key.as_deref(),
        patch.remark.clone().flatten().as_deref(),
    )?;

    let role = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let current = role::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("Role {}", id))?;

            if let Some(name) = &patch.name {
                validate::ensure_unique::<role::Entity, _>(
                    txn,
                    ENTITY,
                    "name",
                    role::Column::Name,
                    name,
                    Some(id),
                )
                .await?;
            }
            if let Some(key) = &patch.permission_key {
                validate::ensure_unique::<role::Entity, _>(
                    txn,
                    ENTITY,
                    "permission_key",
                    role::Column::PermissionKey,
                    key,
                    Some(id),
                )
                .await?;
            }

            let mut active: role::ActiveModel = current.clone().into();
            if let Some(name) = patch.name {
                active.name = Set(name);
            }
            if let Some(key) = patch.permission_key {
                active.permission_key = Set(key);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = Set(is_active);
            }
            if let Some(remark) = patch.remark {
                active.remark = Set(remark);
            }

            if !active.is_changed() {
                return Ok(current);
            }
            Ok(active.update(txn).await?)
        })
    })
    .await?;

    info!("Updated role {} ({})", role.name, role.id);
    Ok(role)
}

/// Delete a role. Refused while users are still assigned to it.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<role::Model> {
    let role = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let role = role::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("Role {}", id))?;

            let holders = user::Entity::find()
                .filter(user::Column::RoleId.eq(id))
                .count(txn)
                .await?;
            if holders > 0 {
                return Err(AppError::InUse {
                    entity: ENTITY,
                    by: format!("{} user(s)", holders),
                });
            }

            role::Entity::delete_by_id(id).exec(txn).await?;
            Ok(role)
        })
    })
    .await?;

    info!("Deleted role {} ({})", role.name, role.id);
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_key_length() {
        assert!(check_fields(Some("Admin"), Some("ad"), None).is_err());
        assert!(check_fields(Some("Admin"), Some("admin"), None).is_ok());
        assert!(matches!(
            check_fields(Some(" "), Some("admin"), None),
            Err(AppError::Validation(_))
        ));
    }
}
