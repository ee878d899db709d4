//! Post (job position) service

use sea_orm::sea_query::NullOrdering;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::entity::{post, user};
use crate::error::{AppError, AppResult, OptionExt};
use crate::service::validate;
use crate::service::{default_true, double_option};

const ENTITY: &str = "post";

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub code: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub remark: Option<Option<String>>,
}

fn check_fields(name: Option<&str>, code: Option<&str>, remark: Option<&str>) -> AppResult<()> {
    if let Some(name) = name {
        validate::require("name", name)?;
        validate::max_len("name", name, 100)?;
    }
    validate::max_len_opt("code", code, 50)?;
    validate::max_len_opt("remark", remark, 255)
}

pub async fn create(db: &DatabaseConnection, req: CreatePost) -> AppResult<post::Model> {
    check_fields(Some(req.name.as_str()), req.code.as_deref(), req.remark.as_deref())?;

    let post = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let code = validate::non_blank(req.code);
            validate::ensure_unique::<post::Entity, _>(
                txn,
                ENTITY,
                "name",
                post::Column::Name,
                &req.name,
                None,
            )
            .await?;
            if let Some(code) = &code {
                validate::ensure_unique::<post::Entity, _>(
                    txn,
                    ENTITY,
                    "code",
                    post::Column::Code,
                    code,
                    None,
                )
                .await?;
            }

            let model = post::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(req.name),
                code: Set(code),
                is_active: Set(req.is_active),
                remark: Set(req.remark),
            };
            Ok(model.insert(txn).await?)
        })
    })
    .await?;

    info!("Created post {} ({})", post.name, post.id);
    Ok(post)
}

/// All posts ordered by code, uncoded ones last
pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<post::Model>> {
    Ok(post::Entity::find()
        .order_by_with_nulls(post::Column::Code, Order::Asc, NullOrdering::Last)
        .order_by_asc(post::Column::Name)
        .all(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<post::Model> {
    post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_not_found(format!("Post {}", id))
}

pub async fn update(db: &DatabaseConnection, id: Uuid, patch: PostPatch) -> AppResult<post::Model> {
    check_fields(
        patch.name.as_deref(),
        patch.code.clone().flatten().as_deref(),
        patch.remark.clone().flatten().as_deref(),
    )?;

    let post = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let current = post::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("Post {}", id))?;

            if let Some(name) = &patch.name {
                validate::ensure_unique::<post::Entity, _>(
                    txn,
                    ENTITY,
                    "name",
                    post::Column::Name,
                    name,
                    Some(id),
                )
                .await?;
            }
            let code = patch.code.map(validate::non_blank);
            if let Some(Some(code)) = &code {
                validate::ensure_unique::<post::Entity, _>(
                    txn,
                    ENTITY,
                    "code",
                    post::Column::Code,
                    code,
                    Some(id),
                )
                .await?;
            }

            let mut active: post::ActiveModel = current.clone().into();
            if let Some(name) = patch.name {
                active.name = Set(name);
            }
            if let Some(code) = code {
                active.code = Set(code);
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

    info!("Updated post {} ({})", post.name, post.id);
    Ok(post)
}

/// Delete a post. Refused while users still hold it.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<post::Model> {
    let post = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let post = post::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("Post {}", id))?;

            let holders = user::Entity::find()
                .filter(user::Column::PostId.eq(id))
                .count(txn)
                .await?;
            if holders > 0 {
                return Err(AppError::InUse {
                    entity: ENTITY,
                    by: format!("{} user(s)", holders),
                });
            }

            post::Entity::delete_by_id(id).exec(txn).await?;
            Ok(post)
        })
    })
    .await?;

    info!("Deleted post {} ({})", post.name, post.id);
    Ok(post)
}
