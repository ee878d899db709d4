//! Department service
//!
//! Departments form a forest through `parent_id`. Reparenting is checked
//! against the full ancestor chain and deletion removes the whole subtree in
//! one transaction.

use std::collections::HashSet;

use sea_orm::sea_query::NullOrdering;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::entity::department::{self, DeptTree};
use crate::entity::user;
use crate::error::{AppError, AppResult, OptionExt};
use crate::service::tree::TreeIndex;
use crate::service::validate;
use crate::service::{default_true, double_option};

const ENTITY: &str = "department";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDept {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub leader: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Partial update. Nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeptPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub leader: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub remark: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

fn check_contact(
    leader: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
    remark: Option<&str>,
) -> AppResult<()> {
    validate::max_len_opt("leader", leader, 50)?;
    validate::max_len_opt("phone", phone, 20)?;
    validate::max_len_opt("email", email, 100)?;
    validate::max_len_opt("remark", remark, 255)
}

fn check_create(req: &CreateDept) -> AppResult<()> {
    validate::require("name", &req.name)?;
    validate::max_len("name", &req.name, 100)?;
    validate::max_len_opt("code", req.code.as_deref(), 50)?;
    check_contact(
        req.leader.as_deref(),
        req.phone.as_deref(),
        req.email.as_deref(),
        req.remark.as_deref(),
    )
}

fn check_patch(patch: &DeptPatch) -> AppResult<()> {
    if let Some(name) = &patch.name {
        validate::require("name", name)?;
        validate::max_len("name", name, 100)?;
    }
    validate::max_len_opt("code", patch.code.clone().flatten().as_deref(), 50)?;
    check_contact(
        patch.leader.clone().flatten().as_deref(),
        patch.phone.clone().flatten().as_deref(),
        patch.email.clone().flatten().as_deref(),
        patch.remark.clone().flatten().as_deref(),
    )
}

/// Load the `(id, parent_id)` adjacency of all departments, siblings by code
/// with uncoded departments last on every backend
async fn load_index<C: ConnectionTrait>(conn: &C) -> AppResult<TreeIndex<Uuid>> {
    let rows: Vec<(Uuid, Option<Uuid>)> = department::Entity::find()
        .select_only()
        .column(department::Column::Id)
        .column(department::Column::ParentId)
        .order_by_with_nulls(department::Column::Code, Order::Asc, NullOrdering::Last)
        .order_by_asc(department::Column::Name)
        .into_tuple()
        .all(conn)
        .await?;
    Ok(TreeIndex::new(rows))
}

/// Create a department, optionally beneath an existing parent
pub async fn create(db: &DatabaseConnection, req: CreateDept) -> AppResult<department::Model> {
    check_create(&req)?;

    let dept = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let code = validate::non_blank(req.code);

            validate::ensure_reference::<department::Entity, _, _>(
                txn,
                ENTITY,
                "parent_id",
                req.parent_id,
            )
            .await?;
            validate::ensure_unique::<department::Entity, _>(
                txn,
                ENTITY,
                "name",
                department::Column::Name,
                &req.name,
                None,
            )
            .await?;
            if let Some(code) = &code {
                validate::ensure_unique::<department::Entity, _>(
                    txn,
                    ENTITY,
                    "code",
                    department::Column::Code,
                    code,
                    None,
                )
                .await?;
            }

            let model = department::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(req.name),
                code: Set(code),
                leader: Set(req.leader),
                phone: Set(req.phone),
                email: Set(req.email),
                is_active: Set(req.is_active),
                remark: Set(req.remark),
                parent_id: Set(req.parent_id),
            };
            Ok(model.insert(txn).await?)
        })
    })
    .await?;

    info!("Created department {} ({})", dept.name, dept.id);
    Ok(dept)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<department::Model> {
    department::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_not_found(format!("Department {}", id))
}

/// Flat list ordered by code
pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<department::Model>> {
    Ok(department::Entity::find()
        .order_by_with_nulls(department::Column::Code, Order::Asc, NullOrdering::Last)
        .order_by_asc(department::Column::Name)
        .all(db)
        .await?)
}

/// Departments below `root` (or every root department) with children attached
pub async fn list_subtree(db: &DatabaseConnection, root: Option<Uuid>) -> AppResult<Vec<DeptTree>> {
    let depts = list(db).await?;
    let index = TreeIndex::new(depts.iter().map(|d| (d.id, d.parent_id)));

    let roots = match root {
        Some(id) if !index.contains(id) => {
            return Err(AppError::NotFound(format!("Department {}", id)))
        }
        Some(id) => vec![id],
        None => index.children(None).to_vec(),
    };

    let nodes = depts.into_iter().map(|d| (d.id, DeptTree::from(d))).collect();
    Ok(index.assemble(&roots, nodes, |node, children| node.children = children))
}

/// Closed subtree of `root`: the department itself and all its descendants
pub async fn subtree_ids<C: ConnectionTrait>(conn: &C, root: Uuid) -> AppResult<HashSet<Uuid>> {
    let index = load_index(conn).await?;
    if !index.contains(root) {
        return Err(AppError::NotFound(format!("Department {}", root)));
    }
    Ok(index.subtree_ids(root))
}

/// Apply a partial update. A parent change must not close a cycle.
pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    patch: DeptPatch,
) -> AppResult<department::Model> {
    check_patch(&patch)?;

    let dept = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let current = department::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("Department {}", id))?;

            if let Some(name) = &patch.name {
                validate::ensure_unique::<department::Entity, _>(
                    txn,
                    ENTITY,
                    "name",
                    department::Column::Name,
                    name,
                    Some(id),
                )
                .await?;
            }

            let code = patch.code.map(validate::non_blank);
            if let Some(Some(code)) = &code {
                validate::ensure_unique::<department::Entity, _>(
                    txn,
                    ENTITY,
                    "code",
                    department::Column::Code,
                    code,
                    Some(id),
                )
                .await?;
            }

            if let Some(Some(parent_id)) = patch.parent_id {
                if parent_id == id {
                    return Err(AppError::DirectCycle(format!("Department {}", id)));
                }
                let index = load_index(txn).await?;
                if !index.contains(parent_id) {
                    return Err(AppError::ReferenceNotFound {
                        entity: ENTITY,
                        field: "parent_id",
                    });
                }
                if index.is_descendant(id, parent_id) {
                    return Err(AppError::IndirectCycle(format!("Department {}", id)));
                }
            }

            let mut active: department::ActiveModel = current.clone().into();
            if let Some(name) = patch.name {
                active.name = Set(name);
            }
            if let Some(code) = code {
                active.code = Set(code);
            }
            if let Some(leader) = patch.leader {
                active.leader = Set(leader);
            }
            if let Some(phone) = patch.phone {
                active.phone = Set(phone);
            }
            if let Some(email) = patch.email {
                active.email = Set(email);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = Set(is_active);
            }
            if let Some(remark) = patch.remark {
                active.remark = Set(remark);
            }
            if let Some(parent_id) = patch.parent_id {
                active.parent_id = Set(parent_id);
            }

            if !active.is_changed() {
                return Ok(current);
            }
            Ok(active.update(txn).await?)
        })
    })
    .await?;

    info!("Updated department {} ({})", dept.name, dept.id);
    Ok(dept)
}

/// Delete a department and its whole subtree, children before parents.
/// Refused while any user still belongs to a department of the subtree.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<Vec<Uuid>> {
    let removed = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let index = load_index(txn).await?;
            if !index.contains(id) {
                return Err(AppError::NotFound(format!("Department {}", id)));
            }

            let doomed = index.subtree_post_order(id);

            let members = user::Entity::find()
                .filter(user::Column::DeptId.is_in(doomed.clone()))
                .count(txn)
                .await?;
            if members > 0 {
                return Err(AppError::InUse {
                    entity: ENTITY,
                    by: format!("{} user(s)", members),
                });
            }

            for dept_id in &doomed {
                department::Entity::delete_by_id(*dept_id).exec(txn).await?;
            }
            Ok(doomed)
        })
    })
    .await?;

    info!("Deleted department {} with {} node(s)", id, removed.len());
    Ok(removed)
}
