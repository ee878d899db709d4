//! Menu service
//!
//! Menus form the navigation / permission tree. Siblings are ordered by
//! `order_num`; a parent id of 0 means top-level and is stored as NULL.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;

use crate::entity::menu::{self, MenuTree, MenuType};
use crate::error::{AppError, AppResult, OptionExt};
use crate::service::tree::TreeIndex;
use crate::service::validate;
use crate::service::{default_true, double_option};

const ENTITY: &str = "menu";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenu {
    #[serde(default)]
    pub parent_id: Option<i32>,
    pub menu_type: MenuType,
    pub menu_name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub route_name: Option<String>,
    #[serde(default)]
    pub route_path: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub route_params: Option<String>,
    #[serde(default = "default_true")]
    pub cache: bool,
    #[serde(default = "default_true")]
    pub show_status: bool,
    #[serde(default = "default_true")]
    pub menu_status: bool,
    #[serde(default)]
    pub is_frame: bool,
    #[serde(default)]
    pub order_num: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i32>>,
    pub menu_type: Option<MenuType>,
    pub menu_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub route_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub route_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub component: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub permission: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub route_params: Option<Option<String>>,
    pub cache: Option<bool>,
    pub show_status: Option<bool>,
    pub menu_status: Option<bool>,
    pub is_frame: Option<bool>,
    pub order_num: Option<i32>,
}

/// 0 is the legacy marker for "no parent"
fn normalize_parent(parent_id: Option<i32>) -> Option<i32> {
    parent_id.filter(|&id| id != 0)
}

fn check_name(name: &str) -> AppResult<()> {
    validate::require("menu_name", name)?;
    validate::max_len("menu_name", name, 50)
}

async fn load_index<C: ConnectionTrait>(conn: &C) -> AppResult<TreeIndex<i32>> {
    let menus = menu::Entity::find()
        .order_by_asc(menu::Column::OrderNum)
        .order_by_asc(menu::Column::Id)
        .all(conn)
        .await?;
    Ok(TreeIndex::new(menus.iter().map(|m| (m.id, m.parent_id))))
}

pub async fn create(db: &DatabaseConnection, req: CreateMenu) -> AppResult<menu::Model> {
    check_name(&req.menu_name)?;

    let menu = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let parent_id = normalize_parent(req.parent_id);
            validate::ensure_reference::<menu::Entity, _, _>(txn, ENTITY, "parent_id", parent_id)
                .await?;

            let now = Utc::now();
            let model = menu::ActiveModel {
                parent_id: Set(parent_id),
                menu_type: Set(req.menu_type),
                menu_name: Set(req.menu_name),
                icon: Set(req.icon),
                route_name: Set(req.route_name),
                route_path: Set(req.route_path),
                component: Set(req.component),
                permission: Set(req.permission),
                route_params: Set(req.route_params),
                cache: Set(req.cache),
                show_status: Set(req.show_status),
                menu_status: Set(req.menu_status),
                is_frame: Set(req.is_frame),
                order_num: Set(req.order_num),
                create_time: Set(now),
                update_time: Set(now),
                ..Default::default()
            };
            Ok(model.insert(txn).await?)
        })
    })
    .await?;

    info!("Created menu {} ({})", menu.menu_name, menu.id);
    Ok(menu)
}

pub async fn get(db: &DatabaseConnection, id: i32) -> AppResult<menu::Model> {
    menu::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_not_found(format!("Menu {}", id))
}

/// Direct children of `parent` (top-level menus for `None` or 0), ordered
pub async fn children(db: &DatabaseConnection, parent: Option<i32>) -> AppResult<Vec<menu::Model>> {
    let query = match normalize_parent(parent) {
        Some(id) => menu::Entity::find().filter(menu::Column::ParentId.eq(id)),
        None => menu::Entity::find().filter(menu::Column::ParentId.is_null()),
    };
    Ok(query
        .order_by_asc(menu::Column::OrderNum)
        .order_by_asc(menu::Column::Id)
        .all(db)
        .await?)
}

/// The subtree under `root` (or every top-level menu) with children attached
/// to any depth
pub async fn list_subtree(db: &DatabaseConnection, root: Option<i32>) -> AppResult<Vec<MenuTree>> {
    let menus = menu::Entity::find()
        .order_by_asc(menu::Column::OrderNum)
        .order_by_asc(menu::Column::Id)
        .all(db)
        .await?;
    let index = TreeIndex::new(menus.iter().map(|m| (m.id, m.parent_id)));

    let roots = match normalize_parent(root) {
        Some(id) if !index.contains(id) => return Err(AppError::NotFound(format!("Menu {}", id))),
        Some(id) => vec![id],
        None => index.children(None).to_vec(),
    };

    let nodes = menus.into_iter().map(|m| (m.id, MenuTree::from(m))).collect();
    Ok(index.assemble(&roots, nodes, |node, children| node.children = children))
}

pub async fn update(db: &DatabaseConnection, id: i32, patch: MenuPatch) -> AppResult<menu::Model> {
    if let Some(name) = &patch.menu_name {
        check_name(name)?;
    }

    let menu = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let current = menu::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_not_found(format!("Menu {}", id))?;

            let parent_id = patch.parent_id.map(normalize_parent);
            if let Some(Some(parent_id)) = parent_id {
                if parent_id == id {
                    return Err(AppError::DirectCycle(format!("Menu {}", id)));
                }
                let index = load_index(txn).await?;
                if !index.contains(parent_id) {
                    return Err(AppError::ReferenceNotFound {
                        entity: ENTITY,
                        field: "parent_id",
                    });
                }
                if index.is_descendant(id, parent_id) {
                    return Err(AppError::IndirectCycle(format!("Menu {}", id)));
                }
            }

            let mut active: menu::ActiveModel = current.into();
            if let Some(parent_id) = parent_id {
                active.parent_id = Set(parent_id);
            }
            if let Some(menu_type) = patch.menu_type {
                active.menu_type = Set(menu_type);
            }
            if let Some(menu_name) = patch.menu_name {
                active.menu_name = Set(menu_name);
            }
            if let Some(icon) = patch.icon {
                active.icon = Set(icon);
            }
            if let Some(route_name) = patch.route_name {
                active.route_name = Set(route_name);
            }
            if let Some(route_path) = patch.route_path {
                active.route_path = Set(route_path);
            }
            if let Some(component) = patch.component {
                active.component = Set(component);
            }
            if let Some(permission) = patch.permission {
                active.permission = Set(permission);
            }
            if let Some(route_params) = patch.route_params {
                active.route_params = Set(route_params);
            }
            if let Some(cache) = patch.cache {
                active.cache = Set(cache);
            }
            if let Some(show_status) = patch.show_status {
                active.show_status = Set(show_status);
            }
            if let Some(menu_status) = patch.menu_status {
                active.menu_status = Set(menu_status);
            }
            if let Some(is_frame) = patch.is_frame {
                active.is_frame = Set(is_frame);
            }
            if let Some(order_num) = patch.order_num {
                active.order_num = Set(order_num);
            }
            active.update_time = Set(Utc::now());

            Ok(active.update(txn).await?)
        })
    })
    .await?;

    info!("Updated menu {} ({})", menu.menu_name, menu.id);
    Ok(menu)
}

/// Delete a menu together with all of its descendants
pub async fn delete(db: &DatabaseConnection, id: i32) -> AppResult<Vec<i32>> {
    let removed = validate::atomically(db, move |txn| {
        Box::pin(async move {
            let index = load_index(txn).await?;
            if !index.contains(id) {
                return Err(AppError::NotFound(format!("Menu {}", id)));
            }

            let doomed = index.subtree_post_order(id);
            for menu_id in &doomed {
                menu::Entity::delete_by_id(*menu_id).exec(txn).await?;
            }
            Ok(doomed)
        })
    })
    .await?;

    info!("Deleted menu {} with {} node(s)", id, removed.len());
    Ok(removed)
}
