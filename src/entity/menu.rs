//! Menu entity - navigation / permission tree
//!
//! Table: sys_menu

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu node type
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MenuType {
    #[sea_orm(string_value = "menu")]
    Menu,
    #[sea_orm(string_value = "button")]
    Button,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sys_menu")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Parent menu (None for a top-level menu)
    #[sea_orm(indexed, nullable)]
    pub parent_id: Option<i32>,

    pub menu_type: MenuType,

    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub menu_name: String,

    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub icon: Option<String>,

    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub route_name: Option<String>,

    #[sea_orm(column_type = "String(StringLen::N(200))", nullable)]
    pub route_path: Option<String>,

    /// Frontend component path
    #[sea_orm(column_type = "String(StringLen::N(200))", nullable)]
    pub component: Option<String>,

    /// Permission string, e.g. "system:user:list"
    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub permission: Option<String>,

    /// Route parameters (JSON text)
    #[sea_orm(column_type = "Text", nullable)]
    pub route_params: Option<String>,

    pub cache: bool,
    pub show_status: bool,
    pub menu_status: bool,
    pub is_frame: bool,

    /// Sibling order
    pub order_num: i32,

    pub create_time: DateTimeUtc,
    pub update_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Menu tree node (API response)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MenuTree {
    #[serde(flatten)]
    pub menu: Model,
    pub children: Vec<MenuTree>,
}

impl From<Model> for MenuTree {
    fn from(menu: Model) -> Self {
        Self {
            menu,
            children: Vec::new(),
        }
    }
}
