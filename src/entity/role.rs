//! Role entity
//!
//! Table: sys_role

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sys_role")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(StringLen::N(100))", unique)]
    pub name: String,

    /// Permission key, e.g. "admin" (unique)
    #[sea_orm(column_type = "String(StringLen::N(100))", unique)]
    pub permission_key: String,

    pub is_active: bool,

    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub remark: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
