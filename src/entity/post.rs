//! Post entity - job positions
//!
//! Table: sys_post

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sys_post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(StringLen::N(100))", unique)]
    pub name: String,

    #[sea_orm(column_type = "String(StringLen::N(50))", unique, nullable)]
    pub code: Option<String>,

    pub is_active: bool,

    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub remark: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
