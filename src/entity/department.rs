//! Department entity - self-referencing department tree
//!
//! Table: sys_dept

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sys_dept")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Department name (unique)
    #[sea_orm(column_type = "String(StringLen::N(100))", unique)]
    pub name: String,

    /// Department code (unique when present)
    #[sea_orm(column_type = "String(StringLen::N(50))", unique, nullable)]
    pub code: Option<String>,

    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub leader: Option<String>,

    #[sea_orm(column_type = "String(StringLen::N(20))", nullable)]
    pub phone: Option<String>,

    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub email: Option<String>,

    pub is_active: bool,

    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub remark: Option<String>,

    /// Parent department (None for a root)
    #[sea_orm(indexed, nullable)]
    pub parent_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// The parent link is an adjacency column; tree walks go through service::tree

impl ActiveModelBehavior for ActiveModel {}

/// Department tree node (API response)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeptTree {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub leader: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub remark: Option<String>,
    pub parent_id: Option<Uuid>,
    pub children: Vec<DeptTree>,
}

impl From<Model> for DeptTree {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            leader: model.leader,
            phone: model.phone,
            email: model.email,
            is_active: model.is_active,
            remark: model.remark,
            parent_id: model.parent_id,
            children: Vec::new(),
        }
    }
}
