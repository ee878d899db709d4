//! User entity
//!
//! Table: sys_user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User gender
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Gender {
    #[sea_orm(string_value = "female")]
    Female,
    #[default]
    #[sea_orm(string_value = "male")]
    Male,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sys_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Username (unique)
    #[sea_orm(column_type = "String(StringLen::N(50))", unique)]
    pub username: String,

    /// Email (unique)
    #[sea_orm(column_type = "String(StringLen::N(100))", unique)]
    pub email: String,

    /// Phone (unique)
    #[sea_orm(column_type = "String(StringLen::N(20))", unique)]
    pub phone: String,

    /// Password (bcrypt hash)
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    #[serde(skip_serializing)]
    pub hashed_password: String,

    pub gender: Gender,

    pub is_active: bool,

    /// Superusers cannot be deleted
    pub is_superuser: bool,

    #[sea_orm(column_type = "String(StringLen::N(50))", nullable)]
    pub nickname: Option<String>,

    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub remark: Option<String>,

    #[sea_orm(indexed, nullable)]
    pub dept_id: Option<Uuid>,

    #[sea_orm(indexed, nullable)]
    pub role_id: Option<Uuid>,

    #[sea_orm(indexed, nullable)]
    pub post_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Department/role/post summaries are joined by hand in service::user

impl ActiveModelBehavior for ActiveModel {}

/// `{id, name}` summary of an associated entity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefInfo {
    pub id: Uuid,
    pub name: String,
}

/// Denormalized user view (no password)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub nickname: Option<String>,
    pub gender: Gender,
    pub is_active: bool,
    pub is_superuser: bool,
    pub remark: Option<String>,
    pub dept_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub dept_info: Option<RefInfo>,
    pub role_info: Option<RefInfo>,
    pub post_info: Option<RefInfo>,
}

impl From<Model> for UserResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            phone: model.phone,
            nickname: model.nickname,
            gender: model.gender,
            is_active: model.is_active,
            is_superuser: model.is_superuser,
            remark: model.remark,
            dept_id: model.dept_id,
            role_id: model.role_id,
            post_id: model.post_id,
            dept_info: None, // Filled in by service::user
            role_info: None,
            post_info: None,
        }
    }
}
