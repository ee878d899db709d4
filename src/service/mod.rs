//! Business operations for every entity kind
//!
//! Services take an injected `DatabaseConnection`, run their checks and writes
//! inside one transaction, and return typed results or a classified `AppError`.

use serde::{Deserialize, Deserializer};

pub mod dept;
pub mod menu;
pub mod post;
pub mod role;
pub mod tree;
pub mod user;
pub mod validate;

pub(crate) fn default_true() -> bool {
    true
}

/// Deserialize a patch field that may be absent (`None`), explicitly null
/// (`Some(None)`) or set (`Some(Some(v))`). Use with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
