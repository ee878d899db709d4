//! Entity module - SeaORM entity definitions
//!
//! One table per entity kind; references between tables are plain id columns.

pub mod department;
pub mod menu;
pub mod post;
pub mod role;
pub mod user;
