//! Request handlers module

pub mod dept;
pub mod menu;
pub mod post;
pub mod role;
pub mod user;
