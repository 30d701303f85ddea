//! HTTP handlers

pub mod auth;
pub mod families;
pub mod health;
pub mod users;
