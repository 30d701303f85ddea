//! Request extractors shared by the handlers

pub mod auth;
pub mod client;
pub mod validated_json;

pub use auth::AuthUser;
pub use client::ClientContext;
pub use validated_json::ValidatedJson;
