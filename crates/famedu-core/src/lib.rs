//! # FamEdu Core
//! 
//! Domain entities, authorization, services, and repository traits for the
//! family education platform.

pub mod audit;
pub mod authz;
pub mod domain;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
