//! Best-effort audit logging with an async queue

mod logger;

pub use logger::{ActivityLogger, AuditLoggerConfig};
