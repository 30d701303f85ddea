//! # FamEdu Security
//! 
//! Security utilities: password hashing, JWT, clock port and login throttling.

pub mod clock;
pub mod jwt;
pub mod login_tracker;
pub mod password;

pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::JwtService;
pub use login_tracker::{LimitCheck, LockoutPolicy, LoginAttemptTracker};
pub use password::PasswordService;
