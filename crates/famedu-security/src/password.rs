//! Password hashing with Argon2
//!
//! New hashes are always Argon2id. Accounts imported from the previous
//! platform still carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); those verify
//! through bcrypt and report [`PasswordService::needs_rehash`] so the caller
//! can upgrade them after a successful login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use famedu_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, MIN_PASSWORD_SCORE};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
    #[error("Verification failed")]
    VerificationFailed,
    #[error("Password must be at least {0} characters")]
    TooShort(usize),
    #[error("Password must be at most {0} characters")]
    TooLong(usize),
    #[error("Password is too easy to guess")]
    TooWeak,
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        if Self::is_bcrypt(hash) {
            return bcrypt::verify(password, hash)
                .map_err(|e| PasswordError::HashError(e.to_string()));
        }
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Spends one Argon2 derivation and never matches. Used when there is no
    /// stored hash so a missing account costs as much as a wrong password.
    pub fn verify_dummy(password: &str) -> bool {
        let _ = Self::hash(password);
        false
    }

    pub fn needs_rehash(hash: &str) -> bool {
        Self::is_bcrypt(hash)
    }

    /// Length bounds plus a zxcvbn strength floor. `user_inputs` are words the
    /// estimator should treat as guessable (username, display name).
    pub fn check_strength(password: &str, user_inputs: &[&str]) -> Result<(), PasswordError> {
        let length = password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort(MIN_PASSWORD_LENGTH));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong(MAX_PASSWORD_LENGTH));
        }
        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if (estimate.score() as u8) < MIN_PASSWORD_SCORE {
            return Err(PasswordError::TooWeak);
        }
        Ok(())
    }

    fn is_bcrypt(hash: &str) -> bool {
        hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$")
    }
}
