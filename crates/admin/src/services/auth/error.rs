//! Admin authentication error types.

use thiserror::Error;

use vegi_shop_core::password::PasswordError;
use vegi_shop_db::RepositoryError;

/// Errors that can occur during admin login.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Unknown email, wrong password, no password, or not an admin.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Stored hash could not be processed.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<PasswordError> for AdminAuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch | PasswordError::TooShort => Self::InvalidCredentials,
            PasswordError::Hash => Self::PasswordHash,
        }
    }
}
