//! Admin authentication service.
//!
//! Admins are ordinary users with role `admin`; they sign in with the same
//! argon2 password hash as the storefront. Customer accounts are refused
//! with the same error as a wrong password.

mod error;

pub use error::AdminAuthError;

use sqlx::PgPool;

use vegi_shop_core::Email;
use vegi_shop_core::password::verify_password;
use vegi_shop_db::{User, UserRepository};

pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Login with email and password, requiring the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for any credential or
    /// role failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;
        let password_hash = password_hash.ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.role.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin attempted admin login");
            return Err(AdminAuthError::InvalidCredentials);
        }
        Ok(user)
    }
}
