//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin user with a password login
//! vegi-cli admin create -e admin@example.com -p 'correct horse' -n "Admin Name"
//!
//! # Change the role of an existing account
//! vegi-cli admin promote -e grocer@example.com
//! vegi-cli admin demote -e grocer@example.com
//! ```

use thiserror::Error;
use vegi_shop_core::password::{PasswordError, hash_password, validate_password};
use vegi_shop_core::{Email, UserRole};
use vegi_shop_db::{NewUser, RepositoryError, User, UserRepository};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database URL missing or database unreachable.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Query failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected by policy or hashing failed.
    #[error("{0}")]
    Password(#[from] PasswordError),

    /// User already exists.
    #[error("A user already exists with email: {0}")]
    UserExists(String),

    /// No account with this email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),
}

fn parse_email(email: &str) -> Result<Email, AdminError> {
    Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))
}

/// Blank names are stored as `NULL`.
fn display_name(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

/// Create a new admin user.
///
/// Input is validated before connecting, so typos fail fast.
///
/// # Errors
///
/// Returns `AdminError::UserExists` if the email is taken, or a validation
/// error for a malformed email or short password.
pub async fn create_user(email: &str, password: &str, name: Option<&str>) -> Result<User, AdminError> {
    let email = parse_email(email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", email.as_str());

    let new_user = NewUser {
        password_hash: Some(&password_hash),
        name: display_name(name),
        role: UserRole::Admin,
        ..NewUser::default()
    };

    let user = UserRepository::new(&pool)
        .create(&email, &new_user)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.as_str().to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email.as_str()
    );

    Ok(user)
}

/// Give an existing account the admin role.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has this email.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    set_role(email, UserRole::Admin).await
}

/// Return an account to the customer role.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has this email.
pub async fn demote(email: &str) -> Result<(), AdminError> {
    set_role(email, UserRole::User).await
}

async fn set_role(email: &str, role: UserRole) -> Result<(), AdminError> {
    let email = parse_email(email)?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.as_str().to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("{} is now {}", user.email.as_str(), user.role);
    Ok(())
}
