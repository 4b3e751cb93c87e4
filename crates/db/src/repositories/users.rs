//! User repository.
//!
//! Credential accounts carry an argon2 `password_hash`; accounts created via
//! Google sign-in have none and can only log in through Google.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use vegi_shop_core::{Email, UserId, UserRole};

use crate::RepositoryError;

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, name, image, role, created_at, updated_at";

/// A shop account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Best available display name: `name`, then first + last, then the
    /// email local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_owned();
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.email.local_part().to_owned()
        } else {
            full
        }
    }
}

/// Fields for a new account.
#[derive(Debug, Clone, Default)]
pub struct NewUser<'a> {
    pub password_hash: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub name: Option<&'a str>,
    pub image: Option<&'a str>,
    pub role: UserRole,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user together with their password hash, for credential login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, email: &Email, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO users (email, password_hash, first_name, last_name, name, image, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(new.password_hash)
            .bind(new.first_name)
            .bind(new.last_name)
            .bind(new.name)
            .bind(new.image)
            .bind(new.role)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "email already exists"))
    }

    /// Find the account for an OAuth sign-in, creating a `user`-role account
    /// without a password when none exists. Name and avatar are only filled
    /// in where the account has none yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_or_create_oauth(
        &self,
        email: &Email,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO users (email, name, image, role)
            VALUES ($1, $2, $3, 'user')
            ON CONFLICT (email) DO UPDATE
                SET name = COALESCE(users.name, EXCLUDED.name),
                    image = COALESCE(users.image, EXCLUDED.image),
                    updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(name)
            .bind(image)
            .fetch_one(self.pool)
            .await?;
        Ok(user)
    }

    /// Change an account's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has this email.
    pub async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE email = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(role)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(name: Option<&str>, first: Option<&str>, last: Option<&str>) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("carrot.fan@example.com").unwrap(),
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            name: name.map(str::to_owned),
            image: None,
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_name() {
        assert_eq!(user(Some("Jo"), Some("Joanna"), None).display_name(), "Jo");
    }

    #[test]
    fn test_display_name_joins_first_and_last() {
        assert_eq!(
            user(None, Some("Ada"), Some("Lovelace")).display_name(),
            "Ada Lovelace"
        );
        assert_eq!(user(Some("  "), Some("Ada"), None).display_name(), "Ada");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(None, None, None).display_name(), "carrot.fan");
    }
}
