use crate::{
    auth::password::{hash as hash_password, verify as verify_password},
    db::DbPool,
    error::{AppError, Result, is_unique_violation},
    models::user::{Role, User, UserIdentity},
};

/// User store for registration and login
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
    min_password_length: usize,
}

impl UserStore {
    /// Create a new UserStore with the provided database pool
    pub fn new(pool: DbPool, min_password_length: usize) -> Self {
        Self {
            pool,
            min_password_length: min_password_length.max(1),
        }
    }

    /// Register a new user with a salted password hash
    pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<()> {
        if username.trim().is_empty() {
            return Err(AppError::Validation("username must not be empty".into()));
        }
        if password.chars().count() < self.min_password_length {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters long",
                self.min_password_length
            )));
        }

        let password_hash = hash_password(password).await?;

        sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(&password_hash)
            .bind(role)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateUsername
                } else {
                    AppError::from(e)
                }
            })?;

        tracing::info!("Registered user {} as {:?}", username, role);
        Ok(())
    }

    /// Check a username/password pair and return the caller's identity
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity> {
        let user = self
            .get_user(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        tracing::debug!("User {} logged in", username);
        Ok(UserIdentity::from(user))
    }

    /// Get a user by username
    pub async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password_hash, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
