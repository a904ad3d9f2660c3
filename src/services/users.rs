//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, User, UserClaims, UserInfo},
    repository::Repository,
};

const BAD_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    /// Authenticate user by username and return a JWT token with the user's info
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, UserInfo)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication(BAD_CREDENTIALS.to_string()))?;

        if !verify_password(&user.password_hash, password)? {
            return Err(AppError::Authentication(BAD_CREDENTIALS.to_string()));
        }

        let permissions = self.repository.users.get_permissions(user.id).await?;
        let token = self.create_token_for_user(&user, &permissions)?;

        tracing::info!("User {} logged in", user.username);
        Ok((token, UserInfo::new(user, permissions)))
    }

    fn create_token_for_user(&self, user: &User, permissions: &[String]) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            permissions: permissions.to_vec(),
            exp: now + self.token_lifetime(),
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Current user's profile, read fresh from the database
    pub async fn me(&self, user_id: i32) -> AppResult<UserInfo> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let permissions = self.repository.users.get_permissions(user.id).await?;
        Ok(UserInfo::new(user, permissions))
    }

    /// Create a user account with its permission grants
    pub async fn create_user(&self, data: &CreateUser) -> AppResult<UserInfo> {
        if self.repository.users.username_exists(&data.username).await? {
            return Err(AppError::Conflict(format!(
                "Username {} is already taken",
                data.username
            )));
        }

        let hash = hash_password(&data.password)?;
        let user = self.repository.users.create(data, &hash).await?;
        let permissions = self.repository.users.get_permissions(user.id).await?;

        tracing::info!("Created user {} (id {})", user.username, user.id);
        Ok(UserInfo::new(user, permissions))
    }

    /// Delete a user account; copies they borrowed lose their borrower
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Create the configured bootstrap superuser if it does not exist yet
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.bootstrap_admin_username.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.username_exists(username).await? {
            return Ok(());
        }

        let admin = CreateUser {
            username: username.to_string(),
            password: password.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            is_staff: true,
            is_superuser: true,
            permissions: Vec::new(),
        };
        let hash = hash_password(&admin.password)?;
        self.repository.users.create(&admin, &hash).await?;

        tracing::info!("Created bootstrap administrator {}", username);
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));

        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("not-a-phc-string", "x"),
            Err(AppError::Internal(_))
        ));
    }
}
