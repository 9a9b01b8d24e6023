//! Authentication and user accounts

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{AccountTypeSlug, NewUser, User},
    models::UserClaims,
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Seconds a token stays valid
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    /// Authenticate user by login and return a JWT token opening a new session
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<String> {
        let user = self
            .repository
            .users
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let token = self.create_token_for_user(&user).await?;
        tracing::info!("User {} logged in", user.login);
        Ok(token)
    }

    async fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let rights = self.repository.users.get_rights(&user.account_type).await?;

        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            sid: Uuid::new_v4(),
            account_type: user.account_type.clone(),
            rights,
            exp: now + self.token_lifetime(),
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Decode and check a bearer token
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }

    /// Creates the configured administrator account unless its login is taken
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(login), Some(password)) = (&self.config.admin_login, &self.config.admin_password)
        else {
            return Ok(());
        };

        if self.repository.users.get_by_login(login).await?.is_some() {
            return Ok(());
        }

        let admin = NewUser {
            login: login.clone(),
            password: hash_password(password)?,
            first_name: String::new(),
            last_name: login.clone(),
            account_type: AccountTypeSlug::Admin,
        };
        let created = self.repository.users.create(&admin).await?;
        tracing::info!("Created administrator account {} (id {})", created.login, created.id);
        Ok(())
    }
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Rights, UserRights};
    use crate::repository::testutils::MockRepositories;
    use mockall::predicate::eq;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 2,
            admin_login: Some("admin".to_string()),
            admin_password: Some("s3cret".to_string()),
        }
    }

    fn user(password: &str) -> User {
        User {
            id: 12,
            login: "librarian".to_string(),
            password: hash_password(password).unwrap(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            account_type: AccountTypeSlug::Librarian,
        }
    }

    #[tokio::test]
    async fn test_authenticate_issues_token_with_rights() {
        let stored = user("hunter22");
        let mut repos = MockRepositories::new();
        repos
            .users
            .expect_get_by_login()
            .with(eq("librarian"))
            .returning(move |_| Ok(Some(stored.clone())));
        repos
            .users
            .expect_get_rights()
            .with(eq(AccountTypeSlug::Librarian))
            .returning(|_| {
                Ok(UserRights {
                    loans_rights: Rights::Write,
                    authors_rights: Rights::Write,
                    books_rights: Rights::Write,
                })
            });

        let service = UsersService::new(repos.into_repository(), config());
        let token = service.authenticate("librarian", "hunter22").await.unwrap();
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(12, claims.user_id);
        assert_eq!(7200, claims.exp - claims.iat);
        assert!(claims.require_renew_loans().is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_password() {
        let stored = user("hunter22");
        let mut repos = MockRepositories::new();
        repos
            .users
            .expect_get_by_login()
            .returning(move |_| Ok(Some(stored.clone())));
        repos.users.expect_get_rights().never();

        let service = UsersService::new(repos.into_repository(), config());
        let result = service.authenticate("librarian", "hunter2").await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_login() {
        let mut repos = MockRepositories::new();
        repos.users.expect_get_by_login().returning(|_| Ok(None));

        let service = UsersService::new(repos.into_repository(), config());
        let result = service.authenticate("nobody", "x").await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_each_login_opens_a_new_session() {
        let stored = user("pw");
        let mut repos = MockRepositories::new();
        repos
            .users
            .expect_get_by_login()
            .returning(move |_| Ok(Some(stored.clone())));
        repos.users.expect_get_rights().returning(|_| Ok(UserRights::default()));

        let service = UsersService::new(repos.into_repository(), config());
        let first = service.verify_token(&service.authenticate("librarian", "pw").await.unwrap());
        let second = service.verify_token(&service.authenticate("librarian", "pw").await.unwrap());
        assert_ne!(first.unwrap().sid, second.unwrap().sid);
    }

    #[test]
    fn test_verify_token_rejects_other_secret() {
        let service = UsersService::new(MockRepositories::new().into_repository(), config());
        let claims = UserClaims {
            sub: "x".to_string(),
            user_id: 1,
            sid: Uuid::new_v4(),
            account_type: AccountTypeSlug::Reader,
            rights: UserRights::default(),
            exp: Utc::now().timestamp() + 60,
            iat: Utc::now().timestamp(),
        };
        let token = claims.create_token("another-secret").unwrap();
        assert!(matches!(service.verify_token(&token), Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_creates_missing_account() {
        let mut repos = MockRepositories::new();
        repos.users.expect_get_by_login().with(eq("admin")).returning(|_| Ok(None));
        repos
            .users
            .expect_create()
            .withf(|user: &NewUser| {
                user.login == "admin"
                    && user.account_type == AccountTypeSlug::Admin
                    && user.password != "s3cret"
            })
            .times(1)
            .returning(|user| {
                Ok(User {
                    id: 1,
                    login: user.login.clone(),
                    password: user.password.clone(),
                    first_name: String::new(),
                    last_name: user.last_name.clone(),
                    account_type: AccountTypeSlug::Admin,
                })
            });

        let service = UsersService::new(repos.into_repository(), config());
        service.ensure_admin().await.unwrap();
    }
}
