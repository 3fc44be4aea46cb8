use crate::domain::error::DomainError;
use crate::domain::payload::AuthSession;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, LoginRequest, PublicUser, User};
use crate::infrastructure::security::{TokenSigner, hash_password, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

pub struct AuthService<R: UserRepository> {
    user_repository: Arc<R>,
    tokens: TokenSigner,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(user_repository: Arc<R>, tokens: TokenSigner) -> Self {
        Self {
            user_repository,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenSigner {
        &self.tokens
    }

    #[instrument(skip(self, req), fields(username = %req.username, email = %req.email))]
    pub async fn register(&self, req: CreateUser) -> Result<AuthSession> {
        trace!("Starting user registration");
        let new_user = req.validate()?;

        if self
            .user_repository
            .username_or_email_taken(&new_user.username, &new_user.email)
            .await?
        {
            warn!("User already exists");
            return Err(DomainError::Validation("User already exists".to_string()).into());
        }

        let password_hash = hash_password(&new_user.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        debug!("Saving user to repository");
        let user = self
            .user_repository
            .save_user(&new_user.username, &new_user.email, &password_hash)
            .await?;

        let session = self.session_for(&user)?;
        info!(user_id = user.id, "User registered successfully");
        Ok(session)
    }

    #[instrument(skip(self, req))]
    pub async fn login(&self, req: LoginRequest) -> Result<AuthSession> {
        trace!("Starting login");
        let identifier = req.identifier()?;

        let user = self
            .user_repository
            .find_user_by_login(&identifier)
            .await?
            .ok_or_else(|| {
                warn!(identifier = %identifier, "User not found during login");
                DomainError::invalid_credentials()
            })?;

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = user.id, "Invalid password during login");
            return Err(DomainError::invalid_credentials().into());
        }

        let session = self.session_for(&user)?;
        info!(user_id = user.id, "Login successful");
        Ok(session)
    }

    /// Resolves a bearer token to the id of the user it was issued to.
    pub fn verify(&self, token: &str) -> Result<i64> {
        self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            DomainError::Unauthorized(e.to_string()).into()
        })
    }

    #[instrument(skip(self))]
    pub async fn current_user(&self, user_id: i64) -> Result<PublicUser> {
        let user = self
            .user_repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id, "Token refers to a missing user");
                DomainError::Unauthorized("User no longer exists".to_string())
            })?;
        Ok(PublicUser::from(&user))
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        let token = self.tokens.issue(user.id).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e))
        })?;
        Ok(AuthSession {
            user: PublicUser::from(user),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::connect_in_memory;
    use crate::data::user_repository::SqliteUserRepository;

    async fn service() -> AuthService<SqliteUserRepository> {
        let repo = SqliteUserRepository::new(connect_in_memory().await.unwrap());
        AuthService::new(Arc::new(repo), TokenSigner::new("auth-service-secret", 3600))
    }

    fn alice() -> CreateUser {
        CreateUser {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "pw123456".to_string(),
        }
    }

    fn domain_error(err: &anyhow::Error) -> &DomainError {
        err.downcast_ref::<DomainError>().expect("domain error")
    }

    #[tokio::test]
    async fn test_register_then_login_with_username_or_email() {
        let auth = service().await;
        let registered = auth.register(alice()).await.unwrap();
        assert_eq!(registered.user.username, "alice");
        assert_eq!(auth.verify(&registered.token).unwrap(), registered.user.id);

        let by_name = auth
            .login(LoginRequest::with_username("alice", "pw123456"))
            .await
            .unwrap();
        assert_eq!(by_name.user, registered.user);

        let by_email = auth
            .login(LoginRequest::with_email("alice@x.com", "pw123456"))
            .await
            .unwrap();
        assert_eq!(auth.verify(&by_email.token).unwrap(), registered.user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_is_validation_error() {
        let auth = service().await;
        auth.register(alice()).await.unwrap();

        let mut same_email = alice();
        same_email.username = "alice2".to_string();
        let err = auth.register(same_email).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_fields() {
        let auth = service().await;
        let mut bad = alice();
        bad.password = "123".to_string();
        let err = auth.register(bad).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service().await;
        auth.register(alice()).await.unwrap();

        let wrong_password = auth
            .login(LoginRequest::with_username("alice", "nope"))
            .await
            .unwrap_err();
        let unknown_user = auth
            .login(LoginRequest::with_username("mallory", "pw123456"))
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), "Invalid credentials");
        assert_eq!(unknown_user.to_string(), "Invalid credentials");
        assert!(matches!(domain_error(&unknown_user), DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_and_current_user_requires_row() {
        let auth = service().await;
        let err = auth.verify("garbage").unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Unauthorized(_)));

        let token = auth.tokens().issue(404).unwrap();
        let id = auth.verify(&token).unwrap();
        let err = auth.current_user(id).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Unauthorized(_)));
    }
}
