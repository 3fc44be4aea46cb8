use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, instrument, trace, warn};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self, password_hash), fields(username = username, email = email))]
    async fn save_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        let now = Utc::now();
        trace!("Inserting user row");
        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user) => {
                debug!(user_id = user.id, "User saved to database");
                Ok(user)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                warn!("Username or email already registered");
                Err(DomainError::Validation("User already exists".to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(identifier = identifier))]
    async fn find_user_by_login(&self, identifier: &str) -> Result<Option<User>> {
        trace!("Looking up user by username or email");
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? LIMIT 1"
        ))
        .bind(identifier)
        .bind(identifier.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        match &user {
            Some(u) => debug!(user_id = u.id, "User found"),
            None => trace!("User not found"),
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        trace!("Looking up user by ID");
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        let taken: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? OR email = ?)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken != 0)
    }
}
