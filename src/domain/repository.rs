use crate::domain::bookmark::{Bookmark, BookmarkDraft, BookmarkFilter, Pagination};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;

/// Every bookmark operation is keyed by `(user_id, id)`, so rows owned by
/// another user behave exactly like rows that do not exist.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    async fn insert(&self, user_id: i64, draft: BookmarkDraft) -> Result<Bookmark>;
    async fn find_owned(&self, user_id: i64, id: i64) -> Result<Option<Bookmark>>;
    async fn list(
        &self,
        user_id: i64,
        filter: &BookmarkFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Bookmark>, i64)>;
    async fn replace(&self, user_id: i64, id: i64, draft: BookmarkDraft) -> Result<Option<Bookmark>>;
    async fn delete_owned(&self, user_id: i64, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DomainError::Validation` when the username or email is taken.
    async fn save_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User>;
    async fn find_user_by_login(&self, identifier: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool>;
}
