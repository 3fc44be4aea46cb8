use crate::domain::bookmark::{Bookmark, BookmarkFilter, BookmarkInput, BookmarkPage, Pagination};
use crate::domain::error::DomainError;
use crate::domain::repository::BookmarkRepository;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Bookmark operations on behalf of one authenticated user.
pub struct BookmarkService<R: BookmarkRepository> {
    repository: Arc<R>,
}

impl<R: BookmarkRepository> BookmarkService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        user_id: i64,
        filter: BookmarkFilter,
        pagination: Pagination,
    ) -> Result<BookmarkPage> {
        let (items, total) = self.repository.list(user_id, &filter, pagination).await?;
        Ok(BookmarkPage {
            items,
            total,
            pagination,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i64, id: i64) -> Result<Bookmark> {
        self.repository
            .find_owned(user_id, id)
            .await?
            .ok_or_else(|| {
                warn!(user_id, bookmark_id = id, "Bookmark not found");
                DomainError::bookmark_not_found().into()
            })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, user_id: i64, input: BookmarkInput) -> Result<Bookmark> {
        let draft = input.validate()?;
        let bookmark = self.repository.insert(user_id, draft).await?;
        info!(user_id, bookmark_id = bookmark.id, "Bookmark created");
        Ok(bookmark)
    }

    /// Full replace of url, title, description and tags.
    #[instrument(skip(self, input))]
    pub async fn update(&self, user_id: i64, id: i64, input: BookmarkInput) -> Result<Bookmark> {
        let draft = input.validate()?;
        let bookmark = self
            .repository
            .replace(user_id, id, draft)
            .await?
            .ok_or_else(|| {
                warn!(user_id, bookmark_id = id, "Bookmark not found for update");
                DomainError::bookmark_not_found()
            })?;
        info!(user_id, bookmark_id = id, "Bookmark updated");
        Ok(bookmark)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        if !self.repository.delete_owned(user_id, id).await? {
            warn!(user_id, bookmark_id = id, "Bookmark not found for delete");
            return Err(DomainError::bookmark_not_found().into());
        }
        info!(user_id, bookmark_id = id, "Bookmark deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bookmark_repository::SqliteBookmarkRepository;
    use crate::data::database::connect_in_memory;
    use crate::data::user_repository::SqliteUserRepository;
    use crate::domain::repository::UserRepository;

    async fn setup() -> (BookmarkService<SqliteBookmarkRepository>, i64, i64) {
        let pool = connect_in_memory().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let alice = users.save_user("alice", "alice@x.com", "h").await.unwrap();
        let bob = users.save_user("bob", "bob@x.com", "h").await.unwrap();
        let service = BookmarkService::new(Arc::new(SqliteBookmarkRepository::new(pool)));
        (service, alice.id, bob.id)
    }

    fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_)))
    }

    #[tokio::test]
    async fn test_invalid_url_persists_nothing() {
        let (service, alice, _) = setup().await;
        let err = service
            .create(alice, BookmarkInput::new("not a url", "X"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InvalidInput(_))
        ));
        let page = service
            .list(alice, BookmarkFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_row_unchanged() {
        let (service, alice, _) = setup().await;
        let created = service
            .create(alice, BookmarkInput::new("https://x.com", "X"))
            .await
            .unwrap();
        assert!(
            service
                .update(alice, created.id, BookmarkInput::new("not a url", "Y"))
                .await
                .is_err()
        );
        assert_eq!(service.get(alice, created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_replaces_tags() {
        let (service, alice, _) = setup().await;
        let created = service
            .create(alice, BookmarkInput::new("https://x.com", "X").with_tags(["go", "rust"]))
            .await
            .unwrap();
        assert_eq!(created.tags, vec!["go", "rust"]);

        service
            .update(alice, created.id, BookmarkInput::new("https://x.com", "X").with_tags(["go"]))
            .await
            .unwrap();
        assert_eq!(service.get(alice, created.id).await.unwrap().tags, vec!["go"]);
    }

    #[tokio::test]
    async fn test_foreign_bookmark_is_not_found_everywhere() {
        let (service, alice, bob) = setup().await;
        let created = service
            .create(alice, BookmarkInput::new("https://x.com", "X"))
            .await
            .unwrap();

        assert!(is_not_found(&service.get(bob, created.id).await.unwrap_err()));
        assert!(is_not_found(
            &service
                .update(bob, created.id, BookmarkInput::new("https://y.com", "Y"))
                .await
                .unwrap_err()
        ));
        assert!(is_not_found(&service.delete(bob, created.id).await.unwrap_err()));
    }

    #[tokio::test]
    async fn test_repeated_delete_is_not_found() {
        let (service, alice, _) = setup().await;
        let created = service
            .create(alice, BookmarkInput::new("https://x.com", "X"))
            .await
            .unwrap();
        service.delete(alice, created.id).await.unwrap();
        assert!(is_not_found(&service.delete(alice, created.id).await.unwrap_err()));
    }

    #[tokio::test]
    async fn test_list_page_math() {
        let (service, alice, _) = setup().await;
        for i in 0..23 {
            service
                .create(alice, BookmarkInput::new("https://x.com", &format!("B{i}")))
                .await
                .unwrap();
        }
        let pagination = Pagination::new(Some(3), Some(10)).unwrap();
        let page = service
            .list(alice, BookmarkFilter::default(), pagination)
            .await
            .unwrap();
        assert_eq!(page.total, 23);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items.len(), 3);
    }
}
