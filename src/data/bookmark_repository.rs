use crate::data::query::{BOOKMARK_COLUMNS, BookmarkQuery, fold_case};
use crate::data::tags::{decode_tags, encode_tags};
use crate::domain::bookmark::{Bookmark, BookmarkDraft, BookmarkFilter, Pagination};
use crate::domain::repository::BookmarkRepository;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, instrument, trace};

/// Row shape of the `bookmarks` table, before tag decoding.
#[derive(Debug, sqlx::FromRow)]
struct BookmarkRow {
    id: i64,
    url: String,
    title: String,
    description: Option<String>,
    tags: Option<String>,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookmarkRow> for Bookmark {
    fn from(row: BookmarkRow) -> Self {
        Bookmark {
            tags: decode_tags(row.tags.as_deref()),
            id: row.id,
            url: row.url,
            title: row.title,
            description: row.description,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct SqliteBookmarkRepository {
    pool: SqlitePool,
}

impl SqliteBookmarkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookmarkRepository for SqliteBookmarkRepository {
    #[instrument(skip(self, draft), fields(user_id = user_id))]
    async fn insert(&self, user_id: i64, draft: BookmarkDraft) -> Result<Bookmark> {
        let now = Utc::now();
        let title_folded = fold_case(&draft.title);
        let description_folded = draft.description.as_deref().map(fold_case);
        let row = sqlx::query_as::<_, BookmarkRow>(&format!(
            "INSERT INTO bookmarks (url, title, description, tags, title_folded, description_folded, \
             user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {BOOKMARK_COLUMNS}"
        ))
        .bind(draft.url)
        .bind(draft.title)
        .bind(draft.description)
        .bind(encode_tags(&draft.tags))
        .bind(title_folded)
        .bind(description_folded)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        debug!(bookmark_id = row.id, "Bookmark inserted");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_owned(&self, user_id: i64, id: i64) -> Result<Option<Bookmark>> {
        let row = sqlx::query_as::<_, BookmarkRow>(&format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Bookmark::from))
    }

    #[instrument(skip(self, filter), fields(search = ?filter.search(), tag = ?filter.tag()))]
    async fn list(
        &self,
        user_id: i64,
        filter: &BookmarkFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Bookmark>, i64)> {
        let query = BookmarkQuery::new(user_id, filter);

        let total: i64 = query.count().build_query_scalar().fetch_one(&self.pool).await?;
        trace!(total, "Counted matching bookmarks");

        let mut select = query.select(pagination);
        let rows: Vec<BookmarkRow> = select.build_query_as().fetch_all(&self.pool).await?;
        debug!(returned = rows.len(), total, "Bookmarks listed");

        Ok((rows.into_iter().map(Bookmark::from).collect(), total))
    }

    #[instrument(skip(self, draft))]
    async fn replace(&self, user_id: i64, id: i64, draft: BookmarkDraft) -> Result<Option<Bookmark>> {
        let title_folded = fold_case(&draft.title);
        let description_folded = draft.description.as_deref().map(fold_case);
        let row = sqlx::query_as::<_, BookmarkRow>(&format!(
            "UPDATE bookmarks SET url = ?, title = ?, description = ?, tags = ?, \
             title_folded = ?, description_folded = ?, updated_at = ? \
             WHERE id = ? AND user_id = ? RETURNING {BOOKMARK_COLUMNS}"
        ))
        .bind(draft.url)
        .bind(draft.title)
        .bind(draft.description)
        .bind(encode_tags(&draft.tags))
        .bind(title_folded)
        .bind(description_folded)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Bookmark::from))
    }

    #[instrument(skip(self))]
    async fn delete_owned(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::connect_in_memory;
    use crate::data::user_repository::SqliteUserRepository;
    use crate::domain::repository::UserRepository;

    async fn setup() -> (SqliteBookmarkRepository, i64, i64) {
        let pool = connect_in_memory().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let alice = users.save_user("alice", "alice@x.com", "h").await.unwrap();
        let bob = users.save_user("bob", "bob@x.com", "h").await.unwrap();
        (SqliteBookmarkRepository::new(pool), alice.id, bob.id)
    }

    fn draft(title: &str, description: Option<&str>, tags: &[&str]) -> BookmarkDraft {
        BookmarkDraft {
            url: format!("https://example.com/{}", title.to_lowercase()),
            title: title.to_string(),
            description: description.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn titles(items: &[Bookmark]) -> Vec<&str> {
        items.iter().map(|b| b.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_insert_round_trips_tags() {
        let (repo, alice, _) = setup().await;
        let created = repo.insert(alice, draft("Rust", None, &["go", "rust"])).await.unwrap();
        assert_eq!(created.tags, vec!["go", "rust"]);
        assert_eq!(created.user_id, alice);

        let untagged = repo.insert(alice, draft("Plain", None, &[])).await.unwrap();
        assert!(untagged.tags.is_empty());

        let fetched = repo.find_owned(alice, created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_other_users_rows_are_invisible() {
        let (repo, alice, bob) = setup().await;
        let created = repo.insert(alice, draft("Mine", None, &[])).await.unwrap();

        assert!(repo.find_owned(bob, created.id).await.unwrap().is_none());
        assert!(repo.replace(bob, created.id, draft("Stolen", None, &[])).await.unwrap().is_none());
        assert!(!repo.delete_owned(bob, created.id).await.unwrap());

        let still = repo.find_owned(alice, created.id).await.unwrap().unwrap();
        assert_eq!(still.title, "Mine");
    }

    #[tokio::test]
    async fn test_replace_overwrites_all_fields() {
        let (repo, alice, _) = setup().await;
        let created = repo
            .insert(alice, draft("Old", Some("desc"), &["go", "rust"]))
            .await
            .unwrap();
        let updated = repo
            .replace(alice, created.id, draft("New", None, &["go"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, None);
        assert_eq!(updated.tags, vec!["go"]);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_delete_is_permanent() {
        let (repo, alice, _) = setup().await;
        let created = repo.insert(alice, draft("Gone", None, &[])).await.unwrap();
        assert!(repo.delete_owned(alice, created.id).await.unwrap());
        assert!(!repo.delete_owned(alice, created.id).await.unwrap());
        assert!(repo.find_owned(alice, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_paginates() {
        let (repo, alice, bob) = setup().await;
        for i in 1..=5 {
            repo.insert(alice, draft(&format!("B{i}"), None, &[])).await.unwrap();
        }
        repo.insert(bob, draft("Other", None, &[])).await.unwrap();

        let filter = BookmarkFilter::default();
        let (page1, total) = repo
            .list(alice, &filter, Pagination::new(Some(1), Some(2)).unwrap())
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(titles(&page1), vec!["B5", "B4"]);

        let (page3, _) = repo
            .list(alice, &filter, Pagination::new(Some(3), Some(2)).unwrap())
            .await
            .unwrap();
        assert_eq!(titles(&page3), vec!["B1"]);

        let (beyond, total) = repo
            .list(alice, &filter, Pagination::new(Some(9), Some(2)).unwrap())
            .await
            .unwrap();
        assert!(beyond.is_empty());
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_search_matches_title_or_description_case_insensitively() {
        let (repo, alice, _) = setup().await;
        repo.insert(alice, draft("Rust Book", None, &[])).await.unwrap();
        repo.insert(alice, draft("Notes", Some("all about RUST"), &[])).await.unwrap();
        repo.insert(alice, draft("Go Tour", None, &[])).await.unwrap();

        let filter = BookmarkFilter::new(Some("rust".into()), None);
        let (items, total) = repo.list(alice, &filter, Pagination::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(titles(&items), vec!["Notes", "Rust Book"]);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let (repo, alice, _) = setup().await;
        let created = repo.insert(alice, draft("École", None, &[])).await.unwrap();
        repo.insert(alice, draft("Notes", Some("ÜBER alles"), &[])).await.unwrap();

        let filter = BookmarkFilter::new(Some("école".into()), None);
        let (items, _) = repo.list(alice, &filter, Pagination::default()).await.unwrap();
        assert_eq!(titles(&items), vec!["École"]);

        let filter = BookmarkFilter::new(Some("über".into()), None);
        let (items, _) = repo.list(alice, &filter, Pagination::default()).await.unwrap();
        assert_eq!(titles(&items), vec!["Notes"]);

        // Folded copies follow a replace.
        repo.replace(alice, created.id, draft("ÉTÉ", None, &[])).await.unwrap();
        let filter = BookmarkFilter::new(Some("été".into()), None);
        let (items, _) = repo.list(alice, &filter, Pagination::default()).await.unwrap();
        assert_eq!(titles(&items), vec!["ÉTÉ"]);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (repo, alice, _) = setup().await;
        repo.insert(alice, draft("100% Rust", None, &[])).await.unwrap();
        repo.insert(alice, draft("1000 Rust", None, &[])).await.unwrap();

        let filter = BookmarkFilter::new(Some("0%".into()), None);
        let (items, _) = repo.list(alice, &filter, Pagination::default()).await.unwrap();
        assert_eq!(titles(&items), vec!["100% Rust"]);
    }

    #[tokio::test]
    async fn test_tag_filter_is_substring_of_serialized_tags() {
        let (repo, alice, _) = setup().await;
        repo.insert(alice, draft("Cats", None, &["cat"])).await.unwrap();
        repo.insert(alice, draft("Dogs", None, &["dog"])).await.unwrap();
        repo.insert(alice, draft("None", None, &[])).await.unwrap();

        let filter = BookmarkFilter::new(None, Some("a".into()));
        let (items, total) = repo.list(alice, &filter, Pagination::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(titles(&items), vec!["Cats"]);

        let filter = BookmarkFilter::new(Some("dog".into()), Some("cat".into()));
        let (items, _) = repo.list(alice, &filter, Pagination::default()).await.unwrap();
        assert!(items.is_empty());
    }
}
