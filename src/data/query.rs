//! Translates a [`BookmarkFilter`] into SQLite predicates.

use crate::domain::bookmark::{BookmarkFilter, Pagination};
use sqlx::{QueryBuilder, Sqlite};

pub const BOOKMARK_COLUMNS: &str =
    "id, url, title, description, tags, user_id, created_at, updated_at";

pub struct BookmarkQuery<'f> {
    user_id: i64,
    filter: &'f BookmarkFilter,
}

impl<'f> BookmarkQuery<'f> {
    pub fn new(user_id: i64, filter: &'f BookmarkFilter) -> Self {
        Self { user_id, filter }
    }

    /// Newest first, one page.
    pub fn select(&self, pagination: Pagination) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks"));
        self.push_predicates(&mut qb);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        qb
    }

    pub fn count(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM bookmarks");
        self.push_predicates(&mut qb);
        qb
    }

    fn push_predicates(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        qb.push(" WHERE user_id = ").push_bind(self.user_id);

        // Matched against the lowercased copies written alongside each row;
        // SQLite's own LIKE folds ASCII only.
        if let Some(search) = self.filter.search() {
            let pattern = contains_pattern(&fold_case(search));
            qb.push(" AND (title_folded LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR description_folded LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        // Substring match on the serialized column, so "a" also matches "cat".
        if let Some(tag) = self.filter.tag() {
            qb.push(" AND tags LIKE ")
                .push_bind(contains_pattern(tag))
                .push(" ESCAPE '\\'");
        }
    }
}

/// Unicode lowercase form stored in the `*_folded` columns and used for search terms.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// `%term%` with LIKE wildcards in `term` matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
