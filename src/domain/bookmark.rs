use crate::domain::error::{DomainError, FieldError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

pub const TITLE_MAX: usize = 200;
pub const TAGS_MAX_ENCODED: usize = 255;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tags arrive either as a JSON array or as one comma-joined string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Joined(String),
}

impl From<Vec<String>> for TagsInput {
    fn from(tags: Vec<String>) -> Self {
        TagsInput::List(tags)
    }
}

/// Body of a create or update request. Every write replaces all four fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkInput {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagsInput>,
}

impl BookmarkInput {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(TagsInput::List(tags.into_iter().map(Into::into).collect()));
        self
    }

    pub fn validate(self) -> Result<BookmarkDraft, DomainError> {
        let mut errors = Vec::new();

        let url = self.url.trim().to_string();
        if url.is_empty() {
            errors.push(FieldError::new("url", "URL is required"));
        } else if !is_web_url(&url) {
            errors.push(FieldError::new("url", "Please provide a valid URL"));
        }

        let title = self.title.trim().to_string();
        let title_len = title.chars().count();
        if title_len == 0 {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title_len > TITLE_MAX {
            errors.push(FieldError::new(
                "title",
                format!("Title must be between 1 and {TITLE_MAX} characters"),
            ));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let tags = match self.tags {
            None => Vec::new(),
            Some(TagsInput::Joined(joined)) => joined
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            Some(TagsInput::List(list)) => {
                let tags: Vec<String> = list.iter().map(|t| t.trim().to_string()).collect();
                if tags.iter().any(String::is_empty) {
                    errors.push(FieldError::new("tags", "Tags cannot be empty"));
                }
                if tags.iter().any(|t| t.contains(',')) {
                    errors.push(FieldError::new("tags", "Tags cannot contain commas"));
                }
                tags
            }
        };
        let encoded_len = tags.iter().map(String::len).sum::<usize>() + tags.len().saturating_sub(1);
        if encoded_len > TAGS_MAX_ENCODED {
            errors.push(FieldError::new("tags", "Tags are too long"));
        }

        if !errors.is_empty() {
            return Err(DomainError::InvalidInput(errors));
        }

        Ok(BookmarkDraft {
            url,
            title,
            description,
            tags,
        })
    }
}

fn is_web_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// A validated bookmark write.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkDraft {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// Optional narrowing of a bookmark listing. Blank terms are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkFilter {
    search: Option<String>,
    tag: Option<String>,
}

impl BookmarkFilter {
    pub fn new(search: Option<String>, tag: Option<String>) -> Self {
        Self {
            search: search.filter(|s| !s.trim().is_empty()),
            tag: tag.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let mut errors = Vec::new();
        let limit_ok = (1..=MAX_LIMIT).contains(&limit);
        if page < 1 {
            errors.push(FieldError::new("page", "Page must be at least 1"));
        } else if limit_ok && (page - 1).checked_mul(limit).is_none() {
            errors.push(FieldError::new("page", "Page is out of range"));
        }
        if !limit_ok {
            errors.push(FieldError::new(
                "limit",
                format!("Limit must be between 1 and {MAX_LIMIT}"),
            ));
        }
        if !errors.is_empty() {
            return Err(DomainError::InvalidInput(errors));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

/// One page of a listing plus the pre-pagination match count.
#[derive(Debug, Clone)]
pub struct BookmarkPage {
    pub items: Vec<Bookmark>,
    pub total: i64,
    pub pagination: Pagination,
}

impl BookmarkPage {
    pub fn total_pages(&self) -> i64 {
        self.pagination.total_pages(self.total)
    }
}
