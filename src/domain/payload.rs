//! JSON bodies exchanged over `/api`, shared by the server handlers and the client.

use crate::domain::bookmark::{Bookmark, BookmarkPage};
use crate::domain::error::FieldError;
use crate::domain::user::PublicUser;
use serde::{Deserialize, Serialize};

/// Query string of `GET /api/bookmarks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkList {
    pub bookmarks: Vec<Bookmark>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_bookmarks: i64,
}

impl From<BookmarkPage> for BookmarkList {
    fn from(page: BookmarkPage) -> Self {
        Self {
            total_pages: page.total_pages(),
            current_page: page.pagination.page,
            total_bookmarks: page.total,
            bookmarks: page.items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkEnvelope {
    pub message: String,
    pub bookmark: Bookmark,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// Uniform failure body; `errors` is only present for field validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}
