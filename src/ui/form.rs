use crate::client::ClientError;
use crate::domain::bookmark::{Bookmark, BookmarkInput, TagsInput};
use crate::domain::error::join_messages;

pub const SAVE_FALLBACK: &str = "Failed to save bookmark. Please try again.";

/// Add/edit form. Submitting always sends all four fields, so an update is a
/// full replace of whatever the user left in the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkForm {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tag_input: String,
    tags: Vec<String>,
    editing: Option<i64>,
    error: Option<String>,
    submitting: bool,
}

impl BookmarkForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_bookmark(bookmark: &Bookmark) -> Self {
        Self {
            url: bookmark.url.clone(),
            title: bookmark.title.clone(),
            description: bookmark.description.clone().unwrap_or_default(),
            tags: bookmark.tags.clone(),
            editing: Some(bookmark.id),
            ..Self::default()
        }
    }

    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Bookmark"
        } else {
            "Add New Bookmark"
        }
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Adds the trimmed `tag_input`; blank input and tags already present are
    /// ignored and leave `tag_input` untouched.
    pub fn add_tag(&mut self) -> bool {
        let tag = self.tag_input.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        self.tag_input.clear();
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub(crate) fn begin_submit(&mut self) -> BookmarkInput {
        self.error = None;
        self.submitting = true;
        self.to_input()
    }

    pub(crate) fn finish_submit(&mut self, outcome: Result<(), &ClientError>) {
        self.submitting = false;
        if let Err(err) = outcome {
            self.error = Some(failure_message(err));
        }
    }

    pub fn to_input(&self) -> BookmarkInput {
        BookmarkInput {
            url: self.url.clone(),
            title: self.title.clone(),
            description: Some(self.description.clone()),
            tags: Some(TagsInput::List(self.tags.clone())),
        }
    }
}

/// Server message verbatim, else the joined field messages, else a generic fallback.
pub fn failure_message(err: &ClientError) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }
    if let ClientError::Api { errors, .. } = err {
        if !errors.is_empty() {
            return join_messages(errors);
        }
    }
    SAVE_FALLBACK.to_string()
}
