use crate::client::{ApiClient, ClientError};
use crate::domain::bookmark::Bookmark;
use crate::domain::payload::ListParams;
use crate::ui::form::BookmarkForm;
use tracing::{debug, warn};

pub const PAGE_SIZE: i64 = 10;

/// List, search and edit state of the signed-in user's bookmarks.
///
/// Mutations never patch `bookmarks` locally: after the server confirms a
/// create, update or delete the current page is fetched again.
pub struct Dashboard {
    client: ApiClient,
    current_page: i64,
    search_term: String,
    bookmarks: Vec<Bookmark>,
    total_pages: i64,
    total_bookmarks: i64,
    form: Option<BookmarkForm>,
    error: Option<String>,
    loading: bool,
    session_expired: bool,
}

impl Dashboard {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            current_page: 1,
            search_term: String::new(),
            bookmarks: Vec::new(),
            total_pages: 1,
            total_bookmarks: 0,
            form: None,
            error: None,
            loading: true,
            session_expired: false,
        }
    }

    pub fn current_page(&self) -> i64 {
        self.current_page
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    pub fn total_bookmarks(&self) -> i64 {
        self.total_bookmarks
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Set once the server rejected the token; the owner should route to login.
    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    pub fn show_form(&self) -> bool {
        self.form.is_some()
    }

    pub fn editing(&self) -> Option<i64> {
        self.form.as_ref().and_then(BookmarkForm::editing)
    }

    pub fn form(&self) -> Option<&BookmarkForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut BookmarkForm> {
        self.form.as_mut()
    }

    pub fn can_go_back(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub async fn refresh(&mut self) {
        self.loading = true;
        let search = self.search_term.trim();
        let params = ListParams {
            page: Some(self.current_page),
            limit: Some(PAGE_SIZE),
            search: (!search.is_empty()).then(|| search.to_string()),
            tag: None,
        };

        match self.client.list_bookmarks(&params).await {
            Ok(list) => {
                debug!(
                    page = list.current_page,
                    total = list.total_bookmarks,
                    "Bookmarks fetched"
                );
                self.bookmarks = list.bookmarks;
                self.total_pages = list.total_pages;
                self.total_bookmarks = list.total_bookmarks;
            }
            Err(e) => self.record_failure(&e, "Failed to fetch bookmarks"),
        }
        self.loading = false;
    }

    /// A new search always starts again from the first page.
    pub async fn search(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.current_page = 1;
        self.refresh().await;
    }

    pub async fn next_page(&mut self) {
        if self.can_go_forward() {
            self.current_page += 1;
            self.refresh().await;
        }
    }

    pub async fn previous_page(&mut self) {
        if self.can_go_back() {
            self.current_page -= 1;
            self.refresh().await;
        }
    }

    pub fn open_form(&mut self) {
        if self.form.is_none() {
            self.form = Some(BookmarkForm::new());
        }
    }

    pub fn edit(&mut self, bookmark: &Bookmark) {
        self.form = Some(BookmarkForm::for_bookmark(bookmark));
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
    }

    /// Sends the open form as a create or an update. On failure the form stays
    /// open carrying the server's message.
    pub async fn submit(&mut self) -> Result<Bookmark, ClientError> {
        let Some(form) = self.form.as_mut() else {
            return Err(ClientError::NoOpenForm);
        };
        let editing = form.editing();
        let input = form.begin_submit();

        let result = match editing {
            Some(id) => self.client.update_bookmark(id, &input).await,
            None => self.client.create_bookmark(&input).await,
        };

        match result {
            Ok(bookmark) => {
                self.form = None;
                self.error = None;
                self.refresh().await;
                Ok(bookmark)
            }
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.finish_submit(Err(&e));
                }
                let context = if editing.is_some() {
                    "Failed to update bookmark"
                } else {
                    "Failed to create bookmark"
                };
                self.record_failure(&e, context);
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ClientError> {
        match self.client.delete_bookmark(id).await {
            Ok(_) => {
                // Deleting the only row of the last page would leave us past the end.
                if self.bookmarks.len() == 1 && self.current_page > 1 {
                    self.current_page -= 1;
                }
                self.error = None;
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e, "Failed to delete bookmark");
                Err(e)
            }
        }
    }

    fn record_failure(&mut self, err: &ClientError, context: &str) {
        warn!(error = %err, "{}", context);
        if err.is_unauthorized() {
            self.session_expired = true;
            self.bookmarks.clear();
            self.form = None;
        }
        self.error = Some(context.to_string());
    }
}
