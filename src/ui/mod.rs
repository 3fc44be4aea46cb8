pub mod auth_state;
pub mod dashboard;
pub mod form;

pub use auth_state::{AuthState, View};
pub use dashboard::{Dashboard, PAGE_SIZE};
pub use form::BookmarkForm;
