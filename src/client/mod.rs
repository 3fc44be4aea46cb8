pub mod api;
pub mod error;
pub mod session;

pub use api::ApiClient;
pub use error::ClientError;
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionPhase, TokenStore};
