//! Client-side session: the bearer token and the user it belongs to, kept in
//! durable storage between runs.
//!
//! Lifecycle: `Uninitialized` until [`Session::restore`] reads the store, then
//! `Active` while a token is held, `Cleared` after logout or an unauthorized
//! response.

use crate::client::error::ClientError;
use crate::domain::user::PublicUser;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub user: Option<PublicUser>,
}

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file, readable only by the owner on unix.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupted session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path.display())),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredSession>>,
}

impl MemoryTokenStore {
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        let slot = self.slot.lock().map_err(|_| anyhow::anyhow!("session store poisoned"))?;
        Ok(slot.clone())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|_| anyhow::anyhow!("session store poisoned"))?;
        *slot = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|_| anyhow::anyhow!("session store poisoned"))?;
        *slot = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Cleared,
}

struct SessionState {
    phase: SessionPhase,
    current: Option<StoredSession>,
}

pub struct Session {
    store: Box<dyn TokenStore>,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            state: RwLock::new(SessionState {
                phase: SessionPhase::Uninitialized,
                current: None,
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::default())
    }

    /// Loads whatever the store holds. Returns the token, if any.
    pub async fn restore(&self) -> Result<Option<String>, ClientError> {
        let stored = self.store.load()?;
        let mut state = self.state.write().await;
        state.phase = if stored.is_some() {
            SessionPhase::Active
        } else {
            SessionPhase::Cleared
        };
        let token = stored.as_ref().map(|s| s.token.clone());
        state.current = stored;
        debug!(phase = ?state.phase, "Session restored");
        Ok(token)
    }

    pub async fn activate(&self, token: String, user: PublicUser) -> Result<(), ClientError> {
        let session = StoredSession {
            token,
            user: Some(user),
        };
        self.store.save(&session)?;
        let mut state = self.state.write().await;
        state.phase = SessionPhase::Active;
        state.current = Some(session);
        Ok(())
    }

    /// Forgets the token in memory even if the store cannot be cleared.
    pub async fn clear(&self) -> Result<(), ClientError> {
        {
            let mut state = self.state.write().await;
            state.phase = SessionPhase::Cleared;
            state.current = None;
        }
        self.store.clear()?;
        debug!("Session cleared");
        Ok(())
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.current.as_ref().map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<PublicUser> {
        self.state
            .read()
            .await
            .current
            .as_ref()
            .and_then(|s| s.user.clone())
    }
}
