use crate::client::{ApiClient, ClientError, SessionPhase};
use crate::domain::user::{CreateUser, LoginRequest, PublicUser};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Dashboard,
}

impl View {
    pub fn is_protected(self) -> bool {
        matches!(self, View::Dashboard)
    }
}

/// Who is signed in. Starts out loading and makes no routing decision until
/// [`AuthState::init`] has resolved the stored token.
pub struct AuthState {
    client: ApiClient,
    user: Option<PublicUser>,
    loading: bool,
}

impl AuthState {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            user: None,
            loading: true,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub async fn init(&mut self) {
        match self.client.session().restore().await {
            Ok(Some(_)) => match self.client.me().await {
                Ok(user) => self.user = Some(user),
                Err(e) => warn!(error = %e, "Failed to load user"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read stored session"),
        }
        self.loading = false;
    }

    /// The view to show for `requested`, or `None` while still loading.
    /// Protected views send anonymous users to login; public views send
    /// signed-in users to the dashboard.
    pub fn resolve(&self, requested: View) -> Option<View> {
        if self.loading {
            return None;
        }
        let view = match (requested.is_protected(), self.user.is_some()) {
            (true, false) => View::Login,
            (false, true) => View::Dashboard,
            _ => requested,
        };
        Some(view)
    }

    /// `identifier` is treated as an email when it contains `@`.
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<(), ClientError> {
        let request = if identifier.contains('@') {
            LoginRequest::with_email(identifier, password)
        } else {
            LoginRequest::with_username(identifier, password)
        };
        let session = self.client.login(&request).await?;
        info!(user_id = session.user.id, "Signed in");
        self.user = Some(session.user);
        Ok(())
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let payload = CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = self.client.register(&payload).await?;
        info!(user_id = session.user.id, "Registered");
        self.user = Some(session.user);
        Ok(())
    }

    pub async fn logout(&mut self) {
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.user = None;
    }

    /// Drops the user once the session was cleared elsewhere, e.g. by a 401.
    pub async fn sync_session(&mut self) {
        if self.client.session().phase().await != SessionPhase::Active {
            self.user = None;
        }
    }
}
