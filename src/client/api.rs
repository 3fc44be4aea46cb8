use crate::client::error::ClientError;
use crate::client::session::Session;
use crate::domain::bookmark::{Bookmark, BookmarkInput};
use crate::domain::payload::{
    AuthSession, BookmarkEnvelope, BookmarkList, ErrorBody, ListParams, MessageBody, UserEnvelope,
};
use crate::domain::user::{CreateUser, LoginRequest, PublicUser};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Typed gateway over `/api`. Every request carries the session's bearer
/// token; any 401 clears the session before the error reaches the caller.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self, ClientError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[instrument(skip(self, payload), fields(username = %payload.username))]
    pub async fn register(&self, payload: &CreateUser) -> Result<AuthSession, ClientError> {
        let session: AuthSession = self
            .send(self.request(Method::POST, "/auth/register").await.json(payload))
            .await?;
        self.session
            .activate(session.token.clone(), session.user.clone())
            .await?;
        Ok(session)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthSession, ClientError> {
        let session: AuthSession = self
            .send(self.request(Method::POST, "/auth/login").await.json(payload))
            .await?;
        self.session
            .activate(session.token.clone(), session.user.clone())
            .await?;
        Ok(session)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.session.clear().await
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let envelope: UserEnvelope = self.send(self.request(Method::GET, "/auth/me").await).await?;
        Ok(envelope.user)
    }

    #[instrument(skip(self))]
    pub async fn list_bookmarks(&self, params: &ListParams) -> Result<BookmarkList, ClientError> {
        self.send(self.request(Method::GET, "/bookmarks").await.query(params))
            .await
    }

    pub async fn get_bookmark(&self, id: i64) -> Result<Bookmark, ClientError> {
        self.send(self.request(Method::GET, &format!("/bookmarks/{id}")).await)
            .await
    }

    #[instrument(skip(self, input))]
    pub async fn create_bookmark(&self, input: &BookmarkInput) -> Result<Bookmark, ClientError> {
        let envelope: BookmarkEnvelope = self
            .send(self.request(Method::POST, "/bookmarks").await.json(input))
            .await?;
        Ok(envelope.bookmark)
    }

    #[instrument(skip(self, input))]
    pub async fn update_bookmark(
        &self,
        id: i64,
        input: &BookmarkInput,
    ) -> Result<Bookmark, ClientError> {
        let envelope: BookmarkEnvelope = self
            .send(
                self.request(Method::PUT, &format!("/bookmarks/{id}"))
                    .await
                    .json(input),
            )
            .await?;
        Ok(envelope.bookmark)
    }

    #[instrument(skip(self))]
    pub async fn delete_bookmark(&self, id: i64) -> Result<String, ClientError> {
        let body: MessageBody = self
            .send(self.request(Method::DELETE, &format!("/bookmarks/{id}")).await)
            .await?;
        Ok(body.message)
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let resp = builder.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, resp: Response) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let body = read_error_body(resp).await;
        if status == StatusCode::UNAUTHORIZED {
            warn!(message = %body.message, "Unauthorized response, clearing session");
            self.session.clear().await?;
            return Err(ClientError::Unauthorized(body.message));
        }

        debug!(status = status.as_u16(), message = %body.message, "Request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message: body.message,
            errors: body.errors,
        })
    }
}

// Bodies that are not our JSON error shape still yield an error, just without a message.
async fn read_error_body(resp: Response) -> ErrorBody {
    match resp.json::<ErrorBody>().await {
        Ok(body) => body,
        Err(_) => ErrorBody {
            message: String::new(),
            errors: Vec::new(),
        },
    }
}

