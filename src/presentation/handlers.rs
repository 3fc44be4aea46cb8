use crate::application::auth_service::AuthService;
use crate::application::bookmark_service::BookmarkService;
use crate::data::bookmark_repository::SqliteBookmarkRepository;
use crate::data::user_repository::SqliteUserRepository;
use crate::domain::bookmark::{BookmarkFilter, BookmarkInput, Pagination};
use crate::domain::error::{DomainError, FieldError, join_messages};
use crate::domain::payload::{BookmarkEnvelope, BookmarkList, ErrorBody, ListParams, MessageBody};
use crate::infrastructure::security::TokenSigner;
use crate::presentation::middleware::{AuthenticatedUser, TokenRejection};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::future::{Ready, ready};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub struct AppState {
    pub bookmarks: BookmarkService<SqliteBookmarkRepository>,
    pub auth: AuthService<SqliteUserRepository>,
}

impl AppState {
    pub fn new(pool: SqlitePool, tokens: TokenSigner) -> Self {
        Self {
            bookmarks: BookmarkService::new(Arc::new(SqliteBookmarkRepository::new(pool.clone()))),
            auth: AuthService::new(Arc::new(SqliteUserRepository::new(pool)), tokens),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        let body = match self {
            ApiError::Validation { message, errors } => {
                warn!(error = %error_msg, status = %status, "Validation error");
                ErrorBody {
                    message: message.clone(),
                    errors: errors.clone(),
                }
            }
            ApiError::NotFound(msg) => {
                warn!(error = %error_msg, status = %status, "Resource not found");
                ErrorBody {
                    message: msg.clone(),
                    errors: Vec::new(),
                }
            }
            ApiError::Unauthorized(msg) => {
                warn!(error = %error_msg, status = %status, "Unauthorized");
                ErrorBody {
                    message: msg.clone(),
                    errors: Vec::new(),
                }
            }
            // Detail stays in the log.
            ApiError::Internal(_) => {
                error!(error = %error_msg, status = %status, "Internal error");
                ErrorBody {
                    message: "Server error".to_string(),
                    errors: Vec::new(),
                }
            }
        };

        HttpResponse::build(status).json(body)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::InvalidInput(errors)) => ApiError::Validation {
                message: join_messages(errors),
                errors: errors.clone(),
            },
            Some(DomainError::Validation(msg)) => ApiError::validation(msg.clone()),
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

// Protected handlers take this; its absence means the request carried no
// usable bearer token.
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let extensions = req.extensions();
        let result = match extensions.get::<AuthenticatedUser>() {
            Some(user) => Ok(*user),
            None => Err(ApiError::Unauthorized(
                extensions
                    .get::<TokenRejection>()
                    .map(|r| r.0.clone())
                    .unwrap_or_else(|| "No token, authorization denied".to_string()),
            )),
        };
        ready(result)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

#[instrument(skip(state, query), fields(user_id = user.user_id))]
pub async fn list_bookmarks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let pagination = Pagination::new(query.page, query.limit).map_err(anyhow::Error::from)?;
    let filter = BookmarkFilter::new(query.search, query.tag);

    let page = state
        .bookmarks
        .list(user.user_id, filter, pagination)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list bookmarks");
            e
        })?;

    info!(
        returned = page.items.len(),
        total = page.total,
        page = pagination.page,
        "Bookmarks listed"
    );
    Ok(HttpResponse::Ok().json(BookmarkList::from(page)))
}

#[instrument(skip(state), fields(user_id = user.user_id, bookmark_id = %*path))]
pub async fn get_bookmark(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let bookmark = state.bookmarks.get(user.user_id, id).await?;
    Ok(HttpResponse::Ok().json(bookmark))
}

#[instrument(skip(state, req), fields(user_id = user.user_id, bookmark_id))]
pub async fn create_bookmark(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<BookmarkInput>,
) -> Result<HttpResponse, ApiError> {
    info!(url = %req.url, "Creating bookmark");
    let bookmark = state
        .bookmarks
        .create(user.user_id, req.into_inner())
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create bookmark");
            e
        })?;
    tracing::Span::current().record("bookmark_id", bookmark.id);
    Ok(HttpResponse::Created().json(BookmarkEnvelope {
        message: "Bookmark created successfully".to_string(),
        bookmark,
    }))
}

#[instrument(skip(state, req), fields(user_id = user.user_id, bookmark_id = %*path))]
pub async fn update_bookmark(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<BookmarkInput>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let bookmark = state
        .bookmarks
        .update(user.user_id, id, req.into_inner())
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to update bookmark");
            e
        })?;
    Ok(HttpResponse::Ok().json(BookmarkEnvelope {
        message: "Bookmark updated successfully".to_string(),
        bookmark,
    }))
}

#[instrument(skip(state), fields(user_id = user.user_id, bookmark_id = %*path))]
pub async fn delete_bookmark(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.bookmarks.delete(user.user_id, id).await?;
    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Bookmark deleted successfully".to_string(),
    }))
}
