use crate::domain::payload::UserEnvelope;
use crate::domain::user::{CreateUser, LoginRequest};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use tracing::{info, instrument, warn};

#[instrument(skip(state, req))]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    info!(username = %req.username, email = %req.email, "Registration request received");

    let session = state.auth.register(req.into_inner()).await.map_err(|e| {
        warn!(error = %e, "Failed to register user");
        ApiError::from(e)
    })?;

    info!(user_id = session.user.id, "User registered successfully");
    Ok(HttpResponse::Created().json(session))
}

#[instrument(skip(state, req))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let session = state.auth.login(req.into_inner()).await.map_err(|e| {
        warn!(error = %e, "Failed to login");
        ApiError::from(e)
    })?;

    info!(user_id = session.user.id, "Login successful");
    Ok(HttpResponse::Ok().json(session))
}

#[instrument(skip(state), fields(user_id = user.user_id))]
pub async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let user = state.auth.current_user(user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserEnvelope { user }))
}
