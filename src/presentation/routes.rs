use crate::presentation::auth::{login, me, register};
use crate::presentation::handlers::{
    ApiError, create_bookmark, delete_bookmark, get_bookmark, health_check, list_bookmarks,
    update_bookmark,
};
use actix_web::web;

/// Mounts every `/api` route. Bookmark and `/auth/me` routes expect
/// `JwtAuthMiddleware` to be wrapped around the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check))
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(register))
                        .route("/login", web::post().to(login))
                        .route("/me", web::get().to(me)),
                )
                .service(
                    web::scope("/bookmarks")
                        .app_data(path_config())
                        .route("", web::get().to(list_bookmarks))
                        .route("", web::post().to(create_bookmark))
                        .route("/{id}", web::get().to(get_bookmark))
                        .route("/{id}", web::put().to(update_bookmark))
                        .route("/{id}", web::delete().to(delete_bookmark)),
                ),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::validation(format!("Invalid request body: {err}")).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::validation(format!("Invalid query parameters: {err}")).into()
    })
}

// Ids are integers, so a non-numeric id names no bookmark.
fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| ApiError::NotFound("Bookmark not found".to_string()).into())
}
