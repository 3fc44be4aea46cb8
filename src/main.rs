use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use bookmark_saver::data::database;
use bookmark_saver::infrastructure::config::AppConfig;
use bookmark_saver::infrastructure::logging::init_logging;
use bookmark_saver::infrastructure::security::TokenSigner;
use bookmark_saver::presentation::handlers::AppState;
use bookmark_saver::presentation::middleware::{
    JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware,
};
use bookmark_saver::presentation::routes;
use dotenv::dotenv;
use tracing::{info, instrument};

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();
    info!("Logging initialized successfully");

    let config = AppConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        database_url = %config.database_url,
        "Configuration loaded"
    );

    let pool = database::connect(&config.database_url, config.database_max_connections).await?;
    info!("Database ready");

    let tokens = TokenSigner::new(config.jwt_secret.clone(), config.jwt_ttl_secs);
    let state = web::Data::new(AppState::new(pool, tokens));
    info!("Application state initialized");

    let cors_origin = config.cors_origin.clone();
    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers(vec!["x-request-id", "x-response-time"])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware)
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(cors)
            .configure(routes::configure)
    });

    let bind_addr = config.bind_addr();
    info!(host = %bind_addr.0, port = bind_addr.1, "Binding server to address");
    let server = server.bind(bind_addr)?;

    info!(
        routes = %"GET /api/health, POST /api/auth/register, POST /api/auth/login, GET /api/auth/me, GET|POST /api/bookmarks, GET|PUT|DELETE /api/bookmarks/{id}",
        "Starting HTTP server"
    );
    server.run().await?;
    Ok(())
}
