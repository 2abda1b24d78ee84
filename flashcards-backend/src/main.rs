use actix_files::Files;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{guard, web, App, HttpServer};
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod controllers;
mod db;
mod error;
mod middleware;
mod models;
mod session;
mod templates;

use config::Config;
use db::Database;
use middleware::MethodOverride;
use session::SessionStore;
use templates::{MiniJinjaEngine, TemplateEngine};

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    /// Flash-message sessions, keyed by cookie token
    pub sessions: Arc<SessionStore>,
    pub templates: Arc<dyn TemplateEngine>,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        let sessions = Arc::new(SessionStore::from_config(&config.session));
        Self {
            db,
            config,
            sessions,
            templates: Arc::new(MiniJinjaEngine::new()),
        }
    }

    /// Fresh state over an empty in-memory database
    #[cfg(test)]
    pub fn for_tests() -> web::Data<Self> {
        let config = Config::for_tests();
        let db = Database::new(&config.database_url).expect("in-memory database");
        web::Data::new(Self::new(Arc::new(db), config))
    }
}

/// Assemble the application: middleware, routes, static files and fallbacks.
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let public_dir = state.config.public_dir.clone();

    let mut app = App::new()
        .app_data(state)
        .wrap(
            ErrorHandlers::new()
                .handler(StatusCode::INTERNAL_SERVER_ERROR, controllers::errors::render_500),
        )
        .wrap(MethodOverride)
        .wrap(Logger::default())
        .configure(controllers::health::config_routes)
        .configure(controllers::cards::config)
        .default_service(web::to(controllers::errors::not_found));

    // Serve static files only if the public directory exists
    if Path::new(&public_dir).is_dir() {
        app = app.service(
            Files::new("/", public_dir)
                // Other methods fall through to the 404 page instead of a 405
                .guard(guard::Any(guard::Get()).or(guard::Head()))
                .default_handler(web::to(controllers::errors::not_found)),
        );
    } else {
        log::warn!("Public directory {} not found, static files disabled", public_dir);
    }

    app
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Flashcards v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = match Database::new(&config.database_url) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to initialize database: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    if config.seed_database {
        match db.seed_if_empty() {
            Ok(summary) => log::info!(
                "Seeded {} tag(s) and {} card(s)",
                summary.tags,
                summary.cards
            ),
            Err(e) => log::error!("Failed to seed database: {}", e),
        }
    }

    let state = web::Data::new(AppState::new(Arc::clone(&db), config));

    let sweep_interval = Duration::from_secs(state.config.session.sweep_interval_secs);
    let sweeper = state.sessions.start_background_sweeper(sweep_interval);

    log::info!("Starting server on 0.0.0.0:{}", port);

    let app_state = state.clone();
    let server = HttpServer::new(move || build_app(app_state.clone()))
        .bind(("0.0.0.0", port))?
        .run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    // Spawn Ctrl+C handler
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        sweeper.abort();
        log::info!("Dropping {} active session(s)", state.sessions.len());

        // Stop the HTTP server with timeout
        log::info!("Stopping HTTP server...");
        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(Duration::from_secs(5), server_stop).await.is_err() {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }

        log::info!("Shutdown complete");
    });

    server.await
}
