//! updown-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use updown_api::{AppState, StaticTokenAuth, router as api_router};
use updown_common::{Config, IdGenerator};
use updown_core::{FeedbackCatalog, KindRegistry, VoteService};
use updown_db::repositories::VoteRepository;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "updown=debug,tower_http=debug".into()),
        )
        .init();
}

/// Wire repositories, the catalog, and the vote service into app state.
fn build_state(db: Arc<DatabaseConnection>, config: &Config) -> AppState {
    let vote_repo = VoteRepository::new(db);
    let catalog = FeedbackCatalog::new(config.voting.feedback_options.clone());
    let directory = Arc::new(KindRegistry::from_config(&config.voting));
    let vote_service = VoteService::new(vote_repo, directory, catalog.clone())
        .with_id_generator(IdGenerator::new(config.database.id_format));

    AppState {
        vote_service,
        catalog,
        authenticator: Arc::new(StaticTokenAuth::new(config.api.admin_token.clone())),
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            updown_api::middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(updown_api::middleware::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Waits for SIGINT or SIGTERM (Ctrl+C only on non-Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Starting updown-rs server...");

    let config = Config::load()?;

    let db = updown_db::init(&config).await?;
    info!("Connected to database");

    updown_db::migrate(&db).await?;
    info!("Migrations up to date");

    let state = build_state(Arc::new(db), &config);
    let app = build_router(state);

    let addr: SocketAddr =
        format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
