pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod geo;
mod http;
mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::{Router, middleware as axum_middleware};
use middleware::{cors_layer, create_rate_limiter, rate_limit_middleware};
use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    db::{PgStore, ReviewStore, SpotStore},
    errors::AppError,
    state::AppState,
};

pub fn create_app(state: AppState, allowed_origins: &[String]) -> Router {
    let rate_limiter = create_rate_limiter();

    http::create_http_routes(state)
        .layer(axum_middleware::from_fn(move |req, next| {
            rate_limit_middleware(rate_limiter.clone(), req, next)
        }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins)),
        )
        .fallback(|| async { "404 Not Found" })
}

pub async fn start_server() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let store = Arc::new(PgStore::connect(&config).await?);
    let reviews: Arc<dyn ReviewStore> = store.clone();
    let spots: Arc<dyn SpotStore> = store;

    let shutdown = CancellationToken::new();
    let state = AppState::new(reviews, spots, config.jwt_secret.clone(), shutdown.clone());
    let app = create_app(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("Spot reviews server running at http://0.0.0.0:{}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down, cancelling background rating refreshes");
    shutdown.cancel();
}
