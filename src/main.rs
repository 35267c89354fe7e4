use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use http::{header, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod auth {
    pub mod blacklist;
    pub mod password_version;
    pub mod token;
}

mod models {
    pub mod collections;
    pub mod travel_document;
    pub mod trip;
    pub mod user;
}

mod repositories {
    pub mod collections;
    pub mod travel_document;
    pub mod trip;
    pub mod user;
}

mod backup {
    pub mod document;
    pub mod export;
    pub mod integrity;
    pub mod restore;
}

mod services {
    pub mod auth;
    pub mod backup;
    pub mod travel_documents;
}

mod handlers {
    pub mod auth;
    pub mod backup;
    pub mod travel_documents;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod auth;
}

use config::Config;
use state::AppState;

/// Requests other than a restore never carry a large body.
const GLOBAL_BODY_LIMIT: usize = 2 * 1024 * 1024;
/// Restore uploads carry a whole account's backup in one JSON document.
const RESTORE_BODY_LIMIT: usize = 64 * 1024 * 1024;
/// How often the token blacklist drops expired entries.
const BLACKLIST_SWEEP_PERIOD: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let state = AppState::new(&config)?;
    tracing::info!("AppState initialized");

    state
        .token_blacklist
        .start_cleanup_interval(BLACKLIST_SWEEP_PERIOD)
        .await;
    tracing::info!(
        "Token blacklist sweeper started (runs every {}s)",
        BLACKLIST_SWEEP_PERIOD.as_secs()
    );

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(86400));

    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let public_auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(tower_governor::GovernorLayer::new(auth_governor_conf))
        .with_state(state.clone());

    let restore_routes = Router::new()
        .route("/api/backup/restore", post(handlers::backup::restore_backup))
        .route_layer(DefaultBodyLimit::max(RESTORE_BODY_LIMIT))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route("/api/backup/export", get(handlers::backup::export_backup))
        .route(
            "/api/documents",
            get(handlers::travel_documents::list_documents),
        )
        .route(
            "/api/documents",
            post(handlers::travel_documents::create_document),
        )
        .route(
            "/api/documents/{document_id}",
            get(handlers::travel_documents::get_document),
        )
        .route(
            "/api/documents/{document_id}",
            put(handlers::travel_documents::update_document),
        )
        .route(
            "/api/documents/{document_id}",
            delete(handlers::travel_documents::delete_document),
        )
        .route(
            "/api/documents/{document_id}/primary",
            post(handlers::travel_documents::set_primary),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(public_auth_routes)
        .merge(restore_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(GLOBAL_BODY_LIMIT))
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
