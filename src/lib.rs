//! HomeFeed - API server for a home-decor posting site
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /postings, /comments, /users                             │
//! │  - Identity extractors (CurrentUser / MaybeUser)            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Feed planner + aggregator                                │
//! │  - Posting detail, likes, comments, accounts                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - R2 storage, OAuth provider, mail                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database layer
//! - `storage`: Cloudflare R2 image storage
//! - `auth`: Self tokens, identity resolution, OAuth provider
//! - `mail`: Best-effort outbound mail
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod mail;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; every member is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Self-token issuer/verifier
    pub token_codec: Arc<auth::TokenCodec>,

    /// Posting image storage
    pub storage: Arc<dyn storage::ObjectStore>,

    /// OAuth provider used at sign-in
    pub oauth: Arc<dyn auth::OAuthProvider>,

    /// Welcome mail sender
    pub mailer: Arc<dyn mail::Mailer>,
}

impl AppState {
    /// Initialize application state with production collaborators
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Connect to R2 storage
    /// 3. Build the OAuth client and mailer
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        let storage = storage::MediaStorage::new(&config.storage.media, &config.cloudflare).await?;
        tracing::info!("Media storage initialized");

        let oauth = auth::KakaoClient::new(&config.oauth.kakao)?;
        let mailer = mail::LogMailer::new(&config.mail);

        tracing::info!("Application state initialized successfully");

        Ok(Self::with_services(
            config,
            Arc::new(db),
            Arc::new(storage),
            Arc::new(oauth),
            Arc::new(mailer),
        ))
    }

    /// Assemble state from already-built collaborators
    pub fn with_services(
        config: config::AppConfig,
        db: Arc<data::Database>,
        storage: Arc<dyn storage::ObjectStore>,
        oauth: Arc<dyn auth::OAuthProvider>,
        mailer: Arc<dyn mail::Mailer>,
    ) -> Self {
        let token_codec = Arc::new(auth::TokenCodec::new(&config.auth.token_secret));

        Self {
            config: Arc::new(config),
            db,
            token_codec,
            storage,
            oauth,
            mailer,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::postings_router())
        .merge(api::comments_router())
        .merge(api::users_router())
        .route_layer(axum::middleware::from_fn(api::track_http_requests))
        .layer(RequestBodyLimitLayer::new(api::MAX_IMAGE_UPLOAD_BYTES + 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    let Some(allowed_origin) = server.allowed_origin.as_deref() else {
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
