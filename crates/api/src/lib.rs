//! # MentorMeet API
//!
//! The API crate provides the web server implementation for the MentorMeet
//! scheduling service. It defines RESTful endpoints for declaring
//! availability slots and driving the meeting lifecycle between students and
//! alumni.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Provide cross-cutting concerns like principal extraction and error handling
//! - **Provisioner**: Background enrichment of accepted meetings with join links
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database interactions.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for principal extraction and error handling
pub mod middleware;
/// Asynchronous join-link provisioning
pub mod provisioner;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use provisioner::{LinkProvisioner, StaticLinkProvisioner};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
///
/// This struct encapsulates dependencies that are shared across the
/// application: the database connection pool and the link provisioner with
/// its retry policy.
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// External calendar/meet integration
    pub provisioner: Arc<dyn LinkProvisioner>,
    /// Per-attempt provisioning timeout, in seconds
    pub provisioner_timeout: u64,
    /// Provisioning retry budget
    pub provisioner_retries: u32,
}

/// Builds the application router over the given state.
///
/// Split out of [`start_server`] so tests can drive the exact production
/// routing without binding a socket.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Availability slot endpoints
        .merge(routes::slot::routes())
        // Meeting lifecycle endpoints
        .merge(routes::meeting::routes())
        // Attach shared state to all routes
        .with_state(state)
}

/// Starts the API server with the provided configuration and database connection
///
/// This function initializes the application, sets up logging, configures
/// routes, and starts the HTTP server.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        provisioner: Arc::new(StaticLinkProvisioner::new(&config.provisioner_base_url)),
        provisioner_timeout: config.provisioner_timeout,
        provisioner_retries: config.provisioner_retries,
    });

    // Build the application router with all routes
    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect::<Vec<_>>();
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
                axum::http::HeaderName::from_static(middleware::auth::USER_ID_HEADER),
                axum::http::HeaderName::from_static(middleware::auth::USER_ROLE_HEADER),
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
