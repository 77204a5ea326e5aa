//! HTTP server
//!
//! Assembles the router (all API modules, auth middleware, static uploads,
//! tower-http layers) and serves it.

use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{BoxError, Config, ServerState};
use crate::api;
use crate::auth::require_auth;

/// All API routers, before state and layers are applied
pub fn api_routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(api::health::router())
        .merge(api::auth::router())
        .merge(api::upload::router())
        // Catalog
        .merge(api::products::router())
        .merge(api::categories::router())
        .merge(api::brands::router())
        // Shopping
        .merge(api::cart::router())
        .merge(api::coupons::router())
        .merge(api::orders::router())
        .merge(api::wishlist::router())
        .merge(api::reviews::router())
        .merge(api::testimonials::router())
        // Back office
        .merge(api::suppliers::router())
        .merge(api::purchases::router())
        .merge(api::sales::router())
        .merge(api::site_settings::router())
        .merge(api::analytics::router())
}

/// Build the complete application with state and middleware
pub fn build_app(state: ServerState) -> Router {
    let cors = cors_layer(&state.config);
    let uploads = ServeDir::new(state.upload_dir());

    api_routes()
        // require_auth 内部跳过公共路由
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origin) = config.cors_origin.as_deref() else {
        return CorsLayer::permissive();
    };
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
        Err(e) => {
            tracing::warn!(origin, error = %e, "Invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        }
    }
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), BoxError> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let app = build_app(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("shop-server listening on {addr} (env: {})", self.config.environment);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("shop-server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}
