use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{self, AppState};

/// Path the site's existing front end posts to.
pub const LEGACY_SUBMIT_PATH: &str = "/send_form.php";
/// Versioned alias of the same endpoint.
pub const SUBMIT_PATH: &str = "/api/v1/leads";

/// CORS policy of the submission endpoint: any origin, POST, Content-Type.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Builds the application router.
///
/// The per-IP rate limit needs the peer address, so it is only enabled when
/// the server runs with connect info.
///
/// # Arguments
///
/// * `state` - Shared application state.
/// * `rate_limited` - Whether to put the lead routes behind the governor.
///
/// # Returns
///
/// * `anyhow::Result<Router>` - The router, or an error for an invalid rate limit config.
pub fn build_router(state: Arc<AppState>, rate_limited: bool) -> anyhow::Result<Router> {
    let config = &state.config;

    let mut lead_routes: Router<Arc<AppState>> = Router::new()
        .route(
            LEGACY_SUBMIT_PATH,
            post(handlers::submit_lead).fallback(handlers::method_not_allowed),
        )
        .route(
            SUBMIT_PATH,
            post(handlers::submit_lead).fallback(handlers::method_not_allowed),
        )
        // Request size limit (leads are a handful of short text fields)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes));

    if rate_limited {
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?;

        lead_routes = lead_routes.layer(ServiceBuilder::new().layer(GovernorLayer {
            config: Arc::new(governor_conf),
        }));
    }

    // Plain-text rejections from the layers above become JSON
    lead_routes = lead_routes.layer(middleware::map_response(handlers::json_rejections));

    // Health check bypasses rate limiting
    let mut app: Router<Arc<AppState>> = Router::new()
        .route("/health", get(handlers::health))
        .merge(lead_routes);

    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    Ok(app
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer()))
}
