//! Route configuration and setup

use crate::auth::{auth_middleware, AuthState};
use crate::handlers::{clusters, file_delete, file_get, file_upload, health};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use sharedfiles_core::Config;
use sharedfiles_infra::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and the extra form fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth = axum::middleware::from_fn_with_state(
        Arc::new(AuthState {
            token: config.authorization_token.clone(),
        }),
        auth_middleware,
    );

    let body_limit = usize::try_from(
        config
            .max_file_size_bytes
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    let files = Router::new()
        .route("/files", get(file_get::list_files))
        .route("/files/", get(file_get::list_files))
        .route(
            "/files/upload",
            post(file_upload::upload_file).route_layer(auth.clone()),
        )
        .route(
            "/files/clusters",
            get(clusters::cluster_status).route_layer(auth.clone()),
        )
        .route(
            "/files/{file_id}",
            get(file_get::get_file).merge(delete(file_delete::delete_file).route_layer(auth)),
        );

    let app = files
        .route("/health", get(health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(axum::middleware::from_fn(security_headers_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::disable())
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state);

    tracing::info!(
        max_file_size_bytes = config.max_file_size_bytes,
        "Routes configured"
    );

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
