use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use primed_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let audit_routes = Router::new()
        .route("/api/audits", get(handlers::audits::list_audits_handler))
        .route(
            "/api/audits/{audit}",
            get(handlers::audits::run_audit_handler),
        )
        .route(
            "/api/audits/{audit}/{entity}",
            get(handlers::audits::run_entity_audit_handler),
        )
        .route(
            "/api/audits/{audit}/{entity}/resolve",
            post(handlers::audits::resolve_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_audit_token,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(audit_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
