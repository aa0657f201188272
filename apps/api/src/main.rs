//! PRIMED audit API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use primed_application::{AccessAuditService, AccessResolutionService, AuditContext};
use primed_core::AppError;
use primed_infrastructure::InMemoryGovernanceStore;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let store = Arc::new(InMemoryGovernanceStore::load(&config.data_path).await?);

    let audit_service = AccessAuditService::new(AuditContext::new(
        store.clone(),
        store.clone(),
        config.audit_settings.clone(),
    ));
    let app_state = AppState {
        resolution_service: AccessResolutionService::new(audit_service.clone(), store),
        audit_service,
        audit_api_token: Arc::from(config.audit_api_token.as_str()),
    };

    let app = api_router::build_router(app_state, &config.frontend_url)?;
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "primed-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
