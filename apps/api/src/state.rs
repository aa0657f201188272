use std::sync::Arc;

use primed_application::{AccessAuditService, AccessResolutionService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub audit_service: AccessAuditService,
    pub resolution_service: AccessResolutionService,
    pub audit_api_token: Arc<str>,
}
