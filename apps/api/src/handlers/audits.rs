use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use primed_application::AuditKind;

use crate::dto::{AuditKindResponse, AuditQuery, AuditResponse, ResolveRequest, ResolveResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audits_handler() -> Json<Vec<AuditKindResponse>> {
    Json(
        AuditKind::ALL
            .into_iter()
            .map(AuditKindResponse::from)
            .collect(),
    )
}

pub async fn run_audit_handler(
    State(state): State<AppState>,
    Path(audit): Path<String>,
) -> ApiResult<Json<AuditResponse>> {
    let kind = AuditKind::from_str(&audit)?;
    let overview = state.audit_service.run_overview(kind, None, None).await?;

    Ok(Json(AuditResponse::from(overview)))
}

/// Runs one audit kind for one entity. Collaborative analysis workspaces are
/// addressed as a percent-encoded `billing_project%2Fname`.
pub async fn run_entity_audit_handler(
    State(state): State<AppState>,
    Path((audit, entity)): Path<(String, String)>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<AuditResponse>> {
    let kind = AuditKind::from_str(&audit)?;
    let overview = state
        .audit_service
        .run_overview(kind, Some(entity.as_str()), query.member.as_deref())
        .await?;

    Ok(Json(AuditResponse::from(overview)))
}

pub async fn resolve_handler(
    State(state): State<AppState>,
    Path((audit, entity)): Path<(String, String)>,
    Json(payload): Json<ResolveRequest>,
) -> ApiResult<Json<ResolveResponse>> {
    let kind = AuditKind::from_str(&audit)?;
    let outcome = state
        .resolution_service
        .resolve(kind, &entity, payload.member.as_deref())
        .await?;

    Ok(Json(ResolveResponse::from(outcome)))
}

#[cfg(test)]
mod tests;
