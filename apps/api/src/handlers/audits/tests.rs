use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use primed_application::{
    AccessAuditService, AccessResolutionService, AuditContext, AuditSettings,
};
use primed_core::{AppError, AppResult};
use primed_infrastructure::InMemoryGovernanceStore;
use serde_json::json;

use super::{list_audits_handler, resolve_handler, run_audit_handler, run_entity_audit_handler};
use crate::dto::{AuditQuery, ResolveRequest};
use crate::state::AppState;

const ALICE: &str = "0b6f9a3c-1c0e-4d0b-8f1e-7a1d5c2e9b01";
const ALICE_ACCOUNT: &str = "0b6f9a3c-1c0e-4d0b-8f1e-7a1d5c2e9b02";
const ACCESS_GROUP: &str = "0b6f9a3c-1c0e-4d0b-8f1e-7a1d5c2e9b03";
const AGREEMENT: &str = "0b6f9a3c-1c0e-4d0b-8f1e-7a1d5c2e9b04";

fn app_state() -> AppResult<AppState> {
    let export = json!({
        "users": [{ "id": ALICE, "username": "alice@example.org", "name": "Alice" }],
        "accounts": [{ "id": ALICE_ACCOUNT, "email": "alice@example.org", "user_id": ALICE }],
        "groups": [{ "id": ACCESS_GROUP, "name": "PRIMED_CDSA_ACCESS_1001" }],
        "signed_agreements": [{
            "id": AGREEMENT,
            "cc_id": 1001,
            "representative": ALICE,
            "version": "v1.0",
            "is_primary": true,
            "status": "active",
            "agreement_type": { "type": "member", "study_site": "UCSD" },
            "accessors": [ALICE],
            "access_group": ACCESS_GROUP
        }]
    });
    let store = Arc::new(InMemoryGovernanceStore::from_json(&export.to_string())?);
    let audit_service = AccessAuditService::new(AuditContext::new(
        store.clone(),
        store.clone(),
        AuditSettings::default(),
    ));

    Ok(AppState {
        resolution_service: AccessResolutionService::new(audit_service.clone(), store),
        audit_service,
        audit_api_token: Arc::from("0123456789abcdef0123456789abcdef"),
    })
}

#[tokio::test]
async fn lists_every_audit_kind() {
    let Json(kinds) = list_audits_handler().await;
    let slugs: Vec<&str> = kinds.iter().map(|kind| kind.slug.as_str()).collect();
    assert!(slugs.contains(&"accessors"));
    assert!(slugs.contains(&"dbgap-access"));
    assert_eq!(kinds.len(), 6);
}

#[tokio::test]
async fn full_audit_reports_missing_access() -> AppResult<()> {
    let response = run_audit_handler(State(app_state()?), Path("accessors".to_owned()))
        .await
        .map_err(|error| error.0)?;

    let Json(audit) = response;
    assert_eq!(audit.audit, "AccessorAudit");
    assert!(!audit.ok);
    assert_eq!(audit.needs_action.rows.len(), 1);
    assert_eq!(
        audit.needs_action.columns,
        ["signed_agreement", "user", "member"]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_audit_is_not_found() -> AppResult<()> {
    let response = run_audit_handler(State(app_state()?), Path("nonsense".to_owned())).await;

    assert!(matches!(response, Err(error) if matches!(error.0, AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn entity_audit_honours_member_filter() -> AppResult<()> {
    let response = run_entity_audit_handler(
        State(app_state()?),
        Path(("accessors".to_owned(), "1001".to_owned())),
        Query(AuditQuery {
            member: Some("alice@example.org".to_owned()),
        }),
    )
    .await
    .map_err(|error| error.0)?;

    let Json(audit) = response;
    let row = audit.needs_action.rows.first();
    assert_eq!(row.and_then(|row| row.action.as_deref()), Some("Grant access"));
    Ok(())
}

#[tokio::test]
async fn resolve_applies_grant_then_audit_is_clean() -> AppResult<()> {
    let state = app_state()?;

    let Json(outcome) = resolve_handler(
        State(state.clone()),
        Path(("accessors".to_owned(), "1001".to_owned())),
        Json(ResolveRequest {
            member: Some("alice@example.org".to_owned()),
        }),
    )
    .await
    .map_err(|error| error.0)?;
    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes.first().map(|change| change.operation), Some("add"));

    let Json(audit) = run_audit_handler(State(state), Path("accessors".to_owned()))
        .await
        .map_err(|error| error.0)?;
    assert!(audit.ok);
    Ok(())
}
