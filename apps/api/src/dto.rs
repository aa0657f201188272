use primed_application::{AuditKind, GroupMember, MembershipChange, ResolutionOutcome};
use primed_domain::{AuditOverview, AuditTable, AuditTableRow};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "api-types/health-response.ts")]
pub struct HealthResponse {
    pub status: &'static str,
}

/// One audit kind the API can run.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "api-types/audit-kind-response.ts")]
pub struct AuditKindResponse {
    pub slug: String,
    pub display_name: String,
}

impl From<AuditKind> for AuditKindResponse {
    fn from(kind: AuditKind) -> Self {
        Self {
            slug: kind.slug().to_owned(),
            display_name: kind.display_name().to_owned(),
        }
    }
}

/// Optional member narrowing an entity audit.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "api-types/audit-query.ts")]
pub struct AuditQuery {
    pub member: Option<String>,
}

/// Payload naming the member of the pair to resolve.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "api-types/resolve-request.ts")]
pub struct ResolveRequest {
    pub member: Option<String>,
}

/// API representation of one audit result row.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "api-types/audit-row-response.ts")]
pub struct AuditRowResponse {
    /// Entity cell values aligned with the table columns.
    pub cells: Vec<String>,
    pub has_access: bool,
    pub note: String,
    pub action: Option<String>,
    pub resolve_path: Option<String>,
}

impl From<AuditTableRow> for AuditRowResponse {
    fn from(row: AuditTableRow) -> Self {
        Self {
            cells: row.cells.into_iter().map(|cell| cell.value).collect(),
            has_access: row.has_access,
            note: row.note,
            action: row.action,
            resolve_path: row.resolve_path,
        }
    }
}

/// API representation of one result bucket.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "api-types/audit-table-response.ts")]
pub struct AuditTableResponse {
    pub columns: Vec<String>,
    pub rows: Vec<AuditRowResponse>,
}

impl From<AuditTable> for AuditTableResponse {
    fn from(table: AuditTable) -> Self {
        Self {
            columns: table.columns,
            rows: table.rows.into_iter().map(AuditRowResponse::from).collect(),
        }
    }
}

/// API representation of a completed audit.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "api-types/audit-response.ts")]
pub struct AuditResponse {
    pub audit: String,
    pub ok: bool,
    pub verified: AuditTableResponse,
    pub needs_action: AuditTableResponse,
    pub errors: AuditTableResponse,
}

impl From<AuditOverview> for AuditResponse {
    fn from(overview: AuditOverview) -> Self {
        Self {
            audit: overview.audit,
            ok: overview.ok,
            verified: overview.verified.into(),
            needs_action: overview.needs_action.into(),
            errors: overview.errors.into(),
        }
    }
}

/// API representation of an applied membership change.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "api-types/membership-change-response.ts")]
pub struct MembershipChangeResponse {
    /// `add` or `remove`.
    pub operation: &'static str,
    pub group_id: String,
    /// `account` or `group`.
    pub member_type: &'static str,
    pub member_id: String,
}

impl From<MembershipChange> for MembershipChangeResponse {
    fn from(change: MembershipChange) -> Self {
        let (operation, group_id, member) = match change {
            MembershipChange::Add { group_id, member } => ("add", group_id, member),
            MembershipChange::Remove { group_id, member } => ("remove", group_id, member),
        };
        let (member_type, member_id) = match member {
            GroupMember::Account(account_id) => ("account", account_id.to_string()),
            GroupMember::Group(group_id) => ("group", group_id.to_string()),
        };

        Self {
            operation,
            group_id: group_id.to_string(),
            member_type,
            member_id,
        }
    }
}

/// API representation of a resolved pair.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "api-types/resolve-response.ts")]
pub struct ResolveResponse {
    pub audit: String,
    /// The result as audited before any change was applied.
    pub result: AuditRowResponse,
    pub changes: Vec<MembershipChangeResponse>,
}

impl From<ResolutionOutcome> for ResolveResponse {
    fn from(outcome: ResolutionOutcome) -> Self {
        Self {
            audit: outcome.audit.to_owned(),
            result: outcome.result.into(),
            changes: outcome
                .changes
                .into_iter()
                .map(MembershipChangeResponse::from)
                .collect(),
        }
    }
}
