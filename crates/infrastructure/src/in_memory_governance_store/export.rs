use chrono::{DateTime, Utc};
use primed_core::AppResult;
use primed_domain::{
    Account, AccountId, AgreementStatus, AgreementType, ConsentedStudyVersion, DarStatus,
    DbGapApplication, DbGapApplicationId, DbGapDataAccessRequest, DbGapDataAccessSnapshot,
    DbGapSnapshotId, ManagedGroup, ManagedGroupId, SignedAgreement, SignedAgreementId,
    SignedAgreementInput, User, UserId, Workspace, WorkspaceId,
};
use serde::{Deserialize, Serialize};

/// JSON export of the governance data an audit reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceExport {
    /// Site users.
    pub users: Vec<UserRecord>,
    /// AnVIL accounts.
    pub accounts: Vec<AccountRecord>,
    /// AnVIL managed groups.
    pub groups: Vec<GroupRecord>,
    /// Direct account memberships.
    pub account_memberships: Vec<AccountMembershipRecord>,
    /// Direct group-in-group memberships.
    pub group_memberships: Vec<GroupMembershipRecord>,
    /// AnVIL workspaces.
    pub workspaces: Vec<WorkspaceRecord>,
    /// Signed agreements of every type.
    pub signed_agreements: Vec<SignedAgreementRecord>,
    /// Upload terms of data affiliate agreements.
    pub data_affiliate_agreements: Vec<DataAffiliateAgreementRecord>,
    /// dbGaP applications.
    pub dbgap_applications: Vec<DbGapApplicationRecord>,
    /// Workspaces holding dbGaP data.
    pub dbgap_workspaces: Vec<DbGapWorkspaceRecord>,
    /// Data access snapshots pulled from dbGaP.
    pub dbgap_snapshots: Vec<DbGapSnapshotRecord>,
    /// Data access requests listed in snapshots.
    pub dbgap_requests: Vec<DbGapRequestRecord>,
    /// Collaborative analysis workspaces.
    pub collaborative_analysis_workspaces: Vec<CollaborativeAnalysisWorkspaceRecord>,
}

/// Exported user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier.
    pub id: UserId,
    /// Login identifier.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

impl UserRecord {
    pub(super) fn into_domain(self) -> AppResult<User> {
        User::new(self.id, self.username, self.name)
    }
}

/// Exported account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Account identifier.
    pub id: AccountId,
    /// Account email.
    pub email: String,
    /// Linked user, if any.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl AccountRecord {
    pub(super) fn into_domain(self) -> AppResult<Account> {
        Account::new(self.id, self.email, self.user_id)
    }
}

fn managed_by_default() -> bool {
    true
}

/// Exported managed group row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group identifier.
    pub id: ManagedGroupId,
    /// Group name.
    pub name: String,
    /// Whether this site manages the group's membership.
    #[serde(default = "managed_by_default")]
    pub is_managed_by_app: bool,
}

impl GroupRecord {
    pub(super) fn into_domain(self) -> AppResult<ManagedGroup> {
        ManagedGroup::new(self.id, self.name, self.is_managed_by_app)
    }
}

/// Exported direct account membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMembershipRecord {
    /// Containing group.
    pub group_id: ManagedGroupId,
    /// Member account.
    pub account_id: AccountId,
}

/// Exported direct group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembershipRecord {
    /// Containing group.
    pub parent_id: ManagedGroupId,
    /// Member group.
    pub child_id: ManagedGroupId,
}

/// Exported workspace row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    /// Workspace identifier.
    pub id: WorkspaceId,
    /// Billing project name.
    pub billing_project: String,
    /// Workspace name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Authorization domain groups.
    #[serde(default)]
    pub authorization_domains: Vec<ManagedGroupId>,
}

impl WorkspaceRecord {
    pub(super) fn into_domain(self) -> AppResult<Workspace> {
        Workspace::new(
            self.id,
            self.billing_project,
            self.name,
            self.created_at,
            self.authorization_domains,
        )
    }
}

/// Exported signed agreement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAgreementRecord {
    /// Record identifier.
    pub id: SignedAgreementId,
    /// Coordinating-center identifier.
    pub cc_id: u32,
    /// Signing representative.
    pub representative: UserId,
    /// Agreement version label.
    pub version: String,
    /// Whether the agreement is primary.
    pub is_primary: bool,
    /// Lifecycle status.
    pub status: AgreementStatus,
    /// Subtype and coverage scope.
    pub agreement_type: AgreementType,
    /// Named accessors.
    #[serde(default)]
    pub accessors: Vec<UserId>,
    /// Access group.
    pub access_group: ManagedGroupId,
}

impl SignedAgreementRecord {
    pub(super) fn into_domain(self) -> AppResult<SignedAgreement> {
        SignedAgreement::new(SignedAgreementInput {
            id: self.id,
            cc_id: self.cc_id,
            representative: self.representative,
            version: self.version,
            is_primary: self.is_primary,
            status: self.status,
            agreement_type: self.agreement_type,
            accessors: self.accessors,
            access_group: self.access_group,
        })
    }
}

/// Exported upload terms of one data affiliate agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAffiliateAgreementRecord {
    /// The signed agreement these terms belong to.
    pub signed_agreement_id: SignedAgreementId,
    /// Named uploaders.
    #[serde(default)]
    pub uploaders: Vec<UserId>,
    /// Upload group.
    pub upload_group: ManagedGroupId,
}

/// Exported dbGaP application row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapApplicationRecord {
    /// Record identifier.
    pub id: DbGapApplicationId,
    /// dbGaP project identifier.
    pub project_id: u32,
    /// Principal investigator.
    pub principal_investigator: UserId,
    /// Named collaborators.
    #[serde(default)]
    pub collaborators: Vec<UserId>,
    /// Access group.
    pub access_group: ManagedGroupId,
}

impl DbGapApplicationRecord {
    pub(super) fn into_domain(self) -> AppResult<DbGapApplication> {
        DbGapApplication::new(
            self.id,
            self.project_id,
            self.principal_investigator,
            self.collaborators,
            self.access_group,
        )
    }
}

/// Exported dbGaP workspace row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapWorkspaceRecord {
    /// Underlying workspace.
    pub workspace_id: WorkspaceId,
    /// Consented study version held in the workspace.
    pub study_version: ConsentedStudyVersion,
}

/// Exported data access snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapSnapshotRecord {
    /// Snapshot identifier.
    pub id: DbGapSnapshotId,
    /// Application the snapshot was pulled for.
    pub application_id: DbGapApplicationId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Whether the snapshot is flagged most recent.
    pub is_most_recent: bool,
}

impl DbGapSnapshotRecord {
    pub(super) fn into_domain(self) -> DbGapDataAccessSnapshot {
        DbGapDataAccessSnapshot::new(
            self.id,
            self.application_id,
            self.created_at,
            self.is_most_recent,
        )
    }
}

/// Exported data access request row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapRequestRecord {
    /// Snapshot listing the request.
    pub snapshot_id: DbGapSnapshotId,
    /// dbGaP DAR identifier.
    pub dar_id: u32,
    /// Study version the request was originally approved for.
    pub original: ConsentedStudyVersion,
    /// Decision status.
    pub status: DarStatus,
}

impl DbGapRequestRecord {
    pub(super) fn into_domain(self) -> AppResult<DbGapDataAccessRequest> {
        DbGapDataAccessRequest::new(self.snapshot_id, self.dar_id, self.original, self.status)
    }
}

/// Exported collaborative analysis workspace row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborativeAnalysisWorkspaceRecord {
    /// Underlying workspace.
    pub workspace_id: WorkspaceId,
    /// Custodian of the workspace.
    pub custodian: UserId,
    /// Group of analysts allowed into the workspace.
    pub analyst_group: ManagedGroupId,
    /// Workspaces whose data is combined.
    #[serde(default)]
    pub source_workspaces: Vec<WorkspaceId>,
}
