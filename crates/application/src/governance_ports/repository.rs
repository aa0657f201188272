use async_trait::async_trait;
use primed_core::AppResult;
use primed_domain::{
    Account, CollaborativeAnalysisWorkspace, DataAffiliateAgreement, DbGapApplication,
    DbGapApplicationId, DbGapDataAccessRequest, DbGapDataAccessSnapshot, DbGapSnapshotId,
    DbGapWorkspace, ManagedGroup, ManagedGroupId, SignedAgreement, User, UserId, Workspace,
    WorkspaceId,
};

/// Read-only port for the governance source-of-truth records.
#[async_trait]
pub trait GovernanceRepository: Send + Sync {
    /// Finds a user by identifier.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Finds a user by login identifier (case-insensitive).
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Finds an account by email (case-insensitive).
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    /// Finds the account linked to a user.
    async fn find_account_for_user(&self, user_id: UserId) -> AppResult<Option<Account>>;

    /// Finds a managed group by identifier.
    async fn find_group(&self, group_id: ManagedGroupId) -> AppResult<Option<ManagedGroup>>;

    /// Finds a managed group by email (case-insensitive).
    async fn find_group_by_email(&self, email: &str) -> AppResult<Option<ManagedGroup>>;

    /// Finds a managed group by name (case-insensitive).
    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<ManagedGroup>>;

    /// Finds a workspace by identifier.
    async fn find_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Option<Workspace>>;

    /// Lists every signed agreement, ordered by cc_id.
    async fn list_signed_agreements(&self) -> AppResult<Vec<SignedAgreement>>;

    /// Lists every data affiliate agreement, ordered by cc_id.
    async fn list_data_affiliate_agreements(&self) -> AppResult<Vec<DataAffiliateAgreement>>;

    /// Lists every dbGaP application, ordered by project id.
    async fn list_dbgap_applications(&self) -> AppResult<Vec<DbGapApplication>>;

    /// Lists every dbGaP-governed workspace.
    async fn list_dbgap_workspaces(&self) -> AppResult<Vec<DbGapWorkspace>>;

    /// Lists every collaborative analysis workspace.
    async fn list_collaborative_analysis_workspaces(
        &self,
    ) -> AppResult<Vec<CollaborativeAnalysisWorkspace>>;

    /// Lists the data access snapshots fetched for an application.
    async fn list_data_access_snapshots(
        &self,
        application_id: DbGapApplicationId,
    ) -> AppResult<Vec<DbGapDataAccessSnapshot>>;

    /// Lists the data access requests contained in a snapshot.
    async fn list_data_access_requests(
        &self,
        snapshot_id: DbGapSnapshotId,
    ) -> AppResult<Vec<DbGapDataAccessRequest>>;
}
