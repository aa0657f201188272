use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use primed_core::AppResult;
use primed_domain::{
    Account, AccountId, AgreementStatus, AgreementType, CollaborativeAnalysisWorkspace,
    ConsentedStudyVersion, DarStatus, DataAffiliateAgreement, DbGapApplication,
    DbGapApplicationId, DbGapDataAccessRequest, DbGapDataAccessSnapshot, DbGapSnapshotId,
    DbGapWorkspace, ManagedGroup, ManagedGroupId, SignedAgreement, SignedAgreementId,
    SignedAgreementInput, User, UserId, Workspace, WorkspaceId,
};

use crate::{
    AccessControlDirectory, AuditContext, AuditSettings, GovernanceRepository, GroupMember,
    MembershipChange, MembershipWriter,
};

#[derive(Default)]
pub(crate) struct FakeState {
    users: Vec<User>,
    accounts: Vec<Account>,
    groups: Vec<ManagedGroup>,
    workspaces: Vec<Workspace>,
    signed_agreements: Vec<SignedAgreement>,
    data_affiliate_agreements: Vec<DataAffiliateAgreement>,
    dbgap_applications: Vec<DbGapApplication>,
    dbgap_workspaces: Vec<DbGapWorkspace>,
    collaborative_analysis_workspaces: Vec<CollaborativeAnalysisWorkspace>,
    snapshots: Vec<DbGapDataAccessSnapshot>,
    requests: Vec<DbGapDataAccessRequest>,
    account_memberships: HashSet<(ManagedGroupId, AccountId)>,
    group_memberships: HashSet<(ManagedGroupId, ManagedGroupId)>,
}

impl FakeState {
    pub(crate) fn user(&mut self, username: &str) -> AppResult<User> {
        let user = User::new(UserId::new(), username, username)?;
        self.users.push(user.clone());
        Ok(user)
    }

    pub(crate) fn account(&mut self, email: &str, user: Option<&User>) -> AppResult<Account> {
        let account = Account::new(AccountId::new(), email, user.map(User::id))?;
        self.accounts.push(account.clone());
        Ok(account)
    }

    /// A user with a linked account using the same email.
    pub(crate) fn person(&mut self, email: &str) -> AppResult<(User, Account)> {
        let user = self.user(email)?;
        let account = self.account(email, Some(&user))?;
        Ok((user, account))
    }

    pub(crate) fn group(&mut self, name: &str) -> AppResult<ManagedGroup> {
        let group = ManagedGroup::new(ManagedGroupId::new(), name, true)?;
        self.groups.push(group.clone());
        Ok(group)
    }

    pub(crate) fn unmanaged_group(&mut self, name: &str) -> AppResult<ManagedGroup> {
        let group = ManagedGroup::new(ManagedGroupId::new(), name, false)?;
        self.groups.push(group.clone());
        Ok(group)
    }

    pub(crate) fn add_account(&mut self, group: &ManagedGroup, account: &Account) {
        self.account_memberships.insert((group.id(), account.id()));
    }

    pub(crate) fn add_group(&mut self, parent: &ManagedGroup, child: &ManagedGroup) {
        self.group_memberships.insert((parent.id(), child.id()));
    }

    pub(crate) fn workspace(
        &mut self,
        full_name: (&str, &str),
        created_at: DateTime<Utc>,
        domains: &[&ManagedGroup],
    ) -> AppResult<Workspace> {
        let workspace = Workspace::new(
            WorkspaceId::new(),
            full_name.0,
            full_name.1,
            created_at,
            domains.iter().map(|domain| domain.id()).collect(),
        )?;
        self.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    pub(crate) fn signed_agreement(
        &mut self,
        cc_id: u32,
        agreement_type: AgreementType,
        is_primary: bool,
        status: AgreementStatus,
        accessors: &[&User],
    ) -> AppResult<(SignedAgreement, ManagedGroup)> {
        let access_group = self.group(&format!("PRIMED_CDSA_ACCESS_{cc_id}"))?;
        let agreement = SignedAgreement::new(SignedAgreementInput {
            id: SignedAgreementId::new(),
            cc_id,
            representative: UserId::new(),
            version: "v1.0".to_owned(),
            is_primary,
            status,
            agreement_type,
            accessors: accessors.iter().map(|user| user.id()).collect(),
            access_group: access_group.id(),
        })?;
        self.signed_agreements.push(agreement.clone());
        Ok((agreement, access_group))
    }

    pub(crate) fn data_affiliate_agreement(
        &mut self,
        cc_id: u32,
        uploaders: &[&User],
    ) -> AppResult<(DataAffiliateAgreement, ManagedGroup)> {
        let (agreement, _) = self.signed_agreement(
            cc_id,
            AgreementType::DataAffiliate {
                study: "FHS".to_owned(),
            },
            true,
            AgreementStatus::Active,
            &[],
        )?;
        let upload_group = self.group(&format!("PRIMED_CDSA_UPLOAD_{cc_id}"))?;
        let agreement = DataAffiliateAgreement::new(
            agreement,
            uploaders.iter().map(|user| user.id()).collect(),
            upload_group.id(),
        )?;
        self.data_affiliate_agreements.push(agreement.clone());
        Ok((agreement, upload_group))
    }

    pub(crate) fn dbgap_application(
        &mut self,
        project_id: u32,
        principal_investigator: &User,
        collaborators: &[&User],
    ) -> AppResult<(DbGapApplication, ManagedGroup)> {
        let access_group = self.group(&format!("PRIMED_DBGAP_ACCESS_{project_id}"))?;
        let application = DbGapApplication::new(
            DbGapApplicationId::new(),
            project_id,
            principal_investigator.id(),
            collaborators.iter().map(|user| user.id()).collect(),
            access_group.id(),
        )?;
        self.dbgap_applications.push(application.clone());
        Ok((application, access_group))
    }

    pub(crate) fn dbgap_workspace(
        &mut self,
        name: &str,
        created_at: DateTime<Utc>,
        domains: &[&ManagedGroup],
        study_version: ConsentedStudyVersion,
    ) -> AppResult<DbGapWorkspace> {
        let workspace = self.workspace(("primed-dbgap", name), created_at, domains)?;
        let workspace = DbGapWorkspace::new(workspace, study_version)?;
        self.dbgap_workspaces.push(workspace.clone());
        Ok(workspace)
    }

    pub(crate) fn snapshot(
        &mut self,
        application: &DbGapApplication,
        age: Duration,
        is_most_recent: bool,
    ) -> DbGapDataAccessSnapshot {
        let snapshot = DbGapDataAccessSnapshot::new(
            DbGapSnapshotId::new(),
            application.id(),
            Utc::now() - age,
            is_most_recent,
        );
        self.snapshots.push(snapshot.clone());
        snapshot
    }

    pub(crate) fn request(
        &mut self,
        snapshot: &DbGapDataAccessSnapshot,
        dar_id: u32,
        original: ConsentedStudyVersion,
        status: DarStatus,
    ) -> AppResult<DbGapDataAccessRequest> {
        let request = DbGapDataAccessRequest::new(snapshot.id(), dar_id, original, status)?;
        self.requests.push(request.clone());
        Ok(request)
    }

    pub(crate) fn collaborative_analysis_workspace(
        &mut self,
        workspace: Workspace,
        analyst_group: &ManagedGroup,
        sources: &[&Workspace],
    ) -> AppResult<CollaborativeAnalysisWorkspace> {
        let workspace = CollaborativeAnalysisWorkspace::new(
            workspace,
            UserId::new(),
            analyst_group.id(),
            sources.iter().map(|source| source.id()).collect(),
        )?;
        self.collaborative_analysis_workspaces
            .push(workspace.clone());
        Ok(workspace)
    }
}

pub(crate) fn study(
    version: u32,
    participant_set: u32,
    consent_code: &str,
) -> ConsentedStudyVersion {
    ConsentedStudyVersion {
        phs: 7,
        version,
        participant_set,
        consent_code: consent_code.to_owned(),
    }
}

pub(crate) struct FakeGovernance {
    state: RwLock<FakeState>,
    applied: RwLock<Vec<MembershipChange>>,
}

impl FakeGovernance {
    pub(crate) fn new(state: FakeState) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(state),
            applied: RwLock::new(Vec::new()),
        })
    }

    pub(crate) async fn applied(&self) -> Vec<MembershipChange> {
        self.applied.read().await.clone()
    }

    pub(crate) async fn has_account(&self, group: &ManagedGroup, account: &Account) -> bool {
        self.state
            .read()
            .await
            .account_memberships
            .contains(&(group.id(), account.id()))
    }

    pub(crate) async fn has_group(&self, parent: &ManagedGroup, child: &ManagedGroup) -> bool {
        self.state
            .read()
            .await
            .group_memberships
            .contains(&(parent.id(), child.id()))
    }
}

pub(crate) fn context_for(store: &Arc<FakeGovernance>) -> AuditContext {
    AuditContext::new(store.clone(), store.clone(), AuditSettings::default())
}

#[async_trait]
impl GovernanceRepository for FakeGovernance {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|user| user.id() == user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|user| user.username().eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .iter()
            .find(|account| account.email().matches(email))
            .cloned())
    }

    async fn find_account_for_user(&self, user_id: UserId) -> AppResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .iter()
            .find(|account| account.user_id() == Some(user_id))
            .cloned())
    }

    async fn find_group(&self, group_id: ManagedGroupId) -> AppResult<Option<ManagedGroup>> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|group| group.id() == group_id).cloned())
    }

    async fn find_group_by_email(&self, email: &str) -> AppResult<Option<ManagedGroup>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .iter()
            .find(|group| group.email().matches(email))
            .cloned())
    }

    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<ManagedGroup>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .iter()
            .find(|group| group.name().eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Option<Workspace>> {
        let state = self.state.read().await;
        Ok(state
            .workspaces
            .iter()
            .find(|workspace| workspace.id() == workspace_id)
            .cloned())
    }

    async fn list_signed_agreements(&self) -> AppResult<Vec<SignedAgreement>> {
        Ok(self.state.read().await.signed_agreements.clone())
    }

    async fn list_data_affiliate_agreements(&self) -> AppResult<Vec<DataAffiliateAgreement>> {
        Ok(self.state.read().await.data_affiliate_agreements.clone())
    }

    async fn list_dbgap_applications(&self) -> AppResult<Vec<DbGapApplication>> {
        Ok(self.state.read().await.dbgap_applications.clone())
    }

    async fn list_dbgap_workspaces(&self) -> AppResult<Vec<DbGapWorkspace>> {
        Ok(self.state.read().await.dbgap_workspaces.clone())
    }

    async fn list_collaborative_analysis_workspaces(
        &self,
    ) -> AppResult<Vec<CollaborativeAnalysisWorkspace>> {
        Ok(self
            .state
            .read()
            .await
            .collaborative_analysis_workspaces
            .clone())
    }

    async fn list_data_access_snapshots(
        &self,
        application_id: DbGapApplicationId,
    ) -> AppResult<Vec<DbGapDataAccessSnapshot>> {
        let state = self.state.read().await;
        Ok(state
            .snapshots
            .iter()
            .filter(|snapshot| snapshot.application_id() == application_id)
            .cloned()
            .collect())
    }

    async fn list_data_access_requests(
        &self,
        snapshot_id: DbGapSnapshotId,
    ) -> AppResult<Vec<DbGapDataAccessRequest>> {
        let state = self.state.read().await;
        Ok(state
            .requests
            .iter()
            .filter(|request| request.snapshot_id() == snapshot_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccessControlDirectory for FakeGovernance {
    async fn list_member_accounts(&self, group_id: ManagedGroupId) -> AppResult<Vec<Account>> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .iter()
            .filter(|account| state.account_memberships.contains(&(group_id, account.id())))
            .cloned()
            .collect();
        accounts.sort_by(|left, right| left.email().cmp(right.email()));
        Ok(accounts)
    }

    async fn list_member_groups(&self, group_id: ManagedGroupId) -> AppResult<Vec<ManagedGroup>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .iter()
            .filter(|group| state.group_memberships.contains(&(group_id, group.id())))
            .cloned()
            .collect())
    }

    async fn list_parent_groups(&self, group_id: ManagedGroupId) -> AppResult<Vec<ManagedGroup>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .iter()
            .filter(|group| state.group_memberships.contains(&(group.id(), group_id)))
            .cloned()
            .collect())
    }

    async fn is_account_member(
        &self,
        group_id: ManagedGroupId,
        account_id: AccountId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .account_memberships
            .contains(&(group_id, account_id)))
    }

    async fn is_group_member(
        &self,
        parent_id: ManagedGroupId,
        child_id: ManagedGroupId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .group_memberships
            .contains(&(parent_id, child_id)))
    }
}

#[async_trait]
impl MembershipWriter for FakeGovernance {
    async fn apply(&self, change: MembershipChange) -> AppResult<()> {
        {
            let mut state = self.state.write().await;
            match change {
                MembershipChange::Add {
                    group_id,
                    member: GroupMember::Account(account_id),
                } => {
                    state.account_memberships.insert((group_id, account_id));
                }
                MembershipChange::Add {
                    group_id,
                    member: GroupMember::Group(child_id),
                } => {
                    state.group_memberships.insert((group_id, child_id));
                }
                MembershipChange::Remove {
                    group_id,
                    member: GroupMember::Account(account_id),
                } => {
                    state.account_memberships.remove(&(group_id, account_id));
                }
                MembershipChange::Remove {
                    group_id,
                    member: GroupMember::Group(child_id),
                } => {
                    state.group_memberships.remove(&(group_id, child_id));
                }
            }
        }

        self.applied.write().await.push(change);
        Ok(())
    }
}
