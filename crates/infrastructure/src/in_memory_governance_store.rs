//! Governance data held in memory, loaded from a JSON export.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use primed_application::{
    AccessControlDirectory, GovernanceRepository, GroupMember, MembershipChange, MembershipWriter,
};
use primed_core::{AppError, AppResult};
use primed_domain::{
    Account, AccountId, CollaborativeAnalysisWorkspace, DataAffiliateAgreement, DbGapApplication,
    DbGapApplicationId, DbGapDataAccessRequest, DbGapDataAccessSnapshot, DbGapSnapshotId,
    DbGapWorkspace, ManagedGroup, ManagedGroupId, SignedAgreement, User, UserId, Workspace,
    WorkspaceId,
};
use tokio::sync::RwLock;
use tracing::info;

mod export;

pub use export::{
    AccountMembershipRecord, AccountRecord, CollaborativeAnalysisWorkspaceRecord,
    DataAffiliateAgreementRecord, DbGapApplicationRecord, DbGapRequestRecord, DbGapSnapshotRecord,
    DbGapWorkspaceRecord, GovernanceExport, GroupMembershipRecord, GroupRecord,
    SignedAgreementRecord, UserRecord, WorkspaceRecord,
};

#[derive(Debug, Default)]
struct GovernanceData {
    users: HashMap<UserId, User>,
    accounts: HashMap<AccountId, Account>,
    groups: HashMap<ManagedGroupId, ManagedGroup>,
    workspaces: HashMap<WorkspaceId, Workspace>,
    account_memberships: HashSet<(ManagedGroupId, AccountId)>,
    group_memberships: HashSet<(ManagedGroupId, ManagedGroupId)>,
    signed_agreements: Vec<SignedAgreement>,
    data_affiliate_agreements: Vec<DataAffiliateAgreement>,
    dbgap_applications: Vec<DbGapApplication>,
    dbgap_workspaces: Vec<DbGapWorkspace>,
    collaborative_analysis_workspaces: Vec<CollaborativeAnalysisWorkspace>,
    snapshots: Vec<DbGapDataAccessSnapshot>,
    requests: Vec<DbGapDataAccessRequest>,
}

fn insert_unique<K, V>(map: &mut HashMap<K, V>, key: K, value: V, label: &str) -> AppResult<()>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    if map.contains_key(&key) {
        return Err(AppError::Conflict(format!("{label} '{key}' appears more than once")));
    }

    map.insert(key, value);
    Ok(())
}

fn require_known<K, V>(map: &HashMap<K, V>, key: &K, label: &str) -> AppResult<()>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    if map.contains_key(key) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("export references unknown {label} '{key}'")))
    }
}

impl GovernanceData {
    fn from_export(export: GovernanceExport) -> AppResult<Self> {
        let mut data = Self::default();

        for record in export.users {
            let user = record.into_domain()?;
            insert_unique(&mut data.users, user.id(), user, "user")?;
        }
        for record in export.accounts {
            let account = record.into_domain()?;
            if let Some(user_id) = account.user_id() {
                require_known(&data.users, &user_id, "user")?;
            }
            insert_unique(&mut data.accounts, account.id(), account, "account")?;
        }
        for record in export.groups {
            let group = record.into_domain()?;
            insert_unique(&mut data.groups, group.id(), group, "group")?;
        }
        for record in export.account_memberships {
            require_known(&data.groups, &record.group_id, "group")?;
            require_known(&data.accounts, &record.account_id, "account")?;
            data.account_memberships
                .insert((record.group_id, record.account_id));
        }
        for record in export.group_memberships {
            require_known(&data.groups, &record.parent_id, "group")?;
            require_known(&data.groups, &record.child_id, "group")?;
            if record.parent_id == record.child_id {
                return Err(AppError::Validation(format!(
                    "group '{}' cannot be a member of itself",
                    record.parent_id
                )));
            }
            data.group_memberships
                .insert((record.parent_id, record.child_id));
        }
        for record in export.workspaces {
            let workspace = record.into_domain()?;
            for domain_id in workspace.authorization_domains() {
                require_known(&data.groups, domain_id, "group")?;
            }
            insert_unique(&mut data.workspaces, workspace.id(), workspace, "workspace")?;
        }

        for record in export.signed_agreements {
            let agreement = record.into_domain()?;
            require_known(&data.groups, &agreement.access_group(), "group")?;
            if data
                .signed_agreements
                .iter()
                .any(|existing| existing.cc_id() == agreement.cc_id())
            {
                return Err(AppError::Conflict(format!(
                    "signed agreement cc_id '{}' appears more than once",
                    agreement.cc_id()
                )));
            }
            data.signed_agreements.push(agreement);
        }
        for record in export.data_affiliate_agreements {
            let signed_agreement = data
                .signed_agreements
                .iter()
                .find(|agreement| agreement.id() == record.signed_agreement_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "export references unknown signed agreement '{}'",
                        record.signed_agreement_id
                    ))
                })?;
            require_known(&data.groups, &record.upload_group, "group")?;
            if data
                .data_affiliate_agreements
                .iter()
                .any(|existing| existing.signed_agreement().id() == signed_agreement.id())
            {
                return Err(AppError::Conflict(format!(
                    "data affiliate agreement for cc_id '{}' appears more than once",
                    signed_agreement.cc_id()
                )));
            }
            data.data_affiliate_agreements.push(DataAffiliateAgreement::new(
                signed_agreement,
                record.uploaders,
                record.upload_group,
            )?);
        }

        for record in export.dbgap_applications {
            let application = record.into_domain()?;
            require_known(&data.groups, &application.access_group(), "group")?;
            if data
                .dbgap_applications
                .iter()
                .any(|existing| existing.project_id() == application.project_id())
            {
                return Err(AppError::Conflict(format!(
                    "dbGaP project_id '{}' appears more than once",
                    application.project_id()
                )));
            }
            data.dbgap_applications.push(application);
        }
        for record in export.dbgap_workspaces {
            let workspace = data.workspace(record.workspace_id)?;
            data.dbgap_workspaces
                .push(DbGapWorkspace::new(workspace, record.study_version)?);
        }
        for record in export.dbgap_snapshots {
            if !data
                .dbgap_applications
                .iter()
                .any(|application| application.id() == record.application_id)
            {
                return Err(AppError::Validation(format!(
                    "export references unknown dbGaP application '{}'",
                    record.application_id
                )));
            }
            data.snapshots.push(record.into_domain());
        }
        for record in export.dbgap_requests {
            if !data
                .snapshots
                .iter()
                .any(|snapshot| snapshot.id() == record.snapshot_id)
            {
                return Err(AppError::Validation(format!(
                    "export references unknown dbGaP snapshot '{}'",
                    record.snapshot_id
                )));
            }
            data.requests.push(record.into_domain()?);
        }

        for record in export.collaborative_analysis_workspaces {
            let workspace = data.workspace(record.workspace_id)?;
            require_known(&data.groups, &record.analyst_group, "group")?;
            for source_id in &record.source_workspaces {
                require_known(&data.workspaces, source_id, "workspace")?;
            }
            data.collaborative_analysis_workspaces
                .push(CollaborativeAnalysisWorkspace::new(
                    workspace,
                    record.custodian,
                    record.analyst_group,
                    record.source_workspaces,
                )?);
        }

        data.signed_agreements
            .sort_by_key(SignedAgreement::cc_id);
        data.data_affiliate_agreements
            .sort_by_key(|agreement| agreement.signed_agreement().cc_id());
        data.dbgap_applications
            .sort_by_key(DbGapApplication::project_id);
        data.dbgap_workspaces
            .sort_by_key(|workspace| workspace.workspace().full_name());
        data.collaborative_analysis_workspaces
            .sort_by_key(|workspace| workspace.workspace().full_name());

        Ok(data)
    }

    fn workspace(&self, workspace_id: WorkspaceId) -> AppResult<Workspace> {
        self.workspaces.get(&workspace_id).cloned().ok_or_else(|| {
            AppError::Validation(format!(
                "export references unknown workspace '{workspace_id}'"
            ))
        })
    }
}

/// Governance repository, directory and membership writer over one export.
///
/// Membership changes are applied to the in-memory copy only.
#[derive(Debug, Default)]
pub struct InMemoryGovernanceStore {
    data: RwLock<GovernanceData>,
}

impl InMemoryGovernanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a parsed export, validating every reference.
    pub fn from_export(export: GovernanceExport) -> AppResult<Self> {
        Ok(Self {
            data: RwLock::new(GovernanceData::from_export(export)?),
        })
    }

    /// Parses a JSON export.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let export: GovernanceExport = serde_json::from_str(json).map_err(|error| {
            AppError::Validation(format!("invalid governance export: {error}"))
        })?;
        Self::from_export(export)
    }

    /// Reads and parses a JSON export file.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to read governance export '{}': {error}",
                path.display()
            ))
        })?;

        let store = Self::from_json(&json)?;
        {
            let data = store.data.read().await;
            info!(
                path = %path.display(),
                users = data.users.len(),
                accounts = data.accounts.len(),
                groups = data.groups.len(),
                workspaces = data.workspaces.len(),
                "governance export loaded"
            );
        }

        Ok(store)
    }
}

#[async_trait]
impl GovernanceRepository for InMemoryGovernanceStore {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.data.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let username = username.trim();
        Ok(self
            .data
            .read()
            .await
            .users
            .values()
            .find(|user| user.username().eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        Ok(self
            .data
            .read()
            .await
            .accounts
            .values()
            .find(|account| account.email().matches(email))
            .cloned())
    }

    async fn find_account_for_user(&self, user_id: UserId) -> AppResult<Option<Account>> {
        Ok(self
            .data
            .read()
            .await
            .accounts
            .values()
            .find(|account| account.user_id() == Some(user_id))
            .cloned())
    }

    async fn find_group(&self, group_id: ManagedGroupId) -> AppResult<Option<ManagedGroup>> {
        Ok(self.data.read().await.groups.get(&group_id).cloned())
    }

    async fn find_group_by_email(&self, email: &str) -> AppResult<Option<ManagedGroup>> {
        Ok(self
            .data
            .read()
            .await
            .groups
            .values()
            .find(|group| group.email().matches(email))
            .cloned())
    }

    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<ManagedGroup>> {
        Ok(self
            .data
            .read()
            .await
            .groups
            .values()
            .find(|group| group.name().eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Option<Workspace>> {
        Ok(self.data.read().await.workspaces.get(&workspace_id).cloned())
    }

    async fn list_signed_agreements(&self) -> AppResult<Vec<SignedAgreement>> {
        Ok(self.data.read().await.signed_agreements.clone())
    }

    async fn list_data_affiliate_agreements(&self) -> AppResult<Vec<DataAffiliateAgreement>> {
        Ok(self.data.read().await.data_affiliate_agreements.clone())
    }

    async fn list_dbgap_applications(&self) -> AppResult<Vec<DbGapApplication>> {
        Ok(self.data.read().await.dbgap_applications.clone())
    }

    async fn list_dbgap_workspaces(&self) -> AppResult<Vec<DbGapWorkspace>> {
        Ok(self.data.read().await.dbgap_workspaces.clone())
    }

    async fn list_collaborative_analysis_workspaces(
        &self,
    ) -> AppResult<Vec<CollaborativeAnalysisWorkspace>> {
        Ok(self
            .data
            .read()
            .await
            .collaborative_analysis_workspaces
            .clone())
    }

    async fn list_data_access_snapshots(
        &self,
        application_id: DbGapApplicationId,
    ) -> AppResult<Vec<DbGapDataAccessSnapshot>> {
        Ok(self
            .data
            .read()
            .await
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
        Ok(self
            .data
            .read()
            .await
            .requests
            .iter()
            .filter(|request| request.snapshot_id() == snapshot_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccessControlDirectory for InMemoryGovernanceStore {
    async fn list_member_accounts(&self, group_id: ManagedGroupId) -> AppResult<Vec<Account>> {
        let data = self.data.read().await;
        let mut accounts: Vec<Account> = data
            .account_memberships
            .iter()
            .filter(|(stored_group_id, _)| *stored_group_id == group_id)
            .filter_map(|(_, account_id)| data.accounts.get(account_id).cloned())
            .collect();
        accounts.sort_by(|left, right| left.email().cmp(right.email()));

        Ok(accounts)
    }

    async fn list_member_groups(&self, group_id: ManagedGroupId) -> AppResult<Vec<ManagedGroup>> {
        let data = self.data.read().await;
        let mut groups: Vec<ManagedGroup> = data
            .group_memberships
            .iter()
            .filter(|(parent_id, _)| *parent_id == group_id)
            .filter_map(|(_, child_id)| data.groups.get(child_id).cloned())
            .collect();
        groups.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(groups)
    }

    async fn list_parent_groups(&self, group_id: ManagedGroupId) -> AppResult<Vec<ManagedGroup>> {
        let data = self.data.read().await;
        let mut groups: Vec<ManagedGroup> = data
            .group_memberships
            .iter()
            .filter(|(_, child_id)| *child_id == group_id)
            .filter_map(|(parent_id, _)| data.groups.get(parent_id).cloned())
            .collect();
        groups.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(groups)
    }

    async fn is_account_member(
        &self,
        group_id: ManagedGroupId,
        account_id: AccountId,
    ) -> AppResult<bool> {
        Ok(self
            .data
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
            .data
            .read()
            .await
            .group_memberships
            .contains(&(parent_id, child_id)))
    }
}

#[async_trait]
impl MembershipWriter for InMemoryGovernanceStore {
    async fn apply(&self, change: MembershipChange) -> AppResult<()> {
        let mut data = self.data.write().await;
        let (MembershipChange::Add { group_id, member }
        | MembershipChange::Remove { group_id, member }) = change;

        let group = data
            .groups
            .get(&group_id)
            .ok_or_else(|| AppError::NotFound(format!("group '{group_id}' does not exist")))?;
        if !group.is_managed_by_app() {
            return Err(AppError::Forbidden(format!(
                "group '{}' is not managed by this site",
                group.name()
            )));
        }

        match (change, member) {
            (MembershipChange::Add { .. }, GroupMember::Account(account_id)) => {
                require_known(&data.accounts, &account_id, "account")?;
                data.account_memberships.insert((group_id, account_id));
            }
            (MembershipChange::Add { .. }, GroupMember::Group(child_id)) => {
                require_known(&data.groups, &child_id, "group")?;
                if child_id == group_id {
                    return Err(AppError::Validation(format!(
                        "group '{group_id}' cannot be a member of itself"
                    )));
                }
                data.group_memberships.insert((group_id, child_id));
            }
            (MembershipChange::Remove { .. }, GroupMember::Account(account_id)) => {
                data.account_memberships.remove(&(group_id, account_id));
            }
            (MembershipChange::Remove { .. }, GroupMember::Group(child_id)) => {
                data.group_memberships.remove(&(group_id, child_id));
            }
        }

        info!(?change, "membership change applied");
        Ok(())
    }
}
