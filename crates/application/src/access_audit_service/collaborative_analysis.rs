use std::collections::HashMap;

use async_trait::async_trait;
use primed_core::{AppError, AppResult};
use primed_domain::{
    Account, AccountId, AuditFindings, AuditMember, AuditNote, AuditReport, AuditResult,
    AuditSubject, CollaborativeAnalysisWorkspace, ManagedGroup,
};
use tracing::warn;

use super::identity::{ResolvedMember, resolve_member, unresolvable};
use super::membership::{require_group, transitive_member_accounts};
use super::{AuditContext, AuditPolicy, AuditScope, select_entities};

/// Reasons reported by the collaborative analysis workspace access audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaborativeAnalysisNote {
    /// Account is an analyst with access to every source workspace.
    AuthorizedAccount,
    /// Account is not in the analyst group.
    NotInAnalystGroup,
    /// Account is missing from a source workspace's authorization domain.
    NotInSourceAuthDomains,
    /// An administrative group.
    AdministrativeGroup,
    /// A non-administrative group.
    UnexpectedGroupAccess,
}

impl AuditNote for CollaborativeAnalysisNote {
    fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizedAccount => {
                "Account is in the analyst group and in all source workspace auth domains."
            }
            Self::NotInAnalystGroup => "Account is not in the analyst group.",
            Self::NotInSourceAuthDomains => "Account is not in all source workspace auth domains.",
            Self::AdministrativeGroup => "Administrative groups should always have access.",
            Self::UnexpectedGroupAccess => {
                "Groups other than administrative groups should not have access."
            }
        }
    }
}

/// One (workspace, member) pair of the collaborative analysis audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaborativeAnalysisSubject {
    workspace: CollaborativeAnalysisWorkspace,
    member: AuditMember,
}

impl CollaborativeAnalysisSubject {
    /// Returns the collaborative analysis workspace.
    #[must_use]
    pub fn workspace(&self) -> &CollaborativeAnalysisWorkspace {
        &self.workspace
    }

    /// Returns the audited member.
    #[must_use]
    pub fn member(&self) -> &AuditMember {
        &self.member
    }
}

impl AuditSubject for CollaborativeAnalysisSubject {
    fn table_columns() -> &'static [&'static str] {
        &["workspace", "member"]
    }

    fn table_cells(&self) -> Vec<String> {
        vec![
            self.workspace.workspace().full_name(),
            self.member.email().to_string(),
        ]
    }

    fn audit_key(&self) -> String {
        let member = match &self.member {
            AuditMember::Account(account) => format!("account:{}", account.id()),
            AuditMember::Group(group) => format!("group:{}", group.id()),
        };
        format!("{}/{member}", self.workspace.workspace().id())
    }

    fn resolve_path(&self) -> Option<String> {
        let workspace = self.workspace.workspace();
        Some(format!(
            "/collaborative_analysis/audit/resolve/{}/{}/{}/",
            workspace.billing_project(),
            workspace.name(),
            self.member.email()
        ))
    }
}

/// Completed collaborative analysis workspace access audit.
pub type CollaborativeAnalysisAuditReport =
    AuditReport<CollaborativeAnalysisSubject, CollaborativeAnalysisNote>;

type CollaborativeAnalysisFindings =
    AuditFindings<CollaborativeAnalysisSubject, CollaborativeAnalysisNote>;

/// Checks that the authorization domains of each collaborative analysis
/// workspace contain exactly the analysts who can access every source
/// workspace, plus the administrative groups.
///
/// Entities are keyed by `billing_project/name`.
#[derive(Clone)]
pub struct CollaborativeAnalysisAuditPolicy {
    context: AuditContext,
}

/// Membership facts gathered once per audited workspace.
struct WorkspaceAccess {
    workspace: CollaborativeAnalysisWorkspace,
    auth_domains: Vec<ManagedGroup>,
    analysts: HashMap<AccountId, Account>,
    source_domain_members: Vec<HashMap<AccountId, Account>>,
}

impl CollaborativeAnalysisAuditPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new(context: AuditContext) -> Self {
        Self { context }
    }

    async fn gather(&self, workspace: CollaborativeAnalysisWorkspace) -> AppResult<WorkspaceAccess> {
        let repository = self.context.repository();
        let directory = self.context.directory();

        let mut auth_domains = Vec::new();
        for domain_id in workspace.workspace().authorization_domains() {
            auth_domains.push(require_group(repository, *domain_id).await?);
        }

        let analysts = transitive_member_accounts(directory, workspace.analyst_group()).await?;

        let mut source_domains = Vec::new();
        for source_id in workspace.source_workspaces() {
            let source = repository.find_workspace(*source_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("source workspace '{source_id}' does not exist"))
            })?;
            source_domains.extend_from_slice(source.authorization_domains());
        }
        source_domains.sort();
        source_domains.dedup();

        let mut source_domain_members = Vec::with_capacity(source_domains.len());
        for domain_id in source_domains {
            source_domain_members.push(transitive_member_accounts(directory, domain_id).await?);
        }

        Ok(WorkspaceAccess {
            workspace,
            auth_domains,
            analysts,
            source_domain_members,
        })
    }

    async fn audit_all(
        &self,
        access: &WorkspaceAccess,
        findings: &mut CollaborativeAnalysisFindings,
    ) -> AppResult<()> {
        let directory = self.context.directory();

        let mut accounts: HashMap<AccountId, Account> = access.analysts.clone();
        let mut groups: Vec<ManagedGroup> = Vec::new();
        for domain in &access.auth_domains {
            for account in directory.list_member_accounts(domain.id()).await? {
                accounts.entry(account.id()).or_insert(account);
            }
            for group in directory.list_member_groups(domain.id()).await? {
                if !groups.iter().any(|known| known.id() == group.id()) {
                    groups.push(group);
                }
            }
        }

        for name in self.context.settings().administrative_groups() {
            match self.context.repository().find_group_by_name(name).await? {
                Some(group) => {
                    if !groups.iter().any(|known| known.id() == group.id()) {
                        groups.push(group);
                    }
                }
                None => warn!(group = name, "administrative group does not exist; skipping"),
            }
        }

        let mut accounts: Vec<Account> = accounts.into_values().collect();
        accounts.sort_by(|left, right| left.email().cmp(right.email()));
        groups.sort_by(|left, right| left.email().cmp(right.email()));

        for account in accounts {
            self.audit_account(access, account, findings).await?;
        }
        for group in groups {
            self.audit_group(access, group, findings).await?;
        }

        Ok(())
    }

    async fn audit_identifier(
        &self,
        access: &WorkspaceAccess,
        identifier: &str,
        findings: &mut CollaborativeAnalysisFindings,
    ) -> AppResult<()> {
        match resolve_member(self.context.repository(), identifier).await? {
            ResolvedMember::Person(user) => {
                let account = self
                    .context
                    .repository()
                    .find_account_for_user(user.id())
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "user '{}' has no linked account",
                            user.username()
                        ))
                    })?;
                self.audit_account(access, account, findings).await
            }
            ResolvedMember::Account(account) => self.audit_account(access, account, findings).await,
            ResolvedMember::Group(group) => self.audit_group(access, group, findings).await,
            ResolvedMember::NotFound => Err(unresolvable(identifier)),
        }
    }

    async fn audit_account(
        &self,
        access: &WorkspaceAccess,
        account: Account,
        findings: &mut CollaborativeAnalysisFindings,
    ) -> AppResult<()> {
        let in_analyst_group = access.analysts.contains_key(&account.id());
        let in_sources = access
            .source_domain_members
            .iter()
            .all(|members| members.contains_key(&account.id()));
        let in_auth_domain = self.account_in_all_domains(access, &account).await?;

        let note = match (in_analyst_group, in_sources) {
            (false, _) => CollaborativeAnalysisNote::NotInAnalystGroup,
            (true, false) => CollaborativeAnalysisNote::NotInSourceAuthDomains,
            (true, true) => CollaborativeAnalysisNote::AuthorizedAccount,
        };
        let subject = CollaborativeAnalysisSubject {
            workspace: access.workspace.clone(),
            member: AuditMember::Account(account),
        };

        match (in_analyst_group && in_sources, in_auth_domain) {
            (true, true) => findings.verified(AuditResult::verified_access(subject, note)),
            (true, false) => findings.needs_action(AuditResult::grant_access(subject, note)),
            (false, true) => findings.needs_action(AuditResult::remove_access(subject, note)),
            (false, false) => findings.verified(AuditResult::verified_no_access(subject, note)),
        }
    }

    async fn audit_group(
        &self,
        access: &WorkspaceAccess,
        group: ManagedGroup,
        findings: &mut CollaborativeAnalysisFindings,
    ) -> AppResult<()> {
        let directory = self.context.directory();
        let mut present_in = 0;
        for domain in &access.auth_domains {
            if directory.is_group_member(domain.id(), group.id()).await? {
                present_in += 1;
            }
        }

        let is_administrative = self
            .context
            .settings()
            .is_administrative_group(group.name());
        let subject = CollaborativeAnalysisSubject {
            workspace: access.workspace.clone(),
            member: AuditMember::Group(group),
        };

        if is_administrative {
            return if present_in == access.auth_domains.len() && present_in > 0 {
                findings.verified(AuditResult::verified_access(
                    subject,
                    CollaborativeAnalysisNote::AdministrativeGroup,
                ))
            } else {
                findings.needs_action(AuditResult::grant_access(
                    subject,
                    CollaborativeAnalysisNote::AdministrativeGroup,
                ))
            };
        }

        if present_in > 0 {
            findings.error(AuditResult::remove_access(
                subject,
                CollaborativeAnalysisNote::UnexpectedGroupAccess,
            ))
        } else {
            findings.verified(AuditResult::verified_no_access(
                subject,
                CollaborativeAnalysisNote::UnexpectedGroupAccess,
            ))
        }
    }

    /// Direct membership in every authorization domain of the workspace.
    async fn account_in_all_domains(
        &self,
        access: &WorkspaceAccess,
        account: &Account,
    ) -> AppResult<bool> {
        if access.auth_domains.is_empty() {
            return Ok(false);
        }

        for domain in &access.auth_domains {
            if !self
                .context
                .directory()
                .is_account_member(domain.id(), account.id())
                .await?
            {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl AuditPolicy for CollaborativeAnalysisAuditPolicy {
    type Key = String;
    type Subject = CollaborativeAnalysisSubject;
    type Note = CollaborativeAnalysisNote;

    const NAME: &'static str = "CollaborativeAnalysisWorkspaceAccessAudit";

    async fn audit_pass(
        &self,
        scope: &AuditScope<String>,
        findings: &mut AuditFindings<Self::Subject, Self::Note>,
    ) -> AppResult<()> {
        let workspaces = select_entities(
            self.context
                .repository()
                .list_collaborative_analysis_workspaces()
                .await?,
            scope.entities(),
            |workspace: &CollaborativeAnalysisWorkspace| workspace.workspace().full_name(),
            "collaborative analysis workspace",
        )?;

        for workspace in workspaces {
            let access = self.gather(workspace).await?;
            match scope.member() {
                Some(identifier) => self.audit_identifier(&access, identifier, findings).await?,
                None => self.audit_all(&access, findings).await?,
            }
        }

        Ok(())
    }
}
