//! Shared pass for audits where people hold a role on an entity and the
//! entity's group should contain exactly the role holders' accounts.

use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use primed_core::AppResult;
use primed_domain::{
    Account, AccountId, AuditFindings, AuditMember, AuditNote, AuditResult, AuditSubject,
    EmailAddress, ManagedGroup, ManagedGroupId, MemberReference, User, UserId,
};

use super::identity::{ResolvedMember, resolve_member, unresolvable};
use super::membership::{linked_user, require_user};
use super::{AuditContext, AuditPolicy, AuditScope, select_entities};
use crate::GovernanceRepository;

/// Notes a role audit needs, one per decision outcome.
pub trait RoleNotes: AuditNote {
    /// Role holder's account is in the group.
    const IN_GROUP: Self;
    /// Role holder's account should be added.
    const LINKED_ACCOUNT: Self;
    /// Role holder has no account to add.
    const NO_ACCOUNT: Self;
    /// Person does not hold the role.
    const NOT_IN_ROLE: Self;
    /// Account is not linked to any person.
    const ACCOUNT_NOT_LINKED: Self;
    /// Non-administrative groups must not be members.
    const UNEXPECTED_GROUP: Self;
    /// Administrative groups may be members.
    const ADMINISTRATIVE_GROUP: Self;
}

/// An entity granting a role whose holders belong in one group.
#[async_trait]
pub trait RoleGoverned: Clone + Debug + Send + Sync + 'static {
    /// Notes reported by this role's audit.
    type Note: RoleNotes;

    /// Name of the audit over this entity.
    const AUDIT_NAME: &'static str;

    /// Entity name used in not-found errors.
    const ENTITY_LABEL: &'static str;

    /// Table columns: the entity, then `user`, then `member`.
    const TABLE_COLUMNS: &'static [&'static str];

    /// Lists every entity of this kind.
    async fn list_entities(repository: &dyn GovernanceRepository) -> AppResult<Vec<Self>>;

    /// Key selecting the entity in a scope.
    fn role_key(&self) -> u32;

    /// Display value of the entity.
    fn role_label(&self) -> String {
        self.role_key().to_string()
    }

    /// People holding the role.
    fn role_holders(&self) -> Vec<UserId>;

    /// Group that should contain the role holders' accounts.
    fn role_group(&self) -> ManagedGroupId;

    /// Resolution page for one member of the role group.
    fn resolve_path(&self, member_email: &EmailAddress) -> String;
}

/// One (entity, person or member) pair of a role audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAuditSubject<G> {
    entity: G,
    member: MemberReference,
}

impl<G: RoleGoverned> RoleAuditSubject<G> {
    /// Returns the governing entity.
    #[must_use]
    pub fn entity(&self) -> &G {
        &self.entity
    }

    /// Returns the audited person and/or member.
    #[must_use]
    pub fn member(&self) -> &MemberReference {
        &self.member
    }
}

impl<G: RoleGoverned> AuditSubject for RoleAuditSubject<G> {
    fn table_columns() -> &'static [&'static str] {
        G::TABLE_COLUMNS
    }

    fn table_cells(&self) -> Vec<String> {
        vec![
            self.entity.role_label(),
            self.member.username_cell(),
            self.member.member_cell(),
        ]
    }

    fn audit_key(&self) -> String {
        format!("{}/{}", self.entity.role_label(), self.member.key())
    }

    fn resolve_path(&self) -> Option<String> {
        self.member
            .member()
            .map(|member| self.entity.resolve_path(member.email()))
    }
}

type RoleFindings<G> = AuditFindings<RoleAuditSubject<G>, <G as RoleGoverned>::Note>;

/// Checks that each entity's role group holds exactly its role holders'
/// accounts.
pub struct RoleAuditPolicy<G> {
    context: AuditContext,
    entity: PhantomData<fn() -> G>,
}

impl<G> Clone for RoleAuditPolicy<G> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

impl<G> RoleAuditPolicy<G> {
    /// Creates the policy.
    #[must_use]
    pub fn new(context: AuditContext) -> Self {
        Self {
            context,
            entity: PhantomData,
        }
    }
}

#[async_trait]
impl<G: RoleGoverned> AuditPolicy for RoleAuditPolicy<G> {
    type Key = u32;
    type Subject = RoleAuditSubject<G>;
    type Note = G::Note;

    const NAME: &'static str = G::AUDIT_NAME;

    async fn audit_pass(
        &self,
        scope: &AuditScope<u32>,
        findings: &mut RoleFindings<G>,
    ) -> AppResult<()> {
        let entities = select_entities(
            G::list_entities(self.context.repository()).await?,
            scope.entities(),
            G::role_key,
            G::ENTITY_LABEL,
        )?;

        for entity in &entities {
            audit_role_entity(&self.context, entity, scope.member(), findings).await?;
        }

        Ok(())
    }
}

/// Audits one entity, either fully or for a single member identifier.
async fn audit_role_entity<G: RoleGoverned>(
    context: &AuditContext,
    entity: &G,
    member: Option<&str>,
    findings: &mut RoleFindings<G>,
) -> AppResult<()> {
    let auditor = RoleAuditor {
        context,
        entity,
        holders: entity.role_holders(),
    };

    match member {
        Some(identifier) => auditor.audit_identifier(identifier, findings).await,
        None => auditor.audit_all(findings).await,
    }
}

struct RoleAuditor<'a, G> {
    context: &'a AuditContext,
    entity: &'a G,
    holders: Vec<UserId>,
}

impl<G: RoleGoverned> RoleAuditor<'_, G> {
    async fn audit_all(&self, findings: &mut RoleFindings<G>) -> AppResult<()> {
        let group_id = self.entity.role_group();
        let directory = self.context.directory();
        let mut extra_accounts = directory.list_member_accounts(group_id).await?;
        let member_groups = directory.list_member_groups(group_id).await?;

        for holder_id in &self.holders {
            let user = require_user(self.context.repository(), *holder_id).await?;
            if let Some(audited) = self.audit_user(user, findings).await? {
                extra_accounts.retain(|account| account.id() != audited);
            }
        }

        for account in extra_accounts {
            let user = linked_user(self.context.repository(), &account).await?;
            self.audit_account(account, user, findings).await?;
        }

        for group in member_groups {
            self.audit_group(group, false, findings).await?;
        }

        Ok(())
    }

    async fn audit_identifier(
        &self,
        identifier: &str,
        findings: &mut RoleFindings<G>,
    ) -> AppResult<()> {
        match resolve_member(self.context.repository(), identifier).await? {
            ResolvedMember::Person(user) => self.audit_user(user, findings).await.map(|_| ()),
            ResolvedMember::Account(account) => {
                let user = linked_user(self.context.repository(), &account).await?;
                self.audit_account(account, user, findings).await
            }
            ResolvedMember::Group(group) => self.audit_group(group, true, findings).await,
            ResolvedMember::NotFound => Err(unresolvable(identifier)),
        }
    }

    /// Audits a person through their linked account, returning the account
    /// that was audited.
    async fn audit_user(
        &self,
        user: User,
        findings: &mut RoleFindings<G>,
    ) -> AppResult<Option<AccountId>> {
        match self
            .context
            .repository()
            .find_account_for_user(user.id())
            .await?
        {
            Some(account) => {
                let account_id = account.id();
                self.audit_account(account, Some(user), findings).await?;
                Ok(Some(account_id))
            }
            None => {
                let note = if self.holders.contains(&user.id()) {
                    G::Note::NO_ACCOUNT
                } else {
                    G::Note::NOT_IN_ROLE
                };
                findings.verified(AuditResult::verified_no_access(
                    self.subject(MemberReference::for_user(user)),
                    note,
                ))?;
                Ok(None)
            }
        }
    }

    async fn audit_account(
        &self,
        account: Account,
        user: Option<User>,
        findings: &mut RoleFindings<G>,
    ) -> AppResult<()> {
        let in_group = self
            .context
            .directory()
            .is_account_member(self.entity.role_group(), account.id())
            .await?;

        let Some(user) = user else {
            let subject =
                self.subject(MemberReference::new(None, Some(AuditMember::Account(account)))?);
            return if in_group {
                findings.error(AuditResult::remove_access(
                    subject,
                    G::Note::ACCOUNT_NOT_LINKED,
                ))
            } else {
                findings.verified(AuditResult::verified_no_access(
                    subject,
                    G::Note::ACCOUNT_NOT_LINKED,
                ))
            };
        };

        let holds_role = self.holders.contains(&user.id());
        let subject = self.subject(MemberReference::new(
            Some(user),
            Some(AuditMember::Account(account)),
        )?);

        match (holds_role, in_group) {
            (true, true) => {
                findings.verified(AuditResult::verified_access(subject, G::Note::IN_GROUP))
            }
            (true, false) => findings.needs_action(AuditResult::grant_access(
                subject,
                G::Note::LINKED_ACCOUNT,
            )),
            (false, true) => {
                findings.needs_action(AuditResult::remove_access(subject, G::Note::NOT_IN_ROLE))
            }
            (false, false) => findings.verified(AuditResult::verified_no_access(
                subject,
                G::Note::NOT_IN_ROLE,
            )),
        }
    }

    /// Audits a group member. Administrative groups are only reported when
    /// asked for explicitly.
    async fn audit_group(
        &self,
        group: ManagedGroup,
        report_administrative: bool,
        findings: &mut RoleFindings<G>,
    ) -> AppResult<()> {
        let is_administrative = self
            .context
            .settings()
            .is_administrative_group(group.name());
        if is_administrative && !report_administrative {
            return Ok(());
        }

        let in_group = self
            .context
            .directory()
            .is_group_member(self.entity.role_group(), group.id())
            .await?;
        let subject = self.subject(MemberReference::for_group(group));

        match (is_administrative, in_group) {
            (true, true) => findings.verified(AuditResult::verified_access(
                subject,
                G::Note::ADMINISTRATIVE_GROUP,
            )),
            (true, false) => findings.verified(AuditResult::verified_no_access(
                subject,
                G::Note::ADMINISTRATIVE_GROUP,
            )),
            (false, true) => findings.error(AuditResult::remove_access(
                subject,
                G::Note::UNEXPECTED_GROUP,
            )),
            (false, false) => findings.verified(AuditResult::verified_no_access(
                subject,
                G::Note::UNEXPECTED_GROUP,
            )),
        }
    }

    fn subject(&self, member: MemberReference) -> RoleAuditSubject<G> {
        RoleAuditSubject {
            entity: self.entity.clone(),
            member,
        }
    }
}
