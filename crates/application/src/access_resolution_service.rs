//! Applies the membership change an audit result calls for.

use std::sync::Arc;

use primed_core::{AppError, AppResult};
use primed_domain::{AuditAction, AuditMember, AuditTableRow, ManagedGroupId};
use tracing::info;

use crate::access_audit_service::{
    AccessAudit, AccessAuditService, AuditKind, AuditPolicy, AuditScope,
    CollaborativeAnalysisSubject, DbGapAccessSubject, RoleAuditSubject, RoleGoverned,
    SignedAgreementSubject, build_scope, parse_number_key,
};
use crate::{GroupMember, MembershipChange, MembershipWriter};

/// Group memberships an audited subject is about.
pub trait MembershipTarget {
    /// Returns `(group, member)` edges that grant the subject access.
    fn membership_edges(&self) -> Vec<(ManagedGroupId, GroupMember)>;
}

fn group_member(member: &AuditMember) -> GroupMember {
    match member {
        AuditMember::Account(account) => GroupMember::Account(account.id()),
        AuditMember::Group(group) => GroupMember::Group(group.id()),
    }
}

impl<G: RoleGoverned> MembershipTarget for RoleAuditSubject<G> {
    fn membership_edges(&self) -> Vec<(ManagedGroupId, GroupMember)> {
        self.member()
            .member()
            .map(|member| vec![(self.entity().role_group(), group_member(member))])
            .unwrap_or_default()
    }
}

impl MembershipTarget for DbGapAccessSubject {
    fn membership_edges(&self) -> Vec<(ManagedGroupId, GroupMember)> {
        let access_group = GroupMember::Group(self.application().access_group());
        self.workspace()
            .workspace()
            .authorization_domains()
            .iter()
            .map(|domain_id| (*domain_id, access_group))
            .collect()
    }
}

impl MembershipTarget for CollaborativeAnalysisSubject {
    fn membership_edges(&self) -> Vec<(ManagedGroupId, GroupMember)> {
        let member = group_member(self.member());
        self.workspace()
            .workspace()
            .authorization_domains()
            .iter()
            .map(|domain_id| (*domain_id, member))
            .collect()
    }
}

impl MembershipTarget for SignedAgreementSubject {
    fn membership_edges(&self) -> Vec<(ManagedGroupId, GroupMember)> {
        vec![(
            self.cdsa_group().id(),
            GroupMember::Group(self.access_group().id()),
        )]
    }
}

/// Outcome of resolving one audited pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// Name of the audit that produced the result.
    pub audit: &'static str,
    /// The result that was resolved, as audited before any change.
    pub result: AuditTableRow,
    /// Membership changes applied, in order.
    pub changes: Vec<MembershipChange>,
}

/// Audits a single pair and applies the change its result calls for.
#[derive(Clone)]
pub struct AccessResolutionService {
    audits: AccessAuditService,
    writer: Arc<dyn MembershipWriter>,
}

impl AccessResolutionService {
    /// Creates the service.
    #[must_use]
    pub fn new(audits: AccessAuditService, writer: Arc<dyn MembershipWriter>) -> Self {
        Self { audits, writer }
    }

    /// Resolves one pair of an audit kind.
    ///
    /// Verified results and stale snapshot results change nothing. Edges that
    /// already match the requested state are not applied, and a removal that
    /// finds only inherited memberships is a conflict.
    pub async fn resolve(
        &self,
        kind: AuditKind,
        entity: &str,
        member: Option<&str>,
    ) -> AppResult<ResolutionOutcome> {
        match kind {
            AuditKind::Accessors => {
                let scope = build_scope(parse_number_key(Some(entity))?, member)?;
                self.resolve_with(self.audits.accessor_audit(), &scope).await
            }
            AuditKind::Uploaders => {
                let scope = build_scope(parse_number_key(Some(entity))?, member)?;
                self.resolve_with(self.audits.uploader_audit(), &scope).await
            }
            AuditKind::Collaborators => {
                let scope = build_scope(parse_number_key(Some(entity))?, member)?;
                self.resolve_with(self.audits.collaborator_audit(), &scope)
                    .await
            }
            AuditKind::DbGapAccess => {
                let scope = build_scope(parse_number_key(Some(entity))?, member)?;
                self.resolve_with(self.audits.dbgap_access_audit(), &scope)
                    .await
            }
            AuditKind::CollaborativeAnalysis => {
                let scope = build_scope(Some(entity.trim().to_owned()), member)?;
                self.resolve_with(self.audits.collaborative_analysis_audit(), &scope)
                    .await
            }
            AuditKind::SignedAgreements => {
                let scope = build_scope(parse_number_key(Some(entity))?, member)?;
                self.resolve_with(self.audits.signed_agreement_audit(), &scope)
                    .await
            }
        }
    }

    async fn resolve_with<P>(
        &self,
        audit: AccessAudit<P>,
        scope: &AuditScope<P::Key>,
    ) -> AppResult<ResolutionOutcome>
    where
        P: AuditPolicy,
        P::Subject: MembershipTarget,
    {
        let result = audit.run(scope).await?.into_single_result()?;
        let context = self.audits.context();
        let repository = context.repository();
        let directory = context.directory();

        let mut changes = Vec::new();
        let mut inherited = false;
        for (group_id, member) in result.subject().membership_edges() {
            let change = match result.action() {
                Some(AuditAction::GrantAccess) => MembershipChange::Add { group_id, member },
                Some(AuditAction::RemoveAccess) => MembershipChange::Remove { group_id, member },
                Some(AuditAction::UpdateSnapshot) | None => continue,
            };

            let managed = repository
                .find_group(group_id)
                .await?
                .is_some_and(|group| group.is_managed_by_app());
            if !managed {
                continue;
            }

            let is_member = match member {
                GroupMember::Account(account_id) => {
                    directory.is_account_member(group_id, account_id).await?
                }
                GroupMember::Group(child_id) => directory.is_group_member(group_id, child_id).await?,
            };
            match change {
                MembershipChange::Add { .. } if is_member => continue,
                MembershipChange::Remove { .. } if !is_member => {
                    inherited = true;
                    continue;
                }
                _ => {}
            }

            self.writer.apply(change).await?;
            changes.push(change);
        }

        if inherited && changes.is_empty() {
            return Err(AppError::Conflict(format!(
                "'{result}' has no direct membership to remove; access is inherited through a parent group"
            )));
        }

        info!(
            audit = P::NAME,
            outcome = %result,
            changes = changes.len(),
            "audit result resolved"
        );

        Ok(ResolutionOutcome {
            audit: P::NAME,
            result: result.table_row(),
            changes,
        })
    }
}
