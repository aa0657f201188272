//! Access reconciliation audits.
//!
//! An [`AuditPolicy`] knows how to compare desired and actual access for
//! one kind of governing entity. [`AccessAudit`] drives a policy through a
//! single pass and hands back an immutable [`AuditReport`], so results can
//! never be read from a half-finished run.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use primed_core::{AppError, AppResult};
use primed_domain::{AuditFindings, AuditNote, AuditOverview, AuditReport, AuditSubject};
use tracing::info;

use crate::{AccessControlDirectory, GovernanceRepository};

mod accessor;
mod collaborative_analysis;
mod collaborator;
mod dbgap;
mod identity;
mod kind;
mod membership;
mod role_audit;
mod scope;
mod settings;
mod signed_agreement;
mod uploader;


pub use accessor::{AccessorAuditPolicy, AccessorAuditReport, AccessorAuditSubject, AccessorNote};
pub use collaborative_analysis::{
    CollaborativeAnalysisAuditPolicy, CollaborativeAnalysisAuditReport, CollaborativeAnalysisNote,
    CollaborativeAnalysisSubject,
};
pub use collaborator::{
    CollaboratorAuditPolicy, CollaboratorAuditReport, CollaboratorAuditSubject, CollaboratorNote,
};
pub use dbgap::{
    DbGapAccessAuditPolicy, DbGapAccessAuditReport, DbGapAccessNote, DbGapAccessSubject,
};
pub use identity::{ResolvedMember, resolve_member};
pub use kind::AuditKind;
pub use role_audit::{RoleAuditPolicy, RoleAuditSubject, RoleGoverned, RoleNotes};
pub use scope::{AuditScope, EntityScope};
pub use settings::{
    AuditSettings, DEFAULT_CC_ADMINS_GROUP, DEFAULT_CDSA_GROUP, DEFAULT_PLATFORM_ADMINS_GROUP,
    DEFAULT_SNAPSHOT_MAX_AGE_DAYS,
};
pub use signed_agreement::{
    SignedAgreementAuditPolicy, SignedAgreementAuditReport, SignedAgreementNote,
    SignedAgreementSubject,
};
pub use uploader::{UploaderAuditPolicy, UploaderAuditReport, UploaderAuditSubject, UploaderNote};

/// Collaborators every audit policy reads from.
#[derive(Clone)]
pub struct AuditContext {
    repository: Arc<dyn GovernanceRepository>,
    directory: Arc<dyn AccessControlDirectory>,
    settings: AuditSettings,
}

impl AuditContext {
    /// Creates a context from its ports and settings.
    #[must_use]
    pub fn new(
        repository: Arc<dyn GovernanceRepository>,
        directory: Arc<dyn AccessControlDirectory>,
        settings: AuditSettings,
    ) -> Self {
        Self {
            repository,
            directory,
            settings,
        }
    }

    /// Returns the governance records port.
    #[must_use]
    pub fn repository(&self) -> &dyn GovernanceRepository {
        self.repository.as_ref()
    }

    /// Returns the membership port.
    #[must_use]
    pub fn directory(&self) -> &dyn AccessControlDirectory {
        self.directory.as_ref()
    }

    /// Returns the shared audit settings.
    #[must_use]
    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }
}

/// One kind of reconciliation audit.
#[async_trait]
pub trait AuditPolicy: Send + Sync {
    /// Key selecting governing entities in a scope.
    type Key: PartialEq + Display + Send + Sync;
    /// Object each result is about.
    type Subject: AuditSubject;
    /// Reasons this policy reports.
    type Note: AuditNote;

    /// Name used in logs, reports and notifications.
    const NAME: &'static str;

    /// Classifies every object in scope into `findings`.
    async fn audit_pass(
        &self,
        scope: &AuditScope<Self::Key>,
        findings: &mut AuditFindings<Self::Subject, Self::Note>,
    ) -> AppResult<()>;
}

/// Runs a policy and freezes its findings into a report.
#[derive(Clone)]
pub struct AccessAudit<P> {
    policy: P,
}

impl<P: AuditPolicy> AccessAudit<P> {
    /// Creates a driver for a policy.
    #[must_use]
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// Returns the policy being driven.
    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Runs one complete pass over the scope.
    pub async fn run(
        &self,
        scope: &AuditScope<P::Key>,
    ) -> AppResult<AuditReport<P::Subject, P::Note>> {
        info!(audit = P::NAME, member = scope.member(), "access audit started");

        let mut findings = AuditFindings::new();
        self.policy.audit_pass(scope, &mut findings).await?;
        let report = findings.finish(P::NAME);

        let counts = report.counts();
        info!(
            audit = P::NAME,
            ok = report.ok(),
            verified = counts.verified,
            needs_action = counts.needs_action,
            errors = counts.errors,
            "access audit completed"
        );

        Ok(report)
    }
}

/// Narrows a list of entities to a scope; every requested key must exist.
fn select_entities<E, K>(
    entities: Vec<E>,
    scope: &EntityScope<K>,
    key: impl Fn(&E) -> K,
    label: &str,
) -> AppResult<Vec<E>>
where
    K: PartialEq + Display,
{
    let EntityScope::Only(wanted) = scope else {
        return Ok(entities);
    };

    if let Some(missing) = wanted
        .iter()
        .find(|wanted| !entities.iter().any(|entity| key(entity) == **wanted))
    {
        return Err(AppError::NotFound(format!("{label} '{missing}' does not exist")));
    }

    Ok(entities
        .into_iter()
        .filter(|entity| scope.includes(&key(entity)))
        .collect())
}

/// Entry point running any audit kind by name.
#[derive(Clone)]
pub struct AccessAuditService {
    context: AuditContext,
}

impl AccessAuditService {
    /// Creates the service.
    #[must_use]
    pub fn new(context: AuditContext) -> Self {
        Self { context }
    }

    /// Returns the shared audit context.
    #[must_use]
    pub fn context(&self) -> &AuditContext {
        &self.context
    }

    /// Builds the accessor audit.
    #[must_use]
    pub fn accessor_audit(&self) -> AccessAudit<AccessorAuditPolicy> {
        AccessAudit::new(AccessorAuditPolicy::new(self.context.clone()))
    }

    /// Builds the uploader audit.
    #[must_use]
    pub fn uploader_audit(&self) -> AccessAudit<UploaderAuditPolicy> {
        AccessAudit::new(UploaderAuditPolicy::new(self.context.clone()))
    }

    /// Builds the dbGaP collaborator audit.
    #[must_use]
    pub fn collaborator_audit(&self) -> AccessAudit<CollaboratorAuditPolicy> {
        AccessAudit::new(CollaboratorAuditPolicy::new(self.context.clone()))
    }

    /// Builds the dbGaP access audit.
    #[must_use]
    pub fn dbgap_access_audit(&self) -> AccessAudit<DbGapAccessAuditPolicy> {
        AccessAudit::new(DbGapAccessAuditPolicy::new(self.context.clone()))
    }

    /// Builds the collaborative analysis workspace access audit.
    #[must_use]
    pub fn collaborative_analysis_audit(&self) -> AccessAudit<CollaborativeAnalysisAuditPolicy> {
        AccessAudit::new(CollaborativeAnalysisAuditPolicy::new(self.context.clone()))
    }

    /// Builds the signed agreement CDSA audit.
    #[must_use]
    pub fn signed_agreement_audit(&self) -> AccessAudit<SignedAgreementAuditPolicy> {
        AccessAudit::new(SignedAgreementAuditPolicy::new(self.context.clone()))
    }

    /// Runs an audit kind with raw scope values and returns its tables.
    ///
    /// `entity` is the cc_id, dbGaP project id or `billing_project/name`
    /// depending on the kind; `member` narrows the run to one pair.
    pub async fn run_overview(
        &self,
        kind: AuditKind,
        entity: Option<&str>,
        member: Option<&str>,
    ) -> AppResult<AuditOverview> {
        match kind {
            AuditKind::Accessors => {
                let scope = build_scope(parse_number_key(entity)?, member)?;
                Ok(self.accessor_audit().run(&scope).await?.overview())
            }
            AuditKind::Uploaders => {
                let scope = build_scope(parse_number_key(entity)?, member)?;
                Ok(self.uploader_audit().run(&scope).await?.overview())
            }
            AuditKind::Collaborators => {
                let scope = build_scope(parse_number_key(entity)?, member)?;
                Ok(self.collaborator_audit().run(&scope).await?.overview())
            }
            AuditKind::DbGapAccess => {
                let scope = build_scope(parse_number_key(entity)?, member)?;
                Ok(self.dbgap_access_audit().run(&scope).await?.overview())
            }
            AuditKind::CollaborativeAnalysis => {
                let entity = entity.map(|value| value.trim().to_owned());
                let scope = build_scope(entity, member)?;
                Ok(self
                    .collaborative_analysis_audit()
                    .run(&scope)
                    .await?
                    .overview())
            }
            AuditKind::SignedAgreements => {
                let scope = build_scope(parse_number_key(entity)?, member)?;
                Ok(self.signed_agreement_audit().run(&scope).await?.overview())
            }
        }
    }
}

pub(crate) fn parse_number_key(value: Option<&str>) -> AppResult<Option<u32>> {
    value
        .map(|raw| {
            raw.trim().parse::<u32>().map_err(|error| {
                AppError::Validation(format!("'{raw}' is not a valid identifier: {error}"))
            })
        })
        .transpose()
}

pub(crate) fn build_scope<K: PartialEq>(
    entity: Option<K>,
    member: Option<&str>,
) -> AppResult<AuditScope<K>> {
    match (entity, member) {
        (None, None) => Ok(AuditScope::all()),
        (Some(key), None) => Ok(AuditScope::one(key)),
        (Some(key), Some(member)) => Ok(AuditScope::pair(key, member)),
        (None, Some(member)) => Err(AppError::Validation(format!(
            "member '{member}' can only be audited together with an entity"
        ))),
    }
}
