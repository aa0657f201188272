use async_trait::async_trait;
use primed_core::{AppError, AppResult};
use primed_domain::{
    AgreementType, AuditFindings, AuditNote, AuditReport, AuditResult, AuditSubject, ManagedGroup,
    SignedAgreement,
};

use super::membership::require_group;
use super::{AuditContext, AuditPolicy, AuditScope, select_entities};

/// Reasons reported by the signed agreement CDSA audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignedAgreementNote {
    /// Active primary agreement.
    ActivePrimary,
    /// Active component agreement whose primary agreement is active.
    ActiveComponent,
    /// Component agreement without an active primary agreement.
    NoActivePrimary,
    /// Agreement is not active.
    Inactive,
    /// Non-data affiliate agreements cannot be components.
    ComponentNonDataAffiliate,
}

impl AuditNote for SignedAgreementNote {
    fn as_str(&self) -> &'static str {
        match self {
            Self::ActivePrimary => "Active primary agreement.",
            Self::ActiveComponent => "Active component agreement with an active primary.",
            Self::NoActivePrimary => "Component agreement has no active primary agreement.",
            Self::Inactive => "Agreement is not active.",
            Self::ComponentNonDataAffiliate => {
                "Non-data affiliate agreements cannot be component agreements."
            }
        }
    }
}

/// One signed agreement and its access group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAgreementSubject {
    agreement: SignedAgreement,
    access_group: ManagedGroup,
    cdsa_group: ManagedGroup,
}

impl SignedAgreementSubject {
    /// Returns the agreement.
    #[must_use]
    pub fn agreement(&self) -> &SignedAgreement {
        &self.agreement
    }

    /// Returns the agreement's access group.
    #[must_use]
    pub fn access_group(&self) -> &ManagedGroup {
        &self.access_group
    }

    /// Returns the group the access group should belong to.
    #[must_use]
    pub fn cdsa_group(&self) -> &ManagedGroup {
        &self.cdsa_group
    }
}

impl AuditSubject for SignedAgreementSubject {
    fn table_columns() -> &'static [&'static str] {
        &["signed_agreement", "agreement_type", "access_group"]
    }

    fn table_cells(&self) -> Vec<String> {
        vec![
            self.agreement.cc_id().to_string(),
            self.agreement.agreement_type().as_str().to_owned(),
            self.access_group.name().to_owned(),
        ]
    }

    fn audit_key(&self) -> String {
        self.agreement.id().to_string()
    }

    fn resolve_path(&self) -> Option<String> {
        Some(format!(
            "/cdsa/audit/signed_agreements/sag/resolve/{}/",
            self.agreement.cc_id()
        ))
    }
}

/// Completed signed agreement CDSA audit.
pub type SignedAgreementAuditReport = AuditReport<SignedAgreementSubject, SignedAgreementNote>;

/// Checks that the CDSA group contains the access groups of exactly the
/// agreements in force. Entities are keyed by cc_id.
#[derive(Clone)]
pub struct SignedAgreementAuditPolicy {
    context: AuditContext,
}

impl SignedAgreementAuditPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new(context: AuditContext) -> Self {
        Self { context }
    }
}

/// Decides whether an agreement's group should be in the CDSA group.
fn expected_access(
    agreement: &SignedAgreement,
    all_agreements: &[SignedAgreement],
) -> (bool, SignedAgreementNote) {
    if !agreement.is_active() {
        return (false, SignedAgreementNote::Inactive);
    }
    if agreement.is_primary() {
        return (true, SignedAgreementNote::ActivePrimary);
    }
    if matches!(
        agreement.agreement_type(),
        AgreementType::NonDataAffiliate { .. }
    ) {
        return (false, SignedAgreementNote::ComponentNonDataAffiliate);
    }

    let has_active_primary = all_agreements.iter().any(|primary| {
        primary.is_primary()
            && primary.is_active()
            && agreement
                .agreement_type()
                .is_covered_by(primary.agreement_type())
    });
    if has_active_primary {
        (true, SignedAgreementNote::ActiveComponent)
    } else {
        (false, SignedAgreementNote::NoActivePrimary)
    }
}

#[async_trait]
impl AuditPolicy for SignedAgreementAuditPolicy {
    type Key = u32;
    type Subject = SignedAgreementSubject;
    type Note = SignedAgreementNote;

    const NAME: &'static str = "SignedAgreementAccessAudit";

    async fn audit_pass(
        &self,
        scope: &AuditScope<u32>,
        findings: &mut AuditFindings<Self::Subject, Self::Note>,
    ) -> AppResult<()> {
        if scope.member().is_some() {
            return Err(AppError::Validation(
                "the signed agreement audit does not take a member".to_owned(),
            ));
        }

        let repository = self.context.repository();
        let cdsa_group_name = self.context.settings().cdsa_group();
        let cdsa_group = repository
            .find_group_by_name(cdsa_group_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("CDSA group '{cdsa_group_name}' does not exist"))
            })?;

        let all_agreements = repository.list_signed_agreements().await?;
        let agreements = select_entities(
            all_agreements.clone(),
            scope.entities(),
            SignedAgreement::cc_id,
            "signed agreement",
        )?;

        for agreement in agreements {
            let access_group = require_group(repository, agreement.access_group()).await?;
            let has_access = self
                .context
                .directory()
                .is_group_member(cdsa_group.id(), access_group.id())
                .await?;
            let (should_have_access, note) = expected_access(&agreement, &all_agreements);
            let subject = SignedAgreementSubject {
                agreement,
                access_group,
                cdsa_group: cdsa_group.clone(),
            };

            match (should_have_access, has_access) {
                (true, true) => findings.verified(AuditResult::verified_access(subject, note))?,
                (true, false) => findings.needs_action(AuditResult::grant_access(subject, note))?,
                (false, true) if note == SignedAgreementNote::ComponentNonDataAffiliate => {
                    findings.error(AuditResult::remove_access(subject, note))?
                }
                (false, true) => findings.needs_action(AuditResult::remove_access(subject, note))?,
                (false, false) => {
                    findings.verified(AuditResult::verified_no_access(subject, note))?
                }
            }
        }

        Ok(())
    }
}
