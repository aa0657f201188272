use async_trait::async_trait;
use primed_core::AppResult;
use primed_domain::{AuditNote, AuditReport, EmailAddress, ManagedGroupId, SignedAgreement, UserId};

use super::role_audit::{RoleAuditPolicy, RoleAuditSubject, RoleGoverned, RoleNotes};
use crate::GovernanceRepository;

/// Reasons reported by the accessor audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorNote {
    /// Accessor's account is in the access group.
    InAccessGroup,
    /// Accessor has an account that is not in the access group yet.
    LinkedAccount,
    /// Accessor has no linked account.
    NoAccount,
    /// Person is not an accessor on the agreement.
    NotAccessor,
    /// Account is not linked to a user.
    AccountNotLinked,
    /// A group is a member of the access group.
    UnexpectedGroup,
    /// An administrative group.
    AdministrativeGroup,
}

impl AuditNote for AccessorNote {
    fn as_str(&self) -> &'static str {
        match self {
            Self::InAccessGroup => "Accessor is in the access group.",
            Self::LinkedAccount => "Accessor has a linked account.",
            Self::NoAccount => "Accessor does not have a linked account.",
            Self::NotAccessor => "Not an accessor.",
            Self::AccountNotLinked => "Account is not linked to a user.",
            Self::UnexpectedGroup => "Groups should not have access.",
            Self::AdministrativeGroup => "Administrative group.",
        }
    }
}

impl RoleNotes for AccessorNote {
    const IN_GROUP: Self = Self::InAccessGroup;
    const LINKED_ACCOUNT: Self = Self::LinkedAccount;
    const NO_ACCOUNT: Self = Self::NoAccount;
    const NOT_IN_ROLE: Self = Self::NotAccessor;
    const ACCOUNT_NOT_LINKED: Self = Self::AccountNotLinked;
    const UNEXPECTED_GROUP: Self = Self::UnexpectedGroup;
    const ADMINISTRATIVE_GROUP: Self = Self::AdministrativeGroup;
}

#[async_trait]
impl RoleGoverned for SignedAgreement {
    type Note = AccessorNote;

    const AUDIT_NAME: &'static str = "AccessorAudit";
    const ENTITY_LABEL: &'static str = "signed agreement";
    const TABLE_COLUMNS: &'static [&'static str] = &["signed_agreement", "user", "member"];

    async fn list_entities(repository: &dyn GovernanceRepository) -> AppResult<Vec<Self>> {
        repository.list_signed_agreements().await
    }

    fn role_key(&self) -> u32 {
        self.cc_id()
    }

    fn role_holders(&self) -> Vec<UserId> {
        self.accessors().to_vec()
    }

    fn role_group(&self) -> ManagedGroupId {
        self.access_group()
    }

    fn resolve_path(&self, member_email: &EmailAddress) -> String {
        format!(
            "/cdsa/audit/signed_agreements/accessors/resolve/{}/{}/",
            self.cc_id(),
            member_email
        )
    }
}

/// Subject of accessor audit results.
pub type AccessorAuditSubject = RoleAuditSubject<SignedAgreement>;
/// Completed accessor audit.
pub type AccessorAuditReport = AuditReport<AccessorAuditSubject, AccessorNote>;

/// Checks that each signed agreement's access group holds exactly its
/// accessors' accounts. Entities are keyed by cc_id.
pub type AccessorAuditPolicy = RoleAuditPolicy<SignedAgreement>;
