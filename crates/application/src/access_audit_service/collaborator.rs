use async_trait::async_trait;
use primed_core::AppResult;
use primed_domain::{AuditNote, AuditReport, DbGapApplication, EmailAddress, ManagedGroupId, UserId};

use super::role_audit::{RoleAuditPolicy, RoleAuditSubject, RoleGoverned, RoleNotes};
use crate::GovernanceRepository;

/// Reasons reported by the dbGaP collaborator audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaboratorNote {
    /// PI or collaborator's account is in the access group.
    InAccessGroup,
    /// PI or collaborator has an account that is not in the access group yet.
    LinkedAccount,
    /// PI or collaborator has no linked account.
    NoAccount,
    /// Person is neither the PI nor a collaborator.
    NotCollaborator,
    /// Account is not linked to a user.
    AccountNotLinked,
    /// A group is a member of the access group.
    UnexpectedGroup,
    /// An administrative group.
    AdministrativeGroup,
}

impl AuditNote for CollaboratorNote {
    fn as_str(&self) -> &'static str {
        match self {
            Self::InAccessGroup => "PI or collaborator is in the access group.",
            Self::LinkedAccount => "PI or collaborator has a linked account.",
            Self::NoAccount => "PI or collaborator does not have a linked account.",
            Self::NotCollaborator => "Not a PI or collaborator.",
            Self::AccountNotLinked => "Account is not linked to a user.",
            Self::UnexpectedGroup => "Groups should not have access.",
            Self::AdministrativeGroup => "Administrative group.",
        }
    }
}

impl RoleNotes for CollaboratorNote {
    const IN_GROUP: Self = Self::InAccessGroup;
    const LINKED_ACCOUNT: Self = Self::LinkedAccount;
    const NO_ACCOUNT: Self = Self::NoAccount;
    const NOT_IN_ROLE: Self = Self::NotCollaborator;
    const ACCOUNT_NOT_LINKED: Self = Self::AccountNotLinked;
    const UNEXPECTED_GROUP: Self = Self::UnexpectedGroup;
    const ADMINISTRATIVE_GROUP: Self = Self::AdministrativeGroup;
}

#[async_trait]
impl RoleGoverned for DbGapApplication {
    type Note = CollaboratorNote;

    const AUDIT_NAME: &'static str = "CollaboratorAudit";
    const ENTITY_LABEL: &'static str = "dbGaP application";
    const TABLE_COLUMNS: &'static [&'static str] = &["dbgap_application", "user", "member"];

    async fn list_entities(repository: &dyn GovernanceRepository) -> AppResult<Vec<Self>> {
        repository.list_dbgap_applications().await
    }

    fn role_key(&self) -> u32 {
        self.project_id()
    }

    fn role_holders(&self) -> Vec<UserId> {
        std::iter::once(self.principal_investigator())
            .chain(self.collaborators().iter().copied())
            .collect()
    }

    fn role_group(&self) -> ManagedGroupId {
        self.access_group()
    }

    fn resolve_path(&self, member_email: &EmailAddress) -> String {
        format!(
            "/dbgap/audit/collaborators/resolve/{}/{}/",
            self.project_id(),
            member_email
        )
    }
}

/// Subject of collaborator audit results.
pub type CollaboratorAuditSubject = RoleAuditSubject<DbGapApplication>;
/// Completed collaborator audit.
pub type CollaboratorAuditReport = AuditReport<CollaboratorAuditSubject, CollaboratorNote>;

/// Checks that each dbGaP application's access group holds exactly the PI's
/// and collaborators' accounts. Entities are keyed by dbGaP project id.
pub type CollaboratorAuditPolicy = RoleAuditPolicy<DbGapApplication>;
