use async_trait::async_trait;
use primed_core::AppResult;
use primed_domain::{
    AuditNote, AuditReport, DataAffiliateAgreement, EmailAddress, ManagedGroupId, UserId,
};

use super::role_audit::{RoleAuditPolicy, RoleAuditSubject, RoleGoverned, RoleNotes};
use crate::GovernanceRepository;

/// Reasons reported by the uploader audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploaderNote {
    /// Uploader's account is in the upload group.
    InUploadGroup,
    /// Uploader has an account that is not in the upload group yet.
    LinkedAccount,
    /// Uploader has no linked account.
    NoAccount,
    /// Person is not an uploader on the agreement.
    NotUploader,
    /// Account is not linked to a user.
    AccountNotLinked,
    /// A group is a member of the upload group.
    UnexpectedGroup,
    /// An administrative group.
    AdministrativeGroup,
}

impl AuditNote for UploaderNote {
    fn as_str(&self) -> &'static str {
        match self {
            Self::InUploadGroup => "Uploader is in the upload group.",
            Self::LinkedAccount => "Uploader has a linked account.",
            Self::NoAccount => "Uploader does not have a linked account.",
            Self::NotUploader => "Not an uploader.",
            Self::AccountNotLinked => "Account is not linked to a user.",
            Self::UnexpectedGroup => "Groups should not have access.",
            Self::AdministrativeGroup => "Administrative group.",
        }
    }
}

impl RoleNotes for UploaderNote {
    const IN_GROUP: Self = Self::InUploadGroup;
    const LINKED_ACCOUNT: Self = Self::LinkedAccount;
    const NO_ACCOUNT: Self = Self::NoAccount;
    const NOT_IN_ROLE: Self = Self::NotUploader;
    const ACCOUNT_NOT_LINKED: Self = Self::AccountNotLinked;
    const UNEXPECTED_GROUP: Self = Self::UnexpectedGroup;
    const ADMINISTRATIVE_GROUP: Self = Self::AdministrativeGroup;
}

#[async_trait]
impl RoleGoverned for DataAffiliateAgreement {
    type Note = UploaderNote;

    const AUDIT_NAME: &'static str = "UploaderAudit";
    const ENTITY_LABEL: &'static str = "data affiliate agreement";
    const TABLE_COLUMNS: &'static [&'static str] = &["data_affiliate_agreement", "user", "member"];

    async fn list_entities(repository: &dyn GovernanceRepository) -> AppResult<Vec<Self>> {
        repository.list_data_affiliate_agreements().await
    }

    fn role_key(&self) -> u32 {
        self.signed_agreement().cc_id()
    }

    fn role_holders(&self) -> Vec<UserId> {
        self.uploaders().to_vec()
    }

    fn role_group(&self) -> ManagedGroupId {
        self.upload_group()
    }

    fn resolve_path(&self, member_email: &EmailAddress) -> String {
        format!(
            "/cdsa/audit/signed_agreements/uploaders/resolve/{}/{}/",
            self.signed_agreement().cc_id(),
            member_email
        )
    }
}

/// Subject of uploader audit results.
pub type UploaderAuditSubject = RoleAuditSubject<DataAffiliateAgreement>;
/// Completed uploader audit.
pub type UploaderAuditReport = AuditReport<UploaderAuditSubject, UploaderNote>;

/// Checks that each data affiliate agreement's upload group holds exactly
/// its uploaders' accounts. Entities are keyed by cc_id.
pub type UploaderAuditPolicy = RoleAuditPolicy<DataAffiliateAgreement>;
