//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod anvil;
mod audit;
mod cdsa;
mod collaborative_analysis;
mod dbgap;
mod ids;

pub use anvil::{
    Account, AccountId, EmailAddress, ManagedGroup, ManagedGroupId, User, UserId, Workspace,
    WorkspaceId,
};
pub use audit::{
    AuditAction, AuditBucket, AuditCounts, AuditFindings, AuditMember, AuditNote, AuditOverview,
    AuditReport, AuditResult, AuditSubject, AuditTable, AuditTableCell, AuditTableRow,
    MemberReference,
};
pub use cdsa::{
    AgreementStatus, AgreementType, DataAffiliateAgreement, SignedAgreement, SignedAgreementId,
    SignedAgreementInput,
};
pub use collaborative_analysis::CollaborativeAnalysisWorkspace;
pub use dbgap::{
    ConsentedStudyVersion, DarStatus, DbGapApplication, DbGapApplicationId,
    DbGapDataAccessRequest, DbGapDataAccessSnapshot, DbGapSnapshotId, DbGapWorkspace,
};
