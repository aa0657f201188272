//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod in_memory_governance_store;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use in_memory_governance_store::{
    AccountMembershipRecord, AccountRecord, CollaborativeAnalysisWorkspaceRecord,
    DataAffiliateAgreementRecord, DbGapApplicationRecord, DbGapRequestRecord, DbGapSnapshotRecord,
    DbGapWorkspaceRecord, GovernanceExport, GroupMembershipRecord, GroupRecord,
    InMemoryGovernanceStore, SignedAgreementRecord, UserRecord, WorkspaceRecord,
};
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
