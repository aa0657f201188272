//! Application services and ports.

#![forbid(unsafe_code)]

mod access_audit_service;
mod access_resolution_service;
mod audit_notification_service;
mod governance_ports;

#[cfg(test)]
mod test_support;

pub use access_audit_service::{
    AccessAudit, AccessAuditService, AccessorAuditPolicy, AccessorAuditReport,
    AccessorAuditSubject, AccessorNote, AuditContext, AuditKind, AuditPolicy, AuditScope,
    AuditSettings, CollaborativeAnalysisAuditPolicy, CollaborativeAnalysisAuditReport,
    CollaborativeAnalysisNote, CollaborativeAnalysisSubject, CollaboratorAuditPolicy,
    CollaboratorAuditReport, CollaboratorAuditSubject, CollaboratorNote, DEFAULT_CC_ADMINS_GROUP,
    DEFAULT_CDSA_GROUP, DEFAULT_PLATFORM_ADMINS_GROUP, DEFAULT_SNAPSHOT_MAX_AGE_DAYS,
    DbGapAccessAuditPolicy, DbGapAccessAuditReport, DbGapAccessNote, DbGapAccessSubject,
    EntityScope, ResolvedMember, RoleAuditPolicy, RoleAuditSubject, RoleGoverned, RoleNotes,
    SignedAgreementAuditPolicy, SignedAgreementAuditReport, SignedAgreementNote,
    SignedAgreementSubject, UploaderAuditPolicy, UploaderAuditReport, UploaderAuditSubject,
    UploaderNote, resolve_member,
};
pub use access_resolution_service::{AccessResolutionService, MembershipTarget, ResolutionOutcome};
pub use audit_notification_service::{AuditNotificationService, EmailService};
pub use governance_ports::{
    AccessControlDirectory, GovernanceRepository, GroupMember, MembershipChange, MembershipWriter,
};
