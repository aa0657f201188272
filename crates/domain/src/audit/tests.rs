use primed_core::AppError;
use proptest::prelude::*;

use super::{
    AuditAction, AuditFindings, AuditMember, AuditNote, AuditReport, AuditResult, AuditSubject,
    MemberReference,
};
use crate::anvil::{Account, AccountId, ManagedGroup, ManagedGroupId, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestNote {
    Member,
    NotMember,
}

impl AuditNote for TestNote {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "Is a member.",
            Self::NotMember => "Is not a member.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestSubject {
    name: String,
}

impl AuditSubject for TestSubject {
    fn table_columns() -> &'static [&'static str] {
        &["name"]
    }

    fn table_cells(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn audit_key(&self) -> String {
        self.name.clone()
    }

    fn resolve_path(&self) -> Option<String> {
        Some(format!("/resolve/{}/", self.name))
    }
}

fn subject(name: &str) -> TestSubject {
    TestSubject {
        name: name.to_owned(),
    }
}

type TestReport = AuditReport<TestSubject, TestNote>;

fn report_with(verified: usize, needs_action: usize, errors: usize) -> Result<TestReport, AppError> {
    let mut findings = AuditFindings::new();
    for index in 0..verified {
        findings.verified(AuditResult::verified_access(
            subject(&format!("verified-{index}")),
            TestNote::Member,
        ))?;
    }
    for index in 0..needs_action {
        findings.needs_action(AuditResult::grant_access(
            subject(&format!("grant-{index}")),
            TestNote::Member,
        ))?;
    }
    for index in 0..errors {
        findings.error(AuditResult::remove_access(
            subject(&format!("remove-{index}")),
            TestNote::NotMember,
        ))?;
    }
    Ok(findings.finish("TestAudit"))
}

#[test]
fn result_categories_carry_fixed_defaults() {
    let verified = AuditResult::verified_access(subject("a"), TestNote::Member);
    assert!(verified.has_access());
    assert_eq!(verified.action(), None);

    let no_access = AuditResult::verified_no_access(subject("a"), TestNote::NotMember);
    assert!(!no_access.has_access());
    assert_eq!(no_access.action(), None);

    let grant = AuditResult::grant_access(subject("a"), TestNote::Member);
    assert!(!grant.has_access());
    assert_eq!(grant.action(), Some(AuditAction::GrantAccess));

    let remove = AuditResult::remove_access(subject("a"), TestNote::NotMember);
    assert!(remove.has_access());
    assert_eq!(remove.action(), Some(AuditAction::RemoveAccess));
}

#[test]
fn results_describe_themselves() {
    assert_eq!(
        AuditResult::verified_access(subject("a"), TestNote::Member).to_string(),
        "Verified access: Is a member."
    );
    assert_eq!(
        AuditResult::verified_no_access(subject("a"), TestNote::NotMember).to_string(),
        "Verified no access: Is not a member."
    );
    assert_eq!(
        AuditResult::grant_access(subject("a"), TestNote::Member).to_string(),
        "Grant access: Is a member."
    );
    assert_eq!(
        AuditResult::remove_access(subject("a"), TestNote::NotMember).to_string(),
        "Remove access: Is not a member."
    );
}

#[test]
fn table_row_only_links_actionable_results() {
    let verified = AuditResult::verified_access(subject("a"), TestNote::Member).table_row();
    assert_eq!(verified.cell("name"), Some("a"));
    assert_eq!(verified.action, None);
    assert_eq!(verified.resolve_path, None);

    let grant = AuditResult::grant_access(subject("b"), TestNote::Member).table_row();
    assert_eq!(grant.action.as_deref(), Some("Grant access"));
    assert_eq!(grant.resolve_path.as_deref(), Some("/resolve/b/"));
    assert_eq!(grant.note, "Is a member.");
}

#[test]
fn verified_bucket_rejects_actionable_results() {
    let mut findings: AuditFindings<TestSubject, TestNote> = AuditFindings::new();
    let result = findings.verified(AuditResult::grant_access(subject("a"), TestNote::Member));
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn action_buckets_reject_verified_results() {
    let mut findings: AuditFindings<TestSubject, TestNote> = AuditFindings::new();
    let needs_action =
        findings.needs_action(AuditResult::verified_access(subject("a"), TestNote::Member));
    assert!(matches!(needs_action, Err(AppError::Validation(_))));

    let error = findings.error(AuditResult::verified_no_access(subject("b"), TestNote::NotMember));
    assert!(matches!(error, Err(AppError::Validation(_))));
}

#[test]
fn findings_reject_classifying_an_object_twice() {
    let mut findings: AuditFindings<TestSubject, TestNote> = AuditFindings::new();
    let first = findings.verified(AuditResult::verified_access(subject("a"), TestNote::Member));
    assert!(first.is_ok());

    let second = findings.error(AuditResult::remove_access(subject("a"), TestNote::NotMember));
    assert!(matches!(second, Err(AppError::Internal(_))));
}

#[test]
fn ok_is_stable_across_calls() -> Result<(), AppError> {
    let report = report_with(1, 1, 0)?;
    assert!(!report.ok());
    assert!(!report.ok());

    let clean = report_with(2, 0, 0)?;
    assert!(clean.ok());
    assert!(clean.ok());
    Ok(())
}

#[test]
fn all_results_lists_buckets_in_order() -> Result<(), AppError> {
    let report = report_with(1, 1, 1)?;
    let labels: Vec<&str> = report.all_results().iter().map(|result| result.label()).collect();
    assert_eq!(labels, ["Verified access", "Grant access", "Remove access"]);
    Ok(())
}

#[test]
fn single_result_requires_exactly_one_result() -> Result<(), AppError> {
    assert!(report_with(0, 0, 0)?.into_single_result().is_err());
    assert!(report_with(1, 1, 0)?.into_single_result().is_err());

    let single = report_with(0, 0, 1)?.into_single_result()?;
    assert_eq!(single.action(), Some(AuditAction::RemoveAccess));
    Ok(())
}

#[test]
fn member_reference_requires_linked_account() -> Result<(), AppError> {
    let user = User::new(UserId::new(), "alice@example.org", "Alice")?;
    let linked = Account::new(AccountId::new(), "alice@example.org", Some(user.id()))?;
    let other = Account::new(AccountId::new(), "bob@example.org", Some(UserId::new()))?;

    assert!(MemberReference::new(Some(user.clone()), Some(AuditMember::Account(linked))).is_ok());
    assert!(
        MemberReference::new(Some(user.clone()), Some(AuditMember::Account(other))).is_err()
    );
    Ok(())
}

#[test]
fn member_reference_rejects_group_with_user() -> Result<(), AppError> {
    let user = User::new(UserId::new(), "alice@example.org", "Alice")?;
    let group = ManagedGroup::new(ManagedGroupId::new(), "SOME_GROUP", true)?;

    assert!(MemberReference::new(Some(user), Some(AuditMember::Group(group.clone()))).is_err());
    assert!(MemberReference::new(None, Some(AuditMember::Group(group))).is_ok());
    assert!(MemberReference::new(None, None).is_err());
    Ok(())
}

proptest! {
    #[test]
    fn table_rows_match_bucket_sizes(verified in 0usize..4, needs_action in 0usize..4, errors in 0usize..4) {
        let report = report_with(verified, needs_action, errors);
        prop_assert!(report.is_ok());
        if let Ok(report) = report {
            prop_assert_eq!(report.verified_table().len(), report.verified().len());
            prop_assert_eq!(report.needs_action_table().len(), report.needs_action().len());
            prop_assert_eq!(report.errors_table().len(), report.errors().len());
            prop_assert_eq!(report.all_results().len(), verified + needs_action + errors);
            prop_assert_eq!(report.ok(), needs_action + errors == 0);
        }
    }
}
