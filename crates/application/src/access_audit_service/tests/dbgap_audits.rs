use chrono::{Duration, Utc};
use primed_core::{AppError, AppResult};
use primed_domain::{AuditAction, AuditResult, DarStatus, DbGapApplication, ManagedGroup};

use crate::test_support::{FakeGovernance, FakeState, context_for, study};
use crate::{AccessAuditService, AuditScope, DbGapAccessAuditReport, DbGapAccessNote};

struct Fixture {
    state: FakeState,
    application: DbGapApplication,
    access_group: ManagedGroup,
    auth_domain: ManagedGroup,
}

fn fixture() -> AppResult<Fixture> {
    let mut state = FakeState::default();
    let pi = state.user("pi@example.org")?;
    let (application, access_group) = state.dbgap_application(33119, &pi, &[])?;
    let auth_domain = state.group("AUTH_FHS_V32_GRU")?;
    state.dbgap_workspace(
        "fhs_v32_gru",
        Utc::now() - Duration::days(100),
        &[&auth_domain],
        study(32, 13, "GRU"),
    )?;

    Ok(Fixture {
        state,
        application,
        access_group,
        auth_domain,
    })
}

async fn run(state: FakeState) -> AppResult<DbGapAccessAuditReport> {
    let store = FakeGovernance::new(state);
    AccessAuditService::new(context_for(&store))
        .dbgap_access_audit()
        .run(&AuditScope::all())
        .await
}

fn only_note(report: &DbGapAccessAuditReport) -> Option<DbGapAccessNote> {
    match report.all_results().as_slice() {
        [result] => Some(result.note()),
        _ => None,
    }
}

#[tokio::test]
async fn approved_dar_with_access_is_verified() -> AppResult<()> {
    let mut fixture = fixture()?;
    let snapshot = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&snapshot, 1234, study(32, 13, "GRU"), DarStatus::Approved)?;
    fixture
        .state
        .add_group(&fixture.auth_domain, &fixture.access_group);

    let report = run(fixture.state).await?;

    assert!(report.ok());
    assert_eq!(only_note(&report), Some(DbGapAccessNote::ApprovedDar));
    assert_eq!(
        report
            .verified_table()
            .rows
            .first()
            .and_then(|row| row.cell("data_access_request").map(str::to_owned)),
        Some("1234".to_owned())
    );
    Ok(())
}

#[tokio::test]
async fn approved_dar_without_access_needs_grant() -> AppResult<()> {
    let mut fixture = fixture()?;
    let snapshot = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&snapshot, 1234, study(30, 12, "GRU"), DarStatus::Approved)?;

    let report = run(fixture.state).await?;

    assert_eq!(only_note(&report), Some(DbGapAccessNote::NewApprovedDar));
    assert_eq!(
        report.needs_action().first().and_then(AuditResult::action),
        Some(AuditAction::GrantAccess)
    );
    let table = report.needs_action_table();
    assert_eq!(
        table.rows.first().and_then(|row| row.resolve_path.as_deref()),
        Some("/dbgap/audit/access/resolve/33119/primed-dbgap/fhs_v32_gru/")
    );
    Ok(())
}

#[tokio::test]
async fn workspace_newer_than_snapshot_is_a_new_workspace() -> AppResult<()> {
    let mut state = FakeState::default();
    let pi = state.user("pi@example.org")?;
    let (application, _) = state.dbgap_application(33119, &pi, &[])?;
    let auth_domain = state.group("AUTH_NEW")?;
    state.dbgap_workspace("fhs_new", Utc::now(), &[&auth_domain], study(32, 13, "GRU"))?;
    let snapshot = state.snapshot(&application, Duration::days(2), true);
    state.request(&snapshot, 1234, study(32, 13, "GRU"), DarStatus::Approved)?;

    let report = run(state).await?;

    assert_eq!(only_note(&report), Some(DbGapAccessNote::NewWorkspace));
    Ok(())
}

#[tokio::test]
async fn previously_approved_dar_with_access_needs_removal() -> AppResult<()> {
    let mut fixture = fixture()?;
    let earlier = fixture
        .state
        .snapshot(&fixture.application, Duration::days(20), false);
    fixture
        .state
        .request(&earlier, 1234, study(32, 13, "GRU"), DarStatus::Approved)?;
    let latest = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&latest, 1234, study(32, 13, "GRU"), DarStatus::Closed)?;
    fixture
        .state
        .add_group(&fixture.auth_domain, &fixture.access_group);

    let report = run(fixture.state).await?;

    assert_eq!(only_note(&report), Some(DbGapAccessNote::PreviouslyApproved));
    assert_eq!(report.needs_action().len(), 1);
    assert!(report.errors().is_empty());
    Ok(())
}

#[tokio::test]
async fn unexplained_access_is_an_error() -> AppResult<()> {
    let mut fixture = fixture()?;
    let latest = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&latest, 1234, study(32, 13, "GRU"), DarStatus::Rejected)?;
    fixture
        .state
        .add_group(&fixture.auth_domain, &fixture.access_group);

    let report = run(fixture.state).await?;

    assert_eq!(
        only_note(&report),
        Some(DbGapAccessNote::HasAccessUnknownReason)
    );
    assert_eq!(report.errors().len(), 1);
    Ok(())
}

#[tokio::test]
async fn unapproved_dar_without_access_is_verified() -> AppResult<()> {
    let mut fixture = fixture()?;
    let latest = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&latest, 1234, study(32, 13, "GRU"), DarStatus::Expired)?;

    let report = run(fixture.state).await?;

    assert!(report.ok());
    assert_eq!(only_note(&report), Some(DbGapAccessNote::DarNotApproved));
    Ok(())
}

#[tokio::test]
async fn missing_snapshot_depends_on_access() -> AppResult<()> {
    let fixture = fixture()?;
    let report = run(fixture.state).await?;
    assert_eq!(only_note(&report), Some(DbGapAccessNote::NoSnapshots));
    assert!(report.ok());

    let mut fixture = self::fixture()?;
    fixture
        .state
        .add_group(&fixture.auth_domain, &fixture.access_group);
    let report = run(fixture.state).await?;
    assert_eq!(
        only_note(&report),
        Some(DbGapAccessNote::HasAccessUnknownReason)
    );
    assert_eq!(report.errors().len(), 1);
    Ok(())
}

#[tokio::test]
async fn dar_for_another_consent_does_not_match() -> AppResult<()> {
    let mut fixture = fixture()?;
    let latest = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&latest, 1234, study(32, 13, "HMB"), DarStatus::Approved)?;

    let report = run(fixture.state).await?;

    assert_eq!(only_note(&report), Some(DbGapAccessNote::NoDar));
    Ok(())
}

#[tokio::test]
async fn stale_snapshot_takes_precedence_over_approval() -> AppResult<()> {
    let mut fixture = fixture()?;
    let latest = fixture
        .state
        .snapshot(&fixture.application, Duration::days(45), true);
    fixture
        .state
        .request(&latest, 1234, study(32, 13, "GRU"), DarStatus::Approved)?;
    fixture
        .state
        .add_group(&fixture.auth_domain, &fixture.access_group);

    let report = run(fixture.state).await?;

    assert!(!report.ok());
    assert_eq!(only_note(&report), Some(DbGapAccessNote::SnapshotTooOld));
    let result = report.needs_action().first();
    assert_eq!(
        result.and_then(AuditResult::action),
        Some(AuditAction::UpdateSnapshot)
    );
    assert!(result.is_some_and(AuditResult::has_access));
    Ok(())
}

#[tokio::test]
async fn newest_flagged_snapshot_is_used() -> AppResult<()> {
    let mut fixture = fixture()?;
    let older = fixture
        .state
        .snapshot(&fixture.application, Duration::days(5), true);
    fixture
        .state
        .request(&older, 1234, study(32, 13, "GRU"), DarStatus::Rejected)?;
    let newer = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&newer, 1234, study(32, 13, "GRU"), DarStatus::Approved)?;
    fixture
        .state
        .add_group(&fixture.auth_domain, &fixture.access_group);

    let report = run(fixture.state).await?;

    assert_eq!(only_note(&report), Some(DbGapAccessNote::ApprovedDar));
    Ok(())
}

#[tokio::test]
async fn nested_access_group_counts_as_access() -> AppResult<()> {
    let mut fixture = fixture()?;
    let latest = fixture
        .state
        .snapshot(&fixture.application, Duration::days(1), true);
    fixture
        .state
        .request(&latest, 1234, study(32, 13, "GRU"), DarStatus::Approved)?;
    let umbrella = fixture.state.group("PRIMED_DBGAP_UMBRELLA")?;
    fixture.state.add_group(&umbrella, &fixture.access_group);
    fixture.state.add_group(&fixture.auth_domain, &umbrella);

    let report = run(fixture.state).await?;

    assert_eq!(only_note(&report), Some(DbGapAccessNote::ApprovedDar));
    Ok(())
}

#[tokio::test]
async fn unmanaged_auth_domains_are_ignored() -> AppResult<()> {
    let mut state = FakeState::default();
    let pi = state.user("pi@example.org")?;
    let (application, access_group) = state.dbgap_application(33119, &pi, &[])?;
    let managed = state.group("AUTH_MANAGED")?;
    let external = state.unmanaged_group("AUTH_EXTERNAL")?;
    state.dbgap_workspace(
        "fhs_mixed",
        Utc::now() - Duration::days(100),
        &[&managed, &external],
        study(32, 13, "GRU"),
    )?;
    let latest = state.snapshot(&application, Duration::days(1), true);
    state.request(&latest, 1234, study(32, 13, "GRU"), DarStatus::Approved)?;
    state.add_group(&managed, &access_group);

    let report = run(state).await?;

    assert_eq!(only_note(&report), Some(DbGapAccessNote::ApprovedDar));
    Ok(())
}

#[tokio::test]
async fn single_pair_selects_workspace_by_full_name() -> AppResult<()> {
    let fixture = fixture()?;
    let store = FakeGovernance::new(fixture.state);
    let audit = AccessAuditService::new(context_for(&store)).dbgap_access_audit();

    let report = audit
        .run(&AuditScope::pair(33119, "primed-dbgap/fhs_v32_gru"))
        .await?;
    assert!(report.into_single_result().is_ok());

    let missing = audit
        .run(&AuditScope::pair(33119, "primed-dbgap/unknown"))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}
