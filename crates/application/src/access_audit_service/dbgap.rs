use async_trait::async_trait;
use chrono::{DateTime, Utc};
use primed_core::{AppError, AppResult};
use primed_domain::{
    AuditFindings, AuditNote, AuditReport, AuditResult, AuditSubject, DbGapApplication,
    DbGapDataAccessRequest, DbGapDataAccessSnapshot, DbGapWorkspace, ManagedGroupId,
};
use tracing::warn;

use super::membership::{group_and_ancestors, require_group};
use super::{AuditContext, AuditPolicy, AuditScope, select_entities};

/// Reasons reported by the dbGaP access audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbGapAccessNote {
    /// An approved DAR covers the workspace.
    ApprovedDar,
    /// The application has no snapshots.
    NoSnapshots,
    /// No DAR in the latest snapshot covers the workspace.
    NoDar,
    /// The covering DAR is not approved.
    DarNotApproved,
    /// A DAR was approved since access was last granted.
    NewApprovedDar,
    /// The workspace was created after the snapshot.
    NewWorkspace,
    /// The DAR was approved in an earlier snapshot but no longer is.
    PreviouslyApproved,
    /// Access exists without any DAR to explain it.
    HasAccessUnknownReason,
    /// The latest snapshot is too old to decide on.
    SnapshotTooOld,
}

impl AuditNote for DbGapAccessNote {
    fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovedDar => "Approved DAR.",
            Self::NoSnapshots => "No snapshots.",
            Self::NoDar => "No matching DAR.",
            Self::DarNotApproved => "DAR is not approved.",
            Self::NewApprovedDar => "New approved DAR.",
            Self::NewWorkspace => "New workspace.",
            Self::PreviouslyApproved => "Previously approved DAR is no longer approved.",
            Self::HasAccessUnknownReason => "Has access for an unknown reason.",
            Self::SnapshotTooOld => "Snapshot is too old; update the DARs.",
        }
    }
}

/// One (application, workspace) pair of the dbGaP access audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbGapAccessSubject {
    application: DbGapApplication,
    workspace: DbGapWorkspace,
    data_access_request: Option<DbGapDataAccessRequest>,
}

impl DbGapAccessSubject {
    /// Returns the application.
    #[must_use]
    pub fn application(&self) -> &DbGapApplication {
        &self.application
    }

    /// Returns the governed workspace.
    #[must_use]
    pub fn workspace(&self) -> &DbGapWorkspace {
        &self.workspace
    }

    /// Returns the DAR the decision was based on, if one matched.
    #[must_use]
    pub fn data_access_request(&self) -> Option<&DbGapDataAccessRequest> {
        self.data_access_request.as_ref()
    }
}

impl AuditSubject for DbGapAccessSubject {
    fn table_columns() -> &'static [&'static str] {
        &["dbgap_application", "workspace", "data_access_request"]
    }

    fn table_cells(&self) -> Vec<String> {
        vec![
            self.application.project_id().to_string(),
            self.workspace.workspace().full_name(),
            self.data_access_request
                .as_ref()
                .map(|request| request.dar_id().to_string())
                .unwrap_or_default(),
        ]
    }

    fn audit_key(&self) -> String {
        format!(
            "{}/{}",
            self.application.project_id(),
            self.workspace.workspace().id()
        )
    }

    fn resolve_path(&self) -> Option<String> {
        let workspace = self.workspace.workspace();
        Some(format!(
            "/dbgap/audit/access/resolve/{}/{}/{}/",
            self.application.project_id(),
            workspace.billing_project(),
            workspace.name()
        ))
    }
}

/// Completed dbGaP access audit.
pub type DbGapAccessAuditReport = AuditReport<DbGapAccessSubject, DbGapAccessNote>;

/// Checks that each application's access group is in the authorization
/// domains of exactly the workspaces its approved DARs cover.
///
/// Entities are keyed by dbGaP project id; a single-pair run names the
/// workspace as `billing_project/name`.
#[derive(Clone)]
pub struct DbGapAccessAuditPolicy {
    context: AuditContext,
}

impl DbGapAccessAuditPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new(context: AuditContext) -> Self {
        Self { context }
    }

    /// Returns whether the access group, or a group containing it, is in
    /// every managed authorization domain of the workspace.
    async fn in_auth_domain(
        &self,
        access_group: ManagedGroupId,
        workspace: &DbGapWorkspace,
    ) -> AppResult<bool> {
        let mut managed_domains = Vec::new();
        for domain_id in workspace.workspace().authorization_domains() {
            let domain = require_group(self.context.repository(), *domain_id).await?;
            if domain.is_managed_by_app() {
                managed_domains.push(domain.id());
            }
        }

        if managed_domains.is_empty() {
            return Ok(false);
        }

        let ancestors = group_and_ancestors(self.context.directory(), access_group).await?;
        Ok(managed_domains
            .iter()
            .all(|domain_id| ancestors.contains(domain_id)))
    }

    fn most_recent_snapshot(
        application: &DbGapApplication,
        snapshots: &[DbGapDataAccessSnapshot],
    ) -> Option<DbGapDataAccessSnapshot> {
        let flagged: Vec<&DbGapDataAccessSnapshot> = snapshots
            .iter()
            .filter(|snapshot| snapshot.is_most_recent())
            .collect();

        if flagged.len() > 1 {
            warn!(
                project_id = application.project_id(),
                count = flagged.len(),
                "multiple snapshots flagged as most recent; using the newest"
            );
        }

        flagged
            .into_iter()
            .max_by_key(|snapshot| snapshot.created_at())
            .cloned()
    }

    async fn matching_request(
        &self,
        snapshot: &DbGapDataAccessSnapshot,
        workspace: &DbGapWorkspace,
    ) -> AppResult<Option<DbGapDataAccessRequest>> {
        let covering: Vec<DbGapDataAccessRequest> = self
            .context
            .repository()
            .list_data_access_requests(snapshot.id())
            .await?
            .into_iter()
            .filter(|request| request.covers(workspace))
            .collect();

        let approved = covering.iter().find(|request| request.is_approved()).cloned();
        Ok(approved.or_else(|| covering.into_iter().next()))
    }

    async fn previously_approved(
        &self,
        current: &DbGapDataAccessSnapshot,
        snapshots: &[DbGapDataAccessSnapshot],
        request: &DbGapDataAccessRequest,
        workspace: &DbGapWorkspace,
    ) -> AppResult<bool> {
        for snapshot in snapshots
            .iter()
            .filter(|snapshot| snapshot.id() != current.id())
            .filter(|snapshot| snapshot.created_at() < current.created_at())
        {
            let approved_before = self
                .context
                .repository()
                .list_data_access_requests(snapshot.id())
                .await?
                .iter()
                .any(|earlier| {
                    earlier.dar_id() == request.dar_id()
                        && earlier.is_approved()
                        && earlier.covers(workspace)
                });
            if approved_before {
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn audit_pair(
        &self,
        application: &DbGapApplication,
        snapshots: &[DbGapDataAccessSnapshot],
        workspace: &DbGapWorkspace,
        now: DateTime<Utc>,
        findings: &mut AuditFindings<DbGapAccessSubject, DbGapAccessNote>,
    ) -> AppResult<()> {
        let in_auth_domain = self
            .in_auth_domain(application.access_group(), workspace)
            .await?;
        let mut subject = DbGapAccessSubject {
            application: application.clone(),
            workspace: workspace.clone(),
            data_access_request: None,
        };

        let Some(snapshot) = Self::most_recent_snapshot(application, snapshots) else {
            return record_unexplained(
                findings,
                subject,
                in_auth_domain,
                DbGapAccessNote::NoSnapshots,
            );
        };

        let Some(request) = self.matching_request(&snapshot, workspace).await? else {
            return record_unexplained(
                findings,
                subject,
                in_auth_domain,
                DbGapAccessNote::NoDar,
            );
        };
        subject.data_access_request = Some(request.clone());

        if now - snapshot.created_at() > self.context.settings().snapshot_max_age() {
            return findings.needs_action(AuditResult::update_snapshot(
                subject,
                DbGapAccessNote::SnapshotTooOld,
                in_auth_domain,
            ));
        }

        match (request.is_approved(), in_auth_domain) {
            (true, true) => findings.verified(AuditResult::verified_access(
                subject,
                DbGapAccessNote::ApprovedDar,
            )),
            (true, false) => {
                let note = if workspace.workspace().created_at() > snapshot.created_at() {
                    DbGapAccessNote::NewWorkspace
                } else {
                    DbGapAccessNote::NewApprovedDar
                };
                findings.needs_action(AuditResult::grant_access(subject, note))
            }
            (false, true) => {
                if self
                    .previously_approved(&snapshot, snapshots, &request, workspace)
                    .await?
                {
                    findings.needs_action(AuditResult::remove_access(
                        subject,
                        DbGapAccessNote::PreviouslyApproved,
                    ))
                } else {
                    findings.error(AuditResult::remove_access(
                        subject,
                        DbGapAccessNote::HasAccessUnknownReason,
                    ))
                }
            }
            (false, false) => findings.verified(AuditResult::verified_no_access(
                subject,
                DbGapAccessNote::DarNotApproved,
            )),
        }
    }

    fn select_workspaces(
        workspaces: Vec<DbGapWorkspace>,
        member: Option<&str>,
    ) -> AppResult<Vec<DbGapWorkspace>> {
        let Some(full_name) = member else {
            return Ok(workspaces);
        };

        let selected: Vec<DbGapWorkspace> = workspaces
            .into_iter()
            .filter(|workspace| workspace.workspace().full_name() == full_name.trim())
            .collect();
        if selected.is_empty() {
            return Err(AppError::NotFound(format!(
                "dbGaP workspace '{full_name}' does not exist"
            )));
        }

        Ok(selected)
    }
}

/// Records a pair without a usable DAR: access is unexplained, absence is
/// expected.
fn record_unexplained(
    findings: &mut AuditFindings<DbGapAccessSubject, DbGapAccessNote>,
    subject: DbGapAccessSubject,
    in_auth_domain: bool,
    note: DbGapAccessNote,
) -> AppResult<()> {
    if in_auth_domain {
        findings.error(AuditResult::remove_access(
            subject,
            DbGapAccessNote::HasAccessUnknownReason,
        ))
    } else {
        findings.verified(AuditResult::verified_no_access(subject, note))
    }
}

#[async_trait]
impl AuditPolicy for DbGapAccessAuditPolicy {
    type Key = u32;
    type Subject = DbGapAccessSubject;
    type Note = DbGapAccessNote;

    const NAME: &'static str = "DbGapAccessAudit";

    async fn audit_pass(
        &self,
        scope: &AuditScope<u32>,
        findings: &mut AuditFindings<Self::Subject, Self::Note>,
    ) -> AppResult<()> {
        let repository = self.context.repository();
        let applications = select_entities(
            repository.list_dbgap_applications().await?,
            scope.entities(),
            DbGapApplication::project_id,
            "dbGaP application",
        )?;
        let workspaces =
            Self::select_workspaces(repository.list_dbgap_workspaces().await?, scope.member())?;
        let now = Utc::now();

        for application in &applications {
            let snapshots = repository
                .list_data_access_snapshots(application.id())
                .await?;
            for workspace in &workspaces {
                self.audit_pair(application, &snapshots, workspace, now, findings)
                    .await?;
            }
        }

        Ok(())
    }
}
