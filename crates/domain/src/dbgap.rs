//! dbGaP applications, data access request snapshots and governed workspaces.

use chrono::{DateTime, Utc};
use primed_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::anvil::{ManagedGroupId, UserId, Workspace};
use crate::ids::uuid_identifier;

uuid_identifier!(
    /// Unique identifier for a dbGaP application record.
    DbGapApplicationId
);
uuid_identifier!(
    /// Unique identifier for a data access snapshot record.
    DbGapSnapshotId
);

/// One party's authorized use of restricted dbGaP datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapApplication {
    id: DbGapApplicationId,
    project_id: u32,
    principal_investigator: UserId,
    collaborators: Vec<UserId>,
    access_group: ManagedGroupId,
}

impl DbGapApplication {
    /// Creates a validated application record.
    pub fn new(
        id: DbGapApplicationId,
        project_id: u32,
        principal_investigator: UserId,
        collaborators: Vec<UserId>,
        access_group: ManagedGroupId,
    ) -> AppResult<Self> {
        if project_id == 0 {
            return Err(AppError::Validation(
                "dbGaP project_id must be greater than zero".to_owned(),
            ));
        }

        let mut collaborators: Vec<UserId> = collaborators
            .into_iter()
            .filter(|collaborator| *collaborator != principal_investigator)
            .collect();
        collaborators.sort();
        collaborators.dedup();

        Ok(Self {
            id,
            project_id,
            principal_investigator,
            collaborators,
            access_group,
        })
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> DbGapApplicationId {
        self.id
    }

    /// Returns the dbGaP project identifier.
    #[must_use]
    pub fn project_id(&self) -> u32 {
        self.project_id
    }

    /// Returns the principal investigator.
    #[must_use]
    pub fn principal_investigator(&self) -> UserId {
        self.principal_investigator
    }

    /// Returns the named collaborators, never including the PI.
    #[must_use]
    pub fn collaborators(&self) -> &[UserId] {
        self.collaborators.as_slice()
    }

    /// Returns the access group.
    #[must_use]
    pub fn access_group(&self) -> ManagedGroupId {
        self.access_group
    }
}

/// An immutable batch of DARs fetched from dbGaP at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapDataAccessSnapshot {
    id: DbGapSnapshotId,
    application_id: DbGapApplicationId,
    created_at: DateTime<Utc>,
    is_most_recent: bool,
}

impl DbGapDataAccessSnapshot {
    /// Creates a snapshot record.
    #[must_use]
    pub fn new(
        id: DbGapSnapshotId,
        application_id: DbGapApplicationId,
        created_at: DateTime<Utc>,
        is_most_recent: bool,
    ) -> Self {
        Self {
            id,
            application_id,
            created_at,
            is_most_recent,
        }
    }

    /// Returns the snapshot identifier.
    #[must_use]
    pub fn id(&self) -> DbGapSnapshotId {
        self.id
    }

    /// Returns the owning application.
    #[must_use]
    pub fn application_id(&self) -> DbGapApplicationId {
        self.application_id
    }

    /// Returns when the snapshot was fetched.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the upstream "most recent" flag.
    #[must_use]
    pub fn is_most_recent(&self) -> bool {
        self.is_most_recent
    }
}

/// dbGaP's decision status for a data access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DarStatus {
    /// Request approved.
    Approved,
    /// Request closed.
    Closed,
    /// Request rejected.
    Rejected,
    /// Approval expired.
    Expired,
    /// Request submitted and pending review.
    New,
}

impl DarStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::New => "new",
        }
    }
}

/// Coordinates of a consented dataset in dbGaP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentedStudyVersion {
    /// Study accession number (the digits of `phsNNNNNN`).
    pub phs: u32,
    /// Study version.
    pub version: u32,
    /// Participant set.
    pub participant_set: u32,
    /// Consent group abbreviation, e.g. `GRU`.
    pub consent_code: String,
}

impl ConsentedStudyVersion {
    /// Returns the full accession string, e.g. `phs000007.v32.p13`.
    #[must_use]
    pub fn accession(&self) -> String {
        format!(
            "phs{:06}.v{}.p{}",
            self.phs, self.version, self.participant_set
        )
    }
}

/// One approval decision in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapDataAccessRequest {
    snapshot_id: DbGapSnapshotId,
    dar_id: u32,
    original: ConsentedStudyVersion,
    status: DarStatus,
}

impl DbGapDataAccessRequest {
    /// Creates a DAR record.
    pub fn new(
        snapshot_id: DbGapSnapshotId,
        dar_id: u32,
        original: ConsentedStudyVersion,
        status: DarStatus,
    ) -> AppResult<Self> {
        if dar_id == 0 {
            return Err(AppError::Validation(
                "dbGaP dar_id must be greater than zero".to_owned(),
            ));
        }

        NonEmptyString::new(original.consent_code.as_str())?;

        Ok(Self {
            snapshot_id,
            dar_id,
            original,
            status,
        })
    }

    /// Returns the snapshot containing this DAR.
    #[must_use]
    pub fn snapshot_id(&self) -> DbGapSnapshotId {
        self.snapshot_id
    }

    /// Returns the stable dbGaP DAR identifier shared across snapshots.
    #[must_use]
    pub fn dar_id(&self) -> u32 {
        self.dar_id
    }

    /// Returns the study version the request was originally made against.
    #[must_use]
    pub fn original(&self) -> &ConsentedStudyVersion {
        &self.original
    }

    /// Returns the decision status.
    #[must_use]
    pub fn status(&self) -> DarStatus {
        self.status
    }

    /// Returns whether the request is approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == DarStatus::Approved
    }

    /// Returns whether this request covers the data in `workspace`.
    ///
    /// Approvals carry forward to later versions and participant sets of the
    /// same study and consent group.
    #[must_use]
    pub fn covers(&self, workspace: &DbGapWorkspace) -> bool {
        let target = workspace.study_version();
        self.original.phs == target.phs
            && self.original.consent_code.eq_ignore_ascii_case(&target.consent_code)
            && self.original.version <= target.version
            && self.original.participant_set <= target.participant_set
    }
}

/// A workspace holding one consent group of one dbGaP study version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbGapWorkspace {
    workspace: Workspace,
    study_version: ConsentedStudyVersion,
}

impl DbGapWorkspace {
    /// Creates a dbGaP workspace record.
    pub fn new(workspace: Workspace, study_version: ConsentedStudyVersion) -> AppResult<Self> {
        NonEmptyString::new(study_version.consent_code.as_str())?;

        Ok(Self {
            workspace,
            study_version,
        })
    }

    /// Returns the underlying workspace.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Returns the consented study version held in the workspace.
    #[must_use]
    pub fn study_version(&self) -> &ConsentedStudyVersion {
        &self.study_version
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        ConsentedStudyVersion, DarStatus, DbGapApplication, DbGapApplicationId,
        DbGapDataAccessRequest, DbGapSnapshotId, DbGapWorkspace,
    };
    use crate::anvil::{ManagedGroupId, UserId, Workspace, WorkspaceId};

    fn study(version: u32, participant_set: u32, consent_code: &str) -> ConsentedStudyVersion {
        ConsentedStudyVersion {
            phs: 7,
            version,
            participant_set,
            consent_code: consent_code.to_owned(),
        }
    }

    fn workspace(study_version: ConsentedStudyVersion) -> Option<DbGapWorkspace> {
        let workspace = Workspace::new(
            WorkspaceId::new(),
            "primed-dbgap",
            "fhs_v32_p13_gru",
            Utc::now(),
            vec![ManagedGroupId::new()],
        )
        .ok()?;
        DbGapWorkspace::new(workspace, study_version).ok()
    }

    #[test]
    fn accession_is_zero_padded() {
        assert_eq!(study(32, 13, "GRU").accession(), "phs000007.v32.p13");
    }

    #[test]
    fn request_covers_later_versions_of_same_consent() {
        let request =
            DbGapDataAccessRequest::new(DbGapSnapshotId::new(), 1234, study(30, 12, "GRU"), DarStatus::Approved);
        let target = workspace(study(32, 13, "gru"));
        assert!(request.is_ok_and(|request| target.is_some_and(|target| request.covers(&target))));
    }

    #[test]
    fn request_does_not_cover_earlier_version_or_other_consent() {
        let request =
            DbGapDataAccessRequest::new(DbGapSnapshotId::new(), 1234, study(32, 13, "GRU"), DarStatus::Approved);
        assert!(request.is_ok());
        if let Ok(request) = request {
            assert!(workspace(study(31, 13, "GRU")).is_some_and(|target| !request.covers(&target)));
            assert!(workspace(study(32, 13, "HMB")).is_some_and(|target| !request.covers(&target)));
        }
    }

    #[test]
    fn application_excludes_pi_from_collaborators() {
        let pi = UserId::new();
        let other = UserId::new();
        let application = DbGapApplication::new(
            DbGapApplicationId::new(),
            33119,
            pi,
            vec![pi, other, other],
            ManagedGroupId::new(),
        );
        assert!(application.is_ok_and(|application| application.collaborators() == [other]));
    }
}
