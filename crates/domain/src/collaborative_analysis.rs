use primed_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::anvil::{ManagedGroupId, UserId, Workspace, WorkspaceId};

/// A workspace where analysts combine data from several source workspaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborativeAnalysisWorkspace {
    workspace: Workspace,
    custodian: UserId,
    analyst_group: ManagedGroupId,
    source_workspaces: Vec<WorkspaceId>,
}

impl CollaborativeAnalysisWorkspace {
    /// Creates a collaborative analysis workspace record.
    pub fn new(
        workspace: Workspace,
        custodian: UserId,
        analyst_group: ManagedGroupId,
        source_workspaces: Vec<WorkspaceId>,
    ) -> AppResult<Self> {
        if source_workspaces.contains(&workspace.id()) {
            return Err(AppError::Validation(format!(
                "workspace '{}' cannot be its own source workspace",
                workspace.full_name()
            )));
        }

        let mut source_workspaces = source_workspaces;
        source_workspaces.sort();
        source_workspaces.dedup();

        Ok(Self {
            workspace,
            custodian,
            analyst_group,
            source_workspaces,
        })
    }

    /// Returns the underlying workspace.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Returns the custodian responsible for the workspace.
    #[must_use]
    pub fn custodian(&self) -> UserId {
        self.custodian
    }

    /// Returns the group listing analysts allowed to work in the workspace.
    #[must_use]
    pub fn analyst_group(&self) -> ManagedGroupId {
        self.analyst_group
    }

    /// Returns the workspaces whose data is combined here.
    #[must_use]
    pub fn source_workspaces(&self) -> &[WorkspaceId] {
        self.source_workspaces.as_slice()
    }
}
