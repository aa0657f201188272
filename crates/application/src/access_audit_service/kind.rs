use std::str::FromStr;

use primed_core::AppError;

/// The audits this service can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditKind {
    /// Signed agreement accessors.
    Accessors,
    /// Data affiliate agreement uploaders.
    Uploaders,
    /// dbGaP application PIs and collaborators.
    Collaborators,
    /// dbGaP application access to governed workspaces.
    DbGapAccess,
    /// Collaborative analysis workspace access.
    CollaborativeAnalysis,
    /// Signed agreement access groups in the CDSA group.
    SignedAgreements,
}

impl AuditKind {
    /// Every audit kind in display order.
    pub const ALL: [Self; 6] = [
        Self::Accessors,
        Self::Uploaders,
        Self::Collaborators,
        Self::DbGapAccess,
        Self::CollaborativeAnalysis,
        Self::SignedAgreements,
    ];

    /// Returns the URL and command-line name.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Accessors => "accessors",
            Self::Uploaders => "uploaders",
            Self::Collaborators => "collaborators",
            Self::DbGapAccess => "dbgap-access",
            Self::CollaborativeAnalysis => "collaborative-analysis",
            Self::SignedAgreements => "signed-agreements",
        }
    }

    /// Returns the human-readable audit name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Accessors => "Accessor",
            Self::Uploaders => "Uploader",
            Self::Collaborators => "Collaborator",
            Self::DbGapAccess => "dbGaP access",
            Self::CollaborativeAnalysis => "Collaborative analysis workspace access",
            Self::SignedAgreements => "Signed agreement access",
        }
    }
}

impl FromStr for AuditKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == value)
            .ok_or_else(|| AppError::NotFound(format!("unknown audit '{value}'")))
    }
}
