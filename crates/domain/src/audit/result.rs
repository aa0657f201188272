use std::fmt::{Display, Formatter};

use super::table::{AuditTableCell, AuditTableRow};
use super::{AuditAction, AuditNote, AuditSubject};

/// Outcome of comparing one audited object's desired and actual access.
///
/// `has_access` always describes the current state, not the desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditResult<S, N> {
    subject: S,
    note: N,
    has_access: bool,
    action: Option<AuditAction>,
}

impl<S: AuditSubject, N: AuditNote> AuditResult<S, N> {
    /// The object has access and should.
    #[must_use]
    pub fn verified_access(subject: S, note: N) -> Self {
        Self {
            subject,
            note,
            has_access: true,
            action: None,
        }
    }

    /// The object has no access and should not.
    #[must_use]
    pub fn verified_no_access(subject: S, note: N) -> Self {
        Self {
            subject,
            note,
            has_access: false,
            action: None,
        }
    }

    /// The object lacks access it should have.
    #[must_use]
    pub fn grant_access(subject: S, note: N) -> Self {
        Self {
            subject,
            note,
            has_access: false,
            action: Some(AuditAction::GrantAccess),
        }
    }

    /// The object has access it should not have.
    #[must_use]
    pub fn remove_access(subject: S, note: N) -> Self {
        Self {
            subject,
            note,
            has_access: true,
            action: Some(AuditAction::RemoveAccess),
        }
    }

    /// The underlying approval data is too old to decide either way.
    #[must_use]
    pub fn update_snapshot(subject: S, note: N, has_access: bool) -> Self {
        Self {
            subject,
            note,
            has_access,
            action: Some(AuditAction::UpdateSnapshot),
        }
    }

    /// Returns the audited object.
    #[must_use]
    pub fn subject(&self) -> &S {
        &self.subject
    }

    /// Returns the reason for the outcome.
    #[must_use]
    pub fn note(&self) -> N {
        self.note
    }

    /// Returns whether the object currently has access.
    #[must_use]
    pub fn has_access(&self) -> bool {
        self.has_access
    }

    /// Returns the action needed, if any.
    #[must_use]
    pub fn action(&self) -> Option<AuditAction> {
        self.action
    }

    /// Returns the outcome label used in descriptions.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match (self.action, self.has_access) {
            (Some(action), _) => action.as_str(),
            (None, true) => "Verified access",
            (None, false) => "Verified no access",
        }
    }

    /// Projects the result into a flat table row.
    #[must_use]
    pub fn table_row(&self) -> AuditTableRow {
        let cells = S::table_columns()
            .iter()
            .zip(self.subject.table_cells())
            .map(|(column, value)| AuditTableCell {
                column: (*column).to_owned(),
                value,
            })
            .collect();

        AuditTableRow {
            cells,
            has_access: self.has_access,
            note: self.note.as_str().to_owned(),
            action: self.action.map(|action| action.as_str().to_owned()),
            resolve_path: self
                .action
                .and_then(|_| self.subject.resolve_path()),
        }
    }
}

impl<S: AuditSubject, N: AuditNote> Display for AuditResult<S, N> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}: {}", self.label(), self.note.as_str())
    }
}
