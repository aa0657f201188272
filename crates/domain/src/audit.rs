//! Value types produced by access reconciliation audits.
//!
//! An audit compares the access an entity *should* have with the memberships
//! that currently exist and records one [`AuditResult`] per audited object.
//! Results are routed into exactly one bucket of an [`AuditReport`]:
//! verified, needs action, or errors.

mod member;
mod report;
mod result;
mod table;

#[cfg(test)]
mod tests;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

pub use member::{AuditMember, MemberReference};
pub use report::{AuditCounts, AuditFindings, AuditOverview, AuditReport};
pub use result::AuditResult;
pub use table::{AuditTable, AuditTableCell, AuditTableRow};

/// A reason string from the fixed set owned by one audit.
pub trait AuditNote: Copy + Eq + Debug + Send + Sync + 'static {
    /// Returns the human-readable reason.
    fn as_str(&self) -> &'static str;
}

/// The object (or pair of objects) an audit result is about.
pub trait AuditSubject: Clone + Debug + Send + Sync + 'static {
    /// Entity columns shown in result tables, in display order.
    fn table_columns() -> &'static [&'static str];

    /// Entity cell values aligned with [`AuditSubject::table_columns`].
    fn table_cells(&self) -> Vec<String>;

    /// Key identifying the audited object within one run.
    fn audit_key(&self) -> String;

    /// Site-relative path of the page resolving this result, if any.
    fn resolve_path(&self) -> Option<String>;
}

/// Action needed to bring actual access in line with desired access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Add the member to the group.
    GrantAccess,
    /// Remove the member from the group.
    RemoveAccess,
    /// Fetch a fresh data access snapshot before deciding.
    UpdateSnapshot,
}

impl AuditAction {
    /// Returns the label shown to operators.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrantAccess => "Grant access",
            Self::RemoveAccess => "Remove access",
            Self::UpdateSnapshot => "Update DARs",
        }
    }
}

/// One of the three result buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditBucket {
    /// Actual access matches desired access.
    Verified,
    /// An expected discrepancy that a routine action resolves.
    NeedsAction,
    /// An unexplained discrepancy.
    Errors,
}

impl AuditBucket {
    /// Returns a stable label for the bucket.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NeedsAction => "needs_action",
            Self::Errors => "errors",
        }
    }
}
