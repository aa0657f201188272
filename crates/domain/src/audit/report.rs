use std::collections::HashSet;

use primed_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::result::AuditResult;
use super::table::{AuditTable, AuditTableRow};
use super::{AuditBucket, AuditNote, AuditSubject};

/// Bucket sizes of a completed audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCounts {
    /// Number of verified results.
    pub verified: usize,
    /// Number of results needing action.
    pub needs_action: usize,
    /// Number of error results.
    pub errors: usize,
}

/// Tabular view of a completed audit, shared by every audit kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOverview {
    /// Name of the audit that ran.
    pub audit: String,
    /// Whether nothing needs action and nothing is in error.
    pub ok: bool,
    /// Bucket sizes.
    pub counts: AuditCounts,
    /// Verified results.
    pub verified: AuditTable,
    /// Results needing action.
    pub needs_action: AuditTable,
    /// Error results.
    pub errors: AuditTable,
}

impl AuditOverview {
    /// Returns every actionable row: needs action, then errors.
    pub fn actionable_rows(&self) -> impl Iterator<Item = &AuditTableRow> {
        self.needs_action.rows.iter().chain(self.errors.rows.iter())
    }
}

/// Results collected while an audit pass is running.
///
/// Each audited object may be classified once; a verified result never
/// carries an action and an actionable result always does.
#[derive(Debug)]
pub struct AuditFindings<S, N> {
    verified: Vec<AuditResult<S, N>>,
    needs_action: Vec<AuditResult<S, N>>,
    errors: Vec<AuditResult<S, N>>,
    seen: HashSet<String>,
}

impl<S: AuditSubject, N: AuditNote> Default for AuditFindings<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AuditSubject, N: AuditNote> AuditFindings<S, N> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            verified: Vec::new(),
            needs_action: Vec::new(),
            errors: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Records a verified result.
    pub fn verified(&mut self, result: AuditResult<S, N>) -> AppResult<()> {
        self.push(AuditBucket::Verified, result)
    }

    /// Records a result needing routine action.
    pub fn needs_action(&mut self, result: AuditResult<S, N>) -> AppResult<()> {
        self.push(AuditBucket::NeedsAction, result)
    }

    /// Records an unexplained discrepancy.
    pub fn error(&mut self, result: AuditResult<S, N>) -> AppResult<()> {
        self.push(AuditBucket::Errors, result)
    }

    /// Records a result in the given bucket.
    pub fn push(&mut self, bucket: AuditBucket, result: AuditResult<S, N>) -> AppResult<()> {
        let is_verified = bucket == AuditBucket::Verified;
        if is_verified != result.action().is_none() {
            return Err(AppError::Validation(format!(
                "'{result}' cannot be recorded as {}",
                bucket.as_str()
            )));
        }

        let key = result.subject().audit_key();
        if !self.seen.insert(key.clone()) {
            return Err(AppError::Internal(format!(
                "audited object '{key}' was classified more than once"
            )));
        }

        match bucket {
            AuditBucket::Verified => self.verified.push(result),
            AuditBucket::NeedsAction => self.needs_action.push(result),
            AuditBucket::Errors => self.errors.push(result),
        }

        Ok(())
    }

    /// Completes the pass and freezes the results into a report.
    #[must_use]
    pub fn finish(self, audit_name: &'static str) -> AuditReport<S, N> {
        AuditReport {
            audit_name,
            verified: self.verified,
            needs_action: self.needs_action,
            errors: self.errors,
        }
    }
}

/// Immutable outcome of one completed audit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport<S, N> {
    audit_name: &'static str,
    verified: Vec<AuditResult<S, N>>,
    needs_action: Vec<AuditResult<S, N>>,
    errors: Vec<AuditResult<S, N>>,
}

impl<S: AuditSubject, N: AuditNote> AuditReport<S, N> {
    /// Returns the name of the audit that produced the report.
    #[must_use]
    pub fn audit_name(&self) -> &'static str {
        self.audit_name
    }

    /// Returns whether nothing needs action and nothing is in error.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.needs_action.len() + self.errors.len() == 0
    }

    /// Returns verified results.
    #[must_use]
    pub fn verified(&self) -> &[AuditResult<S, N>] {
        self.verified.as_slice()
    }

    /// Returns results needing action.
    #[must_use]
    pub fn needs_action(&self) -> &[AuditResult<S, N>] {
        self.needs_action.as_slice()
    }

    /// Returns error results.
    #[must_use]
    pub fn errors(&self) -> &[AuditResult<S, N>] {
        self.errors.as_slice()
    }

    /// Returns the results of one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: AuditBucket) -> &[AuditResult<S, N>] {
        match bucket {
            AuditBucket::Verified => self.verified(),
            AuditBucket::NeedsAction => self.needs_action(),
            AuditBucket::Errors => self.errors(),
        }
    }

    /// Returns every result: verified, then needs action, then errors.
    #[must_use]
    pub fn all_results(&self) -> Vec<&AuditResult<S, N>> {
        self.verified
            .iter()
            .chain(self.needs_action.iter())
            .chain(self.errors.iter())
            .collect()
    }

    /// Returns bucket sizes.
    #[must_use]
    pub fn counts(&self) -> AuditCounts {
        AuditCounts {
            verified: self.verified.len(),
            needs_action: self.needs_action.len(),
            errors: self.errors.len(),
        }
    }

    /// Projects one bucket into a table.
    #[must_use]
    pub fn table(&self, bucket: AuditBucket) -> AuditTable {
        AuditTable {
            columns: S::table_columns()
                .iter()
                .map(|column| (*column).to_owned())
                .collect(),
            rows: self
                .bucket(bucket)
                .iter()
                .map(AuditResult::table_row)
                .collect(),
        }
    }

    /// Projects verified results into a table.
    #[must_use]
    pub fn verified_table(&self) -> AuditTable {
        self.table(AuditBucket::Verified)
    }

    /// Projects results needing action into a table.
    #[must_use]
    pub fn needs_action_table(&self) -> AuditTable {
        self.table(AuditBucket::NeedsAction)
    }

    /// Projects error results into a table.
    #[must_use]
    pub fn errors_table(&self) -> AuditTable {
        self.table(AuditBucket::Errors)
    }

    /// Flattens the report into tables independent of the audit's types.
    #[must_use]
    pub fn overview(&self) -> AuditOverview {
        AuditOverview {
            audit: self.audit_name.to_owned(),
            ok: self.ok(),
            counts: self.counts(),
            verified: self.verified_table(),
            needs_action: self.needs_action_table(),
            errors: self.errors_table(),
        }
    }

    /// Consumes the report, returning the single result of a one-object audit.
    pub fn into_single_result(self) -> AppResult<AuditResult<S, N>> {
        let audit_name = self.audit_name;
        let mut results: Vec<AuditResult<S, N>> = self
            .verified
            .into_iter()
            .chain(self.needs_action)
            .chain(self.errors)
            .collect();

        match (results.pop(), results.is_empty()) {
            (Some(result), true) => Ok(result),
            (None, _) => Err(AppError::Internal(format!(
                "{audit_name} produced no result"
            ))),
            (Some(_), false) => Err(AppError::Internal(format!(
                "{audit_name} produced more than one result"
            ))),
        }
    }
}
