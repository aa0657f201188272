use serde::{Deserialize, Serialize};

/// One entity cell of a result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTableCell {
    /// Column name.
    pub column: String,
    /// Display value.
    pub value: String,
}

/// Flat projection of one audit result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTableRow {
    /// Entity references in column order.
    pub cells: Vec<AuditTableCell>,
    /// Whether the object currently has access.
    pub has_access: bool,
    /// Reason for the outcome.
    pub note: String,
    /// Action label, absent for verified results.
    pub action: Option<String>,
    /// Site-relative resolution path, present only when an action exists.
    pub resolve_path: Option<String>,
}

impl AuditTableRow {
    /// Returns the value of an entity column.
    #[must_use]
    pub fn cell(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.column == column)
            .map(|cell| cell.value.as_str())
    }
}

/// Tabular projection of one result bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTable {
    /// Entity column names.
    pub columns: Vec<String>,
    /// One row per result.
    pub rows: Vec<AuditTableRow>,
}

impl AuditTable {
    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
