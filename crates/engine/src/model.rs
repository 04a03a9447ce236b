use serde::Serialize;

use crate::config::{DuplicatePolicy, KeyMode};
use crate::resolve::ColumnMappingReport;
use crate::table::Table;

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Match accounting. `matched + unmatched == total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationSummary {
    /// Rows in the bad responses table.
    pub total: usize,
    /// Bad responses with at least one partner carrying a value in the
    /// primary added column. Counts bad responses, not output rows, so a
    /// fanned-out match counts once.
    pub matched: usize,
    pub unmatched: usize,
    /// Rows in the consolidated table (exceeds `total` on fan-out).
    pub output_rows: usize,
    /// Distinct keys appearing on more than one user data row.
    pub duplicate_keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationMeta {
    pub key: KeyMode,
    pub on_duplicate: DuplicatePolicy,
    /// Output label of the column the match counts are taken from.
    pub primary_column: String,
    pub engine_version: String,
}

#[derive(Debug, Clone)]
pub struct ConsolidationResult {
    pub table: Table,
    pub summary: ConsolidationSummary,
    pub mapping: ColumnMappingReport,
    pub meta: ConsolidationMeta,
}
