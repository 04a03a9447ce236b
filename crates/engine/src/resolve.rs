//! Positional column lookup with column-count validation.

use serde::Serialize;

use crate::config::{MappingConfig, UserField};
use crate::error::ConsolidateError;
use crate::table::{Table, TableRole, Value};

/// One column resolved from a table by position.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef<'a> {
    pub index: usize,
    pub label: &'a str,
    pub values: Vec<&'a Value>,
}

/// Labels of every column the mapping touches, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMappingReport {
    pub bad_responses_key: ResolvedColumn,
    pub user_data: Vec<(UserField, ResolvedColumn)>,
    /// The user data column the join runs against.
    pub join_field: UserField,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub letter: String,
    pub label: String,
}

impl ColumnMappingReport {
    pub fn user_column(&self, field: UserField) -> Option<&ResolvedColumn> {
        self.user_data.iter().find(|(f, _)| *f == field).map(|(_, c)| c)
    }
}

/// Fail with `InsufficientColumns` unless `table` has at least `required` columns.
pub fn require_columns(table: &Table, role: TableRole, required: usize) -> Result<(), ConsolidateError> {
    let column_count = table.column_count();
    if column_count == 0 || column_count < required {
        return Err(ConsolidateError::InsufficientColumns {
            role,
            index: required.saturating_sub(1),
            column_count,
            required: required.max(1),
        });
    }
    Ok(())
}

pub fn resolve_column(table: &Table, role: TableRole, index: usize) -> Result<ColumnRef<'_>, ConsolidateError> {
    let column_count = table.column_count();
    if column_count <= index {
        return Err(ConsolidateError::InsufficientColumns {
            role,
            index,
            column_count,
            required: index + 1,
        });
    }
    Ok(ColumnRef {
        index,
        label: &table.headers()[index],
        values: table.rows().iter().map(|r| &r[index]).collect(),
    })
}

/// Validate both tables against the mapping and collect the resolved labels.
pub fn resolve_mapping(
    bad: &Table,
    users: &Table,
    mapping: &MappingConfig,
) -> Result<ColumnMappingReport, ConsolidateError> {
    require_columns(bad, TableRole::BadResponses, mapping.bad_responses.key + 1)?;
    require_columns(users, TableRole::UserData, mapping.user_data.required())?;

    let key = resolve_column(bad, TableRole::BadResponses, mapping.bad_responses.key)?;
    let bad_responses_key = resolved(&key);

    let mut user_data = Vec::with_capacity(UserField::ALL.len());
    for field in UserField::ALL {
        let col = resolve_column(users, TableRole::UserData, mapping.user_column(field))?;
        user_data.push((field, resolved(&col)));
    }

    Ok(ColumnMappingReport {
        bad_responses_key,
        user_data,
        join_field: mapping.key_field(),
    })
}

fn resolved(col: &ColumnRef<'_>) -> ResolvedColumn {
    ResolvedColumn {
        index: col.index,
        letter: col_to_letter(col.index),
        label: col.label.to_string(),
    }
}

/// Convert 0-based column index to Excel-style letter(s): 0 -> A, 26 -> AA.
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}
