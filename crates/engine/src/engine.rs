use std::collections::HashMap;

use crate::config::{DuplicatePolicy, MappingConfig};
use crate::error::ConsolidateError;
use crate::model::{ConsolidationMeta, ConsolidationResult};
use crate::resolve::{resolve_column, resolve_mapping};
use crate::summary::{compute_summary, RowOutcome};
use crate::table::{Table, TableRole, Value};

/// Suffix for a carried column whose output name is already a bad responses label.
pub const COLLISION_SUFFIX: &str = "_user";

/// Left-join the user data fields onto every bad response.
///
/// Every bad responses row appears in the output, in input order, followed by
/// the carried columns. Rows without a partner get `Value::Missing` in each
/// carried column. A key found on several user data rows fans out to one
/// output row per partner unless the mapping asks for `first_match`.
pub fn consolidate(
    bad: &Table,
    users: &Table,
    mapping: &MappingConfig,
) -> Result<ConsolidationResult, ConsolidateError> {
    mapping.validate()?;
    let report = resolve_mapping(bad, users, mapping)?;

    let bad_key = resolve_column(bad, TableRole::BadResponses, mapping.bad_responses.key)?;
    let user_key = resolve_column(users, TableRole::UserData, mapping.user_column(mapping.key_field()))?;

    let carried = mapping.carried_fields();
    let carried_cols: Vec<usize> = carried.iter().map(|f| mapping.user_column(*f)).collect();

    // Build index on user data side, partners kept in file order
    let mut user_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, value) in user_key.values.iter().enumerate() {
        if let Some(key) = value.key_text() {
            user_index.entry(key).or_default().push(row_idx);
        }
    }
    let key_counts: HashMap<String, usize> =
        user_index.iter().map(|(k, rows)| (k.clone(), rows.len())).collect();

    let headers = output_headers(bad.headers(), carried.iter().map(|f| mapping.output_name(*f)));

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(bad.row_count());
    let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(bad.row_count());

    for (bad_row, key) in bad.rows().iter().zip(&bad_key.values) {
        let partners: &[usize] = key
            .key_text()
            .and_then(|k| user_index.get(&k))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let partners = match mapping.on_duplicate {
            DuplicatePolicy::FanOut => partners,
            DuplicatePolicy::FirstMatch => &partners[..partners.len().min(1)],
        };

        if partners.is_empty() {
            let mut row = bad_row.clone();
            row.extend(std::iter::repeat(Value::Missing).take(carried_cols.len()));
            rows.push(row);
            outcomes.push(RowOutcome { emitted: 1, has_primary: false });
            continue;
        }

        let mut has_primary = false;
        for &partner in partners {
            let user_row = &users.rows()[partner];
            let mut row = bad_row.clone();
            row.extend(carried_cols.iter().map(|&c| user_row[c].clone()));
            if let Some(&primary) = carried_cols.first() {
                has_primary |= !user_row[primary].is_empty();
            }
            rows.push(row);
        }
        outcomes.push(RowOutcome { emitted: partners.len(), has_primary });
    }

    let summary = compute_summary(&outcomes, &key_counts);
    let primary_column = headers.get(bad.column_count()).cloned().unwrap_or_default();
    let table = Table::new(headers, rows)?;

    if summary.duplicate_keys > 0 {
        log::debug!(
            "{} key(s) appear on more than one user data row ({})",
            summary.duplicate_keys,
            mapping.on_duplicate
        );
    }
    log::info!(
        "consolidated {} bad response(s) by {}: {} matched, {} unmatched, {} output row(s)",
        summary.total,
        mapping.key,
        summary.matched,
        summary.unmatched,
        summary.output_rows,
    );

    Ok(ConsolidationResult {
        table,
        summary,
        mapping: report,
        meta: ConsolidationMeta {
            key: mapping.key,
            on_duplicate: mapping.on_duplicate,
            primary_column,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    })
}

/// Bad responses labels unchanged, then the carried names. A carried name
/// already taken gets `COLLISION_SUFFIX` until unique.
fn output_headers<'a>(bad_headers: &[String], carried: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut headers = bad_headers.to_vec();
    for name in carried {
        let mut label = name.to_string();
        while headers.contains(&label) {
            label.push_str(COLLISION_SUFFIX);
        }
        headers.push(label);
    }
    headers
}
