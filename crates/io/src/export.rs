// CSV export of the consolidated table

use chrono::NaiveDateTime;
use panelmerge_engine::{ConsolidateError, Table, Value};

/// MIME type offered with the download.
pub const CSV_MIME: &str = "text/csv";

const FILENAME_PREFIX: &str = "consolidated_bad_responses_";

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Text written for carried columns of unmatched rows.
    pub missing_marker: String,
}

/// Delimiters the loader sniffs for besides comma.
const OTHER_DELIMITERS: [char; 3] = ['\t', ';', '|'];

/// Serialize a table to CSV: header row first, then every row, comma-separated,
/// quoted only where needed. No index column.
///
/// When any label, cell or the missing marker holds a tab, semicolon or pipe,
/// every field is quoted so the loader's delimiter sniffing still lands on comma.
pub fn encode(table: &Table, options: &ExportOptions) -> Result<Vec<u8>, ConsolidateError> {
    let processing = |e: csv::Error| ConsolidateError::Processing(e.to_string());

    let quote_style = if needs_full_quoting(table, options) {
        csv::QuoteStyle::Always
    } else {
        csv::QuoteStyle::Necessary
    };
    let mut writer = csv::WriterBuilder::new()
        .quote_style(quote_style)
        .from_writer(Vec::new());

    writer.write_record(table.headers()).map_err(processing)?;

    let mut record: Vec<String> = Vec::with_capacity(table.column_count());
    for row in table.rows() {
        record.clear();
        record.extend(row.iter().map(|v| match v {
            Value::Missing => options.missing_marker.clone(),
            other => other.to_string(),
        }));
        writer.write_record(&record).map_err(processing)?;
    }

    writer
        .into_inner()
        .map_err(|e| ConsolidateError::Processing(e.to_string()))
}

fn needs_full_quoting(table: &Table, options: &ExportOptions) -> bool {
    let has_other = |s: &str| s.contains(OTHER_DELIMITERS);
    has_other(&options.missing_marker)
        || table.headers().iter().any(|h| has_other(h))
        || table
            .rows()
            .iter()
            .flatten()
            .any(|v| matches!(v, Value::Text(s) if has_other(s)))
}

/// `consolidated_bad_responses_<YYYYMMDD_HHMMSS>.csv`
pub fn export_filename(at: NaiveDateTime) -> String {
    format!("{FILENAME_PREFIX}{}.csv", at.format("%Y%m%d_%H%M%S"))
}

pub fn export_filename_now() -> String {
    export_filename(chrono::Local::now().naive_local())
}
