// Excel/ODS import (xlsx, xlsm, xlsb, xls, ods)

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{NaiveDate, TimeDelta};
use panelmerge_engine::{ConsolidateError, Table, Value};

use crate::header_label;

/// Read one worksheet into a table. The first row of the used range is the header.
///
/// Column positions follow the sheet, not the used range: a sheet whose data
/// starts in column B still has an (all blank) column A, so positional
/// mappings line up with what the operator sees in Excel.
pub fn load(name: &str, bytes: &[u8], sheet: Option<&str>) -> Result<Table, ConsolidateError> {
    let parse_err = |message: String| ConsolidateError::Parse { name: name.to_string(), message };

    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| parse_err(format!("failed to open spreadsheet: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|s| s.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                parse_err(format!(
                    "no sheet named '{wanted}' (available: {})",
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| parse_err("spreadsheet contains no sheets".into()))?,
    };

    if sheet.is_none() && sheet_names.len() > 1 {
        log::info!("'{name}': reading first sheet '{sheet_name}' of {}", sheet_names.len());
    }

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| parse_err(format!("failed to read sheet '{sheet_name}': {e}")))?;

    table_from_range(name, &sheet_name, &range)
}

fn table_from_range(name: &str, sheet_name: &str, range: &Range<Data>) -> Result<Table, ConsolidateError> {
    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Err(ConsolidateError::Parse {
            name: name.to_string(),
            message: format!("sheet '{sheet_name}' is empty"),
        });
    }

    // Range start offset (data may not begin at A1)
    let (_, start_col) = range.start().unwrap_or((0, 0));
    let lead = start_col as usize;

    let mut rows = range.rows();
    let header_cells = rows.next().unwrap_or(&[]);

    let mut headers: Vec<String> = (0..lead).map(|i| header_label("", i)).collect();
    for (i, cell) in header_cells.iter().enumerate() {
        let raw = cell_value(cell).to_string();
        headers.push(header_label(&raw, lead + i));
    }

    let mut table_rows = Vec::with_capacity(height.saturating_sub(1));
    for row in rows {
        let mut values: Vec<Value> = vec![Value::Blank; lead];
        values.extend(row.iter().map(cell_value));
        values.resize(headers.len(), Value::Blank);
        table_rows.push(values);
    }

    Table::new(headers, table_rows)
}

fn cell_value(cell: &Data) -> Value {
    #[allow(unreachable_patterns)]
    match cell {
        Data::Empty => Value::Blank,
        Data::String(s) => Value::from_text(s),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => Value::Text(format!("#{e:?}")),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            // Serials past chrono's range stay numeric
            excel_serial_to_text(serial).map_or(Value::Number(serial), Value::Text)
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::from_text(s),
        other => Value::from_text(&other.to_string()),
    }
}

/// Render an Excel serial date (1900 date system) as text.
/// Whole days render as a date, anything with a time part as date and time.
/// `None` when the serial falls outside the representable date range.
pub(crate) fn excel_serial_to_text(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let dt = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;

    let text = if serial.fract() == 0.0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    };
    Some(text)
}
