//! `panelmerge inspect`: show how a file loads: columns with their letters
//! and the first rows. Useful for checking a user data export against the
//! mapping before running.

use std::path::PathBuf;

use serde::Serialize;

use panelmerge_engine::{col_to_letter, MappingConfig, Value};
use panelmerge_io::{load, LoadOptions, RawFile};

use crate::exit_codes::EXIT_PROCESSING;
use crate::render::{render_columns, render_table};
use crate::CliError;

#[derive(Serialize)]
struct ColumnInfo<'a> {
    index: usize,
    letter: String,
    label: &'a str,
}

#[derive(Serialize)]
struct InspectReport<'a> {
    file: &'a str,
    rows: usize,
    columns: Vec<ColumnInfo<'a>>,
    preview: &'a [Vec<Value>],
}

pub fn cmd_inspect(file: PathBuf, sheet: Option<String>, rows: usize, json: bool) -> Result<(), CliError> {
    let raw = RawFile::read(&file).map_err(CliError::usage)?;
    let table = load(&raw, &LoadOptions { sheet })
        .map_err(|e| CliError::consolidate(e, &MappingConfig::default()))?;

    if json {
        let preview = table.head(rows);
        let report = InspectReport {
            file: &raw.name,
            rows: table.row_count(),
            columns: table
                .headers()
                .iter()
                .enumerate()
                .map(|(index, label)| ColumnInfo { index, letter: col_to_letter(index), label })
                .collect(),
            preview: preview.rows(),
        };
        let out = serde_json::to_string_pretty(&report).map_err(|e| CliError {
            code: EXIT_PROCESSING,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{out}");
        return Ok(());
    }

    println!("File:    {}", raw.name);
    println!("Rows:    {}", table.row_count());
    println!("Columns: {}", table.column_count());
    print!("{}", render_columns(&table));
    if rows > 0 && !table.is_empty() {
        println!();
        print!("{}", render_table(&table, rows));
    }
    Ok(())
}
