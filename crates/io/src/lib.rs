// File loading and CSV export for the consolidation pipeline

pub mod csv;
pub mod export;
pub mod spreadsheet;

use std::path::Path;

use panelmerge_engine::{ConsolidateError, Table};

pub use export::{encode, export_filename, export_filename_now, ExportOptions, CSV_MIME};

/// An uploaded file: its name (for the extension) and raw bytes.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    pub fn read(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    /// Lower-cased extension without the dot; empty when there is none.
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Worksheet to read from spreadsheet files (default: first sheet).
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Delimited text, delimiter sniffed from the content.
    Csv,
    Tsv,
    Spreadsheet,
}

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" | "txt" => Some(Format::Csv),
            "tsv" | "tab" => Some(Format::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Format::Spreadsheet),
            _ => None,
        }
    }
}

/// Load an uploaded file into a `Table`, picking the reader from its extension.
pub fn load(file: &RawFile, options: &LoadOptions) -> Result<Table, ConsolidateError> {
    let extension = file.extension();
    let format = Format::from_extension(&extension).ok_or_else(|| ConsolidateError::UnsupportedFormat {
        name: file.name.clone(),
        extension: extension.clone(),
    })?;

    let table = match format {
        Format::Csv => csv::load_delimited(&file.name, &file.bytes, None)?,
        Format::Tsv => csv::load_delimited(&file.name, &file.bytes, Some(b'\t'))?,
        Format::Spreadsheet => spreadsheet::load(&file.name, &file.bytes, options.sheet.as_deref())?,
    };

    log::debug!(
        "loaded '{}' ({:?}): {} row(s) x {} column(s)",
        file.name,
        format,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Label for a header cell; blank headers get a positional placeholder.
pub(crate) fn header_label(raw: &str, index: usize) -> String {
    if raw.is_empty() {
        format!("Unnamed: {index}")
    } else {
        raw.to_string()
    }
}
