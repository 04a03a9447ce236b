use std::fmt;

use crate::config::MappingConfig;
use crate::resolve::col_to_letter;
use crate::table::TableRole;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsolidateError {
    /// File extension is neither delimited text nor a known spreadsheet format.
    UnsupportedFormat { name: String, extension: String },
    /// Content could not be decoded into a rectangular table.
    Parse { name: String, message: String },
    /// A resolved column index is past the end of the table.
    InsufficientColumns {
        role: TableRole,
        index: usize,
        column_count: usize,
        required: usize,
    },
    /// Mapping TOML parse or validation error.
    Config(String),
    /// Unexpected failure while joining or serializing.
    Processing(String),
}

impl fmt::Display for ConsolidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { name, extension } => {
                if extension.is_empty() {
                    write!(f, "'{name}': unsupported file format (no extension)")
                } else {
                    write!(f, "'{name}': unsupported file format '.{extension}'")
                }
            }
            Self::Parse { name, message } => write!(f, "'{name}': cannot parse table: {message}"),
            Self::InsufficientColumns { role, index, column_count, required } => {
                if *column_count == 0 {
                    write!(f, "{role} file appears to be empty or invalid (no columns)")
                } else {
                    write!(
                        f,
                        "{role} file doesn't have enough columns: column {} (index {index}) requested, \
                         found {column_count} column(s), needs at least {required}",
                        col_to_letter(*index),
                    )
                }
            }
            Self::Config(msg) => write!(f, "mapping config error: {msg}"),
            Self::Processing(msg) => write!(f, "an error occurred while processing the files: {msg}"),
        }
    }
}

impl std::error::Error for ConsolidateError {}

impl ConsolidateError {
    /// Likely causes to show the operator alongside the error message.
    pub fn checklist(mapping: &MappingConfig) -> Vec<String> {
        let cols = &mapping.user_data;
        vec![
            "both files are valid CSV (or spreadsheet) format".to_string(),
            format!(
                "the bad responses file has the {} in column {}",
                mapping.key.label(),
                col_to_letter(mapping.bad_responses.key),
            ),
            format!(
                "the user data file has the required columns in positions {}, {}, {} and {}",
                col_to_letter(cols.reference),
                col_to_letter(cols.email),
                col_to_letter(cols.lucid_reference),
                col_to_letter(cols.country),
            ),
        ]
    }
}
