//! CLI Exit Code Registry
//!
//! Single source of truth for `panelmerge` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success                                           |
//! | 1    | General error (unspecified)                       |
//! | 2    | Usage error (bad args, unreadable input file)     |
//! | 3    | Unsupported file format                           |
//! | 4    | File could not be parsed into a table             |
//! | 5    | Too few columns for the column mapping            |
//! | 6    | Processing failure (join or CSV write)            |
//! | 7    | Invalid mapping config                            |
//! | 8    | Unmatched rows present (`--fail-on-unmatched`)    |

use panelmerge_engine::ConsolidateError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable input files.
pub const EXIT_USAGE: u8 = 2;

pub const EXIT_UNSUPPORTED_FORMAT: u8 = 3;

pub const EXIT_PARSE: u8 = 4;

pub const EXIT_INSUFFICIENT_COLUMNS: u8 = 5;

pub const EXIT_PROCESSING: u8 = 6;

pub const EXIT_CONFIG: u8 = 7;

/// Consolidation succeeded but some bad responses found no user data row.
/// Only returned with `--fail-on-unmatched`.
pub const EXIT_UNMATCHED: u8 = 8;

/// Map a consolidation error to its exit code.
pub fn consolidate_exit_code(err: &ConsolidateError) -> u8 {
    match err {
        ConsolidateError::UnsupportedFormat { .. } => EXIT_UNSUPPORTED_FORMAT,
        ConsolidateError::Parse { .. } => EXIT_PARSE,
        ConsolidateError::InsufficientColumns { .. } => EXIT_INSUFFICIENT_COLUMNS,
        ConsolidateError::Processing(_) => EXIT_PROCESSING,
        ConsolidateError::Config(_) => EXIT_CONFIG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelmerge_engine::TableRole;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_UNSUPPORTED_FORMAT,
            EXIT_PARSE,
            EXIT_INSUFFICIENT_COLUMNS,
            EXIT_PROCESSING,
            EXIT_CONFIG,
            EXIT_UNMATCHED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn error_kinds_map_to_codes() {
        let err = ConsolidateError::InsufficientColumns {
            role: TableRole::UserData,
            index: 7,
            column_count: 3,
            required: 8,
        };
        assert_eq!(consolidate_exit_code(&err), EXIT_INSUFFICIENT_COLUMNS);
        assert_eq!(consolidate_exit_code(&ConsolidateError::Processing("x".into())), EXIT_PROCESSING);
        assert_eq!(consolidate_exit_code(&ConsolidateError::Config("x".into())), EXIT_CONFIG);
    }
}
