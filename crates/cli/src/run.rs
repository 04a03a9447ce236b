//! `panelmerge run`: load both exports, consolidate, write the CSV.
//!
//! Human report goes to stderr, `--json` report to stdout. With `-o -` the
//! consolidated CSV itself goes to stdout.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use panelmerge_engine::model::ConsolidationMeta;
use panelmerge_engine::{
    consolidate, resolve_column, ColumnMappingReport, ConsolidationResult,
    ConsolidationSummary, MappingConfig, Table, TableRole,
};
use panelmerge_io::{encode, export_filename_now, load, ExportOptions, LoadOptions, RawFile, CSV_MIME};

use crate::exit_codes::{EXIT_PROCESSING, EXIT_UNMATCHED, EXIT_USAGE};
use crate::mapping::{self, DuplicateArg, KeyArg};
use crate::render::{render_columns, render_table};
use crate::CliError;

/// How many key values of the bad responses file to echo back.
const KEY_PREVIEW: usize = 5;

#[derive(Args)]
pub struct RunArgs {
    /// Bad responses file (CSV, TSV or spreadsheet); key in column A
    pub bad: PathBuf,

    /// User data export (CSV, TSV or spreadsheet)
    pub users: PathBuf,

    /// Which user data field the bad responses key holds
    #[arg(long, value_enum)]
    pub key: Option<KeyArg>,

    /// Mapping config (TOML). See `panelmerge mapping`
    #[arg(long, env = "PANELMERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Worksheet to read from a spreadsheet bad responses file
    #[arg(long)]
    pub sheet: Option<String>,

    /// Worksheet to read from a spreadsheet user data file
    #[arg(long)]
    pub users_sheet: Option<String>,

    /// Output CSV path ("-" for stdout)
    #[arg(long, short = 'o', conflicts_with = "out_dir")]
    pub output: Option<PathBuf>,

    /// Directory for the timestamped output file (default: current directory)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print a JSON report to stdout
    #[arg(long)]
    pub json: bool,

    /// Consolidated rows to preview
    #[arg(long, default_value_t = 10)]
    pub preview: usize,

    /// Text written for user data columns of unmatched rows (default: empty)
    #[arg(long)]
    pub missing: Option<String>,

    /// What to do when a key occurs on several user data rows
    #[arg(long, value_enum)]
    pub on_duplicate: Option<DuplicateArg>,

    /// Exit 8 when any bad response has no user data match
    #[arg(long)]
    pub fail_on_unmatched: bool,

    /// Only print errors and warnings
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a str,
    rows: usize,
    columns: usize,
}

#[derive(Serialize)]
struct RunReport<'a> {
    bad_responses: FileReport<'a>,
    user_data: FileReport<'a>,
    summary: &'a ConsolidationSummary,
    mapping: &'a ColumnMappingReport,
    meta: &'a ConsolidationMeta,
    output: String,
    mime: &'static str,
}

enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    fn display(&self) -> String {
        match self {
            Destination::Stdout => "-".to_string(),
            Destination::File(p) => p.display().to_string(),
        }
    }
}

fn load_table(path: &Path, sheet: Option<String>, mapping: &MappingConfig) -> Result<(RawFile, Table), CliError> {
    let file = RawFile::read(path).map_err(CliError::usage)?;
    let table = load(&file, &LoadOptions { sheet }).map_err(|e| CliError::consolidate(e, mapping))?;
    Ok((file, table))
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    if args.json && is_stdout(args.output.as_deref()) {
        return Err(CliError::usage("--json and `-o -` both write to stdout; pick one"));
    }

    let (mapping, source) = mapping::resolve(args.config.as_deref(), args.key, args.on_duplicate)?;
    let chatty = !args.quiet;

    let (bad_file, bad) = load_table(&args.bad, args.sheet.clone(), &mapping)?;
    if chatty {
        eprintln!("Bad responses: {} ({} rows)", bad_file.name, bad.row_count());
        if let Ok(col) = resolve_column(&bad, TableRole::BadResponses, mapping.bad_responses.key) {
            let keys: Vec<String> = col.values.iter().take(KEY_PREVIEW).map(|v| v.to_string()).collect();
            eprintln!("  first {} values of '{}': {}", keys.len(), col.label, keys.join(", "));
        }
    }

    let (users_file, users) = load_table(&args.users, args.users_sheet.clone(), &mapping)?;
    if chatty {
        eprintln!(
            "User data: {} ({} rows, {} columns)",
            users_file.name,
            users.row_count(),
            users.column_count()
        );
        eprint!("{}", render_columns(&users));
    }

    let result = consolidate(&bad, &users, &mapping).map_err(|e| CliError::consolidate(e, &mapping))?;

    if chatty {
        eprintln!();
        print_mapping(&result, &mapping, &source.to_string());
        eprintln!();
        print_summary(&result.summary);
    }
    if result.summary.unmatched > 0 {
        eprintln!(
            "warning: {} bad response(s) had no matching user data (match on {})",
            result.summary.unmatched,
            mapping.key.label(),
        );
    }
    if chatty && args.preview > 0 {
        eprintln!();
        eprint!("{}", render_table(&result.table, args.preview));
    }

    let export = ExportOptions { missing_marker: args.missing.clone().unwrap_or_default() };
    let bytes = encode(&result.table, &export).map_err(|e| CliError::consolidate(e, &mapping))?;

    let dest = destination(&args);
    write_output(&dest, &bytes)?;
    log::info!("wrote {} bytes to {}", bytes.len(), dest.display());
    if chatty {
        if let Destination::File(p) = &dest {
            eprintln!();
            eprintln!("wrote {} ({} rows)", p.display(), result.table.row_count());
        }
    }

    if args.json {
        let report = RunReport {
            bad_responses: FileReport { file: &bad_file.name, rows: bad.row_count(), columns: bad.column_count() },
            user_data: FileReport { file: &users_file.name, rows: users.row_count(), columns: users.column_count() },
            summary: &result.summary,
            mapping: &result.mapping,
            meta: &result.meta,
            output: dest.display(),
            mime: CSV_MIME,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError { code: EXIT_PROCESSING, message: format!("JSON serialization error: {e}"), hint: None })?;
        println!("{out}");
    }

    if args.fail_on_unmatched && result.summary.unmatched > 0 {
        return Err(CliError {
            code: EXIT_UNMATCHED,
            message: format!("{} unmatched bad response(s)", result.summary.unmatched),
            hint: None,
        });
    }
    Ok(())
}

fn is_stdout(output: Option<&Path>) -> bool {
    output.is_some_and(|p| p.as_os_str() == "-")
}

fn destination(args: &RunArgs) -> Destination {
    match &args.output {
        Some(p) if p.as_os_str() == "-" => Destination::Stdout,
        Some(p) => Destination::File(p.clone()),
        None => {
            let dir = args.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            Destination::File(dir.join(export_filename_now()))
        }
    }
}

fn write_output(dest: &Destination, bytes: &[u8]) -> Result<(), CliError> {
    let write_err = |target: String, e: std::io::Error| CliError {
        code: EXIT_USAGE,
        message: format!("cannot write {target}: {e}"),
        hint: None,
    };
    match dest {
        Destination::Stdout => {
            let mut out = std::io::stdout().lock();
            out.write_all(bytes)
                .and_then(|_| out.flush())
                .map_err(|e| write_err("stdout".into(), e))
        }
        Destination::File(p) => std::fs::write(p, bytes).map_err(|e| write_err(p.display().to_string(), e)),
    }
}

fn print_mapping(result: &ConsolidationResult, mapping: &MappingConfig, source: &str) {
    let report = &result.mapping;
    eprintln!("Column mapping ({source}, match on {}):", mapping.key.label());
    eprintln!(
        "  bad responses  {:<3} {}",
        report.bad_responses_key.letter, report.bad_responses_key.label
    );
    for (i, (field, col)) in report.user_data.iter().enumerate() {
        let role = if *field == report.join_field {
            "(join)".to_string()
        } else {
            format!("-> {}", mapping.output_name(*field))
        };
        let lead = if i == 0 { "user data" } else { "" };
        eprintln!("  {lead:<13}  {:<3} {:<20} {role}", col.letter, col.label);
    }
}

fn print_summary(s: &ConsolidationSummary) {
    eprintln!(
        "Summary: {} total, {} matched, {} unmatched ({} output rows)",
        s.total, s.matched, s.unmatched, s.output_rows
    );
    if s.duplicate_keys > 0 {
        eprintln!("  {} key(s) occur on more than one user data row", s.duplicate_keys);
    }
}
