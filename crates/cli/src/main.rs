// panelmerge CLI - attach user data to flagged survey responses

mod exit_codes;
mod inspect;
mod mapping;
mod render;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use panelmerge_engine::{ConsolidateError, MappingConfig};

use exit_codes::{consolidate_exit_code, EXIT_SUCCESS, EXIT_USAGE};
use mapping::{DuplicateArg, KeyArg};
use run::RunArgs;

#[derive(Parser)]
#[command(name = "panelmerge")]
#[command(about = "Consolidate bad survey responses with panel user data")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a bad responses file to a user data export and write the result as CSV
    #[command(after_help = "\
Examples:
  panelmerge run bad_emails.csv users.xlsx
  panelmerge run bad_refs.csv users.csv --key reference -o flagged.csv
  panelmerge run bad.csv users.csv --out-dir exports/ --json
  panelmerge run bad.csv users.csv --on-duplicate first-match --fail-on-unmatched")]
    Run(RunArgs),

    /// Show the columns (with letters) and first rows of a file
    #[command(after_help = "\
Examples:
  panelmerge inspect users.xlsx
  panelmerge inspect users.xlsx --sheet Export --rows 3
  panelmerge inspect bad.csv --json")]
    Inspect {
        /// CSV, TSV or spreadsheet file
        file: PathBuf,

        /// Worksheet to read (spreadsheets only; default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Rows to preview
        #[arg(long, default_value_t = 5)]
        rows: usize,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the effective column mapping as TOML (or JSON)
    #[command(after_help = "\
Examples:
  panelmerge mapping > ~/.config/panelmerge/mapping.toml
  panelmerge mapping --config survey42.toml --key reference
  panelmerge mapping --json")]
    Mapping {
        /// Mapping config (TOML)
        #[arg(long, env = "PANELMERGE_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long, value_enum)]
        key: Option<KeyArg>,

        #[arg(long, value_enum)]
        on_duplicate: Option<DuplicateArg>,

        /// Output JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  panelmerge-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  panelmerge-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Inspect { file, sheet, rows, json } => inspect::cmd_inspect(file, sheet, rows, json),
        Commands::Mapping { config, key, on_duplicate, json } => {
            mapping::cmd_mapping(config, key, on_duplicate, json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                for line in hint.lines() {
                    eprintln!("hint:  {}", line);
                }
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    /// One hint per line.
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Consolidation failure, with the checklist of likely causes for the
    /// active mapping as hints.
    pub fn consolidate(err: ConsolidateError, mapping: &MappingConfig) -> Self {
        Self {
            code: consolidate_exit_code(&err),
            message: err.to_string(),
            hint: Some(ConsolidateError::checklist(mapping).join("\n")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exit_codes::{EXIT_INSUFFICIENT_COLUMNS, EXIT_UNSUPPORTED_FORMAT};
    use panelmerge_engine::TableRole;

    #[test]
    fn consolidate_error_carries_checklist() {
        let err = ConsolidateError::InsufficientColumns {
            role: TableRole::UserData,
            index: 7,
            column_count: 5,
            required: 8,
        };
        let cli = CliError::consolidate(err, &MappingConfig::default());
        assert_eq!(cli.code, EXIT_INSUFFICIENT_COLUMNS);
        let hint = cli.hint.unwrap();
        assert_eq!(hint.lines().count(), 3);
        assert!(hint.lines().last().unwrap().contains("B, C, F and H"));
    }

    #[test]
    fn unsupported_format_code() {
        let err = ConsolidateError::UnsupportedFormat { name: "x.pdf".into(), extension: "pdf".into() };
        assert_eq!(CliError::consolidate(err, &MappingConfig::default()).code, EXIT_UNSUPPORTED_FORMAT);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
