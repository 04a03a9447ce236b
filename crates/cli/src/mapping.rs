//! `panelmerge mapping` and mapping resolution shared by every command.
//!
//! Resolution order: `--config FILE` (or `PANELMERGE_CONFIG`), then
//! `<config_dir>/panelmerge/mapping.toml` when it exists, then built-in
//! defaults. `--key` and `--on-duplicate` are applied last.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use panelmerge_engine::{col_to_letter, DuplicatePolicy, KeyMode, MappingConfig, UserField};

use crate::exit_codes::EXIT_CONFIG;
use crate::CliError;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KeyArg {
    /// Match on the user reference (user data column B by default)
    Reference,
    /// Match on the email address (user data column C by default)
    Email,
}

impl From<KeyArg> for KeyMode {
    fn from(k: KeyArg) -> Self {
        match k {
            KeyArg::Reference => KeyMode::Reference,
            KeyArg::Email => KeyMode::Email,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DuplicateArg {
    /// One output row per matching user data row
    FanOut,
    /// Keep only the first matching user data row
    FirstMatch,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(d: DuplicateArg) -> Self {
        match d {
            DuplicateArg::FanOut => DuplicatePolicy::FanOut,
            DuplicateArg::FirstMatch => DuplicatePolicy::FirstMatch,
        }
    }
}

/// Where the effective mapping came from.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingSource {
    Flag(PathBuf),
    UserConfig(PathBuf),
    Defaults,
}

impl fmt::Display for MappingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(p) | Self::UserConfig(p) => write!(f, "{}", p.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// `<config_dir>/panelmerge/mapping.toml`, e.g. `~/.config/panelmerge/mapping.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("panelmerge").join("mapping.toml"))
}

fn config_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_CONFIG, message: msg.into(), hint: None }
}

fn load_file(path: &Path) -> Result<MappingConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_err(format!("cannot read mapping config {}: {e}", path.display())))?;
    MappingConfig::from_toml(&text).map_err(|e| CliError {
        code: EXIT_CONFIG,
        message: format!("{}: {e}", path.display()),
        hint: Some("run `panelmerge mapping` to print a valid mapping file".to_string()),
    })
}

/// Effective mapping for this invocation.
pub fn resolve(
    config: Option<&Path>,
    key: Option<KeyArg>,
    on_duplicate: Option<DuplicateArg>,
) -> Result<(MappingConfig, MappingSource), CliError> {
    let (mut mapping, source) = match config {
        Some(path) => (load_file(path)?, MappingSource::Flag(path.to_path_buf())),
        None => match user_config_path().filter(|p| p.is_file()) {
            Some(path) => (load_file(&path)?, MappingSource::UserConfig(path)),
            None => (MappingConfig::default(), MappingSource::Defaults),
        },
    };
    log::debug!("mapping loaded from {source}");

    if let Some(k) = key {
        mapping.key = k.into();
    }
    if let Some(d) = on_duplicate {
        mapping.on_duplicate = d.into();
    }
    mapping.validate().map_err(|e| config_err(e.to_string()))?;

    Ok((mapping, source))
}

pub fn cmd_mapping(
    config: Option<PathBuf>,
    key: Option<KeyArg>,
    on_duplicate: Option<DuplicateArg>,
    json: bool,
) -> Result<(), CliError> {
    let (mapping, source) = resolve(config.as_deref(), key, on_duplicate)?;

    if json {
        let out = serde_json::to_string_pretty(&mapping)
            .map_err(|e| config_err(format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        let out = mapping.to_toml().map_err(|e| config_err(e.to_string()))?;
        print!("{out}");
    }

    eprintln!("mapping: {source}");
    eprintln!("  match on {} (bad responses column {})", mapping.key.label(), col_to_letter(mapping.bad_responses.key));
    for field in UserField::ALL {
        let role = if field == mapping.key_field() {
            "join".to_string()
        } else {
            format!("-> {}", mapping.output_name(field))
        };
        eprintln!("  {:<16} column {:<3} {role}", field.to_string(), col_to_letter(mapping.user_column(field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_config_wins_and_overrides_apply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.toml");
        std::fs::write(&path, "key = \"reference\"\n[user_data]\ncountry = 9\n").unwrap();

        let (m, source) = resolve(Some(&path), None, None).unwrap();
        assert_eq!(m.key, KeyMode::Reference);
        assert_eq!(m.user_data.country, 9);
        assert_eq!(source, MappingSource::Flag(path.clone()));

        let (m, _) = resolve(Some(&path), Some(KeyArg::Email), Some(DuplicateArg::FirstMatch)).unwrap();
        assert_eq!(m.key, KeyMode::Email);
        assert_eq!(m.on_duplicate, DuplicatePolicy::FirstMatch);
    }

    #[test]
    fn bad_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.toml");
        std::fs::write(&path, "[user_data]\nemail = 1\n").unwrap();

        let err = resolve(Some(&path), None, None).unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
        assert!(err.message.contains("both point at column index 1"), "{}", err.message);
    }

    #[test]
    fn unreadable_config_is_config_error() {
        let err = resolve(Some(Path::new("/nonexistent/panelmerge.toml")), None, None).unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
        assert!(err.message.starts_with("cannot read mapping config"));
    }
}
